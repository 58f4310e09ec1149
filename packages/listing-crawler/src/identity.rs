//! Listing identity derived from detail URLs.

use url::Url;

use crate::types::ListingId;

/// Path segment that precedes the listing id in detail URLs
/// (`/jobs/view/<id>`).
const VIEW_MARKER: &str = "view";

/// Returns the path segment immediately after the `view` marker, if any.
///
/// Accepts absolute URLs and bare paths. Never fails loudly: anything that
/// does not carry the marker followed by a non-empty segment yields `None`.
pub fn extract_listing_id(detail_url: &str) -> Option<ListingId> {
    let trimmed = detail_url.trim();
    let path = match Url::parse(trimmed) {
        Ok(url) => url.path().to_string(),
        Err(_) => strip_query(trimmed).to_string(),
    };

    let mut segments = path.split('/');
    segments.find(|segment| *segment == VIEW_MARKER)?;
    segments.next().and_then(ListingId::new)
}

fn strip_query(raw: &str) -> &str {
    raw.split(['?', '#']).next().unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_segment_after_view() {
        let id = extract_listing_id("https://www.linkedin.com/jobs/view/3812345678").unwrap();
        assert_eq!(id.as_str(), "3812345678");
    }

    #[test]
    fn test_ignores_query_string_and_trailing_slash() {
        let id = extract_listing_id(
            "https://au.linkedin.com/jobs/view/data-analyst-at-acme-3812345678/?refId=abc&trackingId=x",
        )
        .unwrap();
        assert_eq!(id.as_str(), "data-analyst-at-acme-3812345678");
    }

    #[test]
    fn test_relative_path() {
        let id = extract_listing_id("/jobs/view/77?position=1").unwrap();
        assert_eq!(id.as_str(), "77");
    }

    #[test]
    fn test_missing_marker_is_absent() {
        assert!(extract_listing_id("https://www.linkedin.com/jobs/search/?keywords=chef").is_none());
        assert!(extract_listing_id("https://www.linkedin.com/company/acme").is_none());
    }

    #[test]
    fn test_marker_without_segment_is_absent() {
        assert!(extract_listing_id("https://www.linkedin.com/jobs/view/").is_none());
        assert!(extract_listing_id("https://www.linkedin.com/jobs/view").is_none());
    }

    #[test]
    fn test_malformed_input_is_absent() {
        assert!(extract_listing_id("").is_none());
        assert!(extract_listing_id("http://[::1").is_none());
        assert!(extract_listing_id("not a url at all").is_none());
    }
}
