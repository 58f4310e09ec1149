use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

// ============================================================================
// IDENTITY
// ============================================================================

/// Stable identity of a listing, derived from its detail URL.
///
/// Never empty. Build one through [`crate::identity::extract_listing_id`]
/// or [`ListingId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(String);

impl ListingId {
    /// Returns `None` for empty (or all-whitespace) input.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// ENUMS (type-safe states)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    InProgress,
    Completed,
    Error,
}

impl CheckpointStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointStatus::InProgress => "in_progress",
            CheckpointStatus::Completed => "completed",
            CheckpointStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(CheckpointStatus::InProgress),
            "completed" => Some(CheckpointStatus::Completed),
            "error" => Some(CheckpointStatus::Error),
            _ => None,
        }
    }

    /// Completed and error rows both mean the query has settled.
    pub fn is_settled(&self) -> bool {
        !matches!(self, CheckpointStatus::InProgress)
    }
}

impl fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Refreshed,
}

// ============================================================================
// QUERY SPACE
// ============================================================================

/// A place the search site is queried for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Short name stored on every listing (e.g. "Sydney")
    pub city: String,
    /// Location string sent to the site (e.g. "Sydney, New South Wales, Australia")
    pub search_term: String,
    pub country: String,
}

impl Location {
    pub fn new(
        city: impl Into<String>,
        search_term: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            search_term: search_term.into(),
            country: country.into(),
        }
    }
}

/// A role title and its relative share of the crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub title: String,
    pub weight: f64,
}

impl Role {
    pub fn new(title: impl Into<String>, weight: f64) -> Self {
        Self {
            title: title.into(),
            weight,
        }
    }
}

/// One (role, location) unit of crawl work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub role: String,
    pub location: Location,
    pub target_count: usize,
}

impl Query {
    pub fn new(role: impl Into<String>, location: Location, target_count: usize) -> Self {
        Self {
            role: role.into(),
            location,
            target_count,
        }
    }

    pub fn country(&self) -> &str {
        &self.location.country
    }

    /// Search URL for this query without a page offset. Stored on every
    /// listing as its source query.
    pub fn search_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.query_pairs_mut()
            .append_pair("keywords", &self.role)
            .append_pair("location", &self.location.search_term);
        url
    }

    /// Search URL for the page starting at `offset`.
    pub fn page_url(&self, base: &Url, offset: usize) -> Url {
        let mut url = self.search_url(base);
        url.query_pairs_mut()
            .append_pair("start", &offset.to_string());
        url
    }
}

// ============================================================================
// LISTINGS
// ============================================================================

/// Lightweight listing summary parsed from a search-results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingStub {
    pub title: String,
    pub employer: String,
    pub location_display: String,
    pub detail_url: String,
}

/// A fully fetched listing, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub listing_id: ListingId,
    pub title: String,
    pub employer: String,
    pub city: String,
    pub country: String,
    pub description: String,
    pub detail_url: String,
    pub source_query_url: String,
    pub source_site: String,
}

impl ListingRecord {
    /// Combine a stub with its description. City and country come from the
    /// query rather than the stub's free-form location text.
    pub fn from_stub(
        stub: ListingStub,
        listing_id: ListingId,
        description: String,
        query: &Query,
        source_query_url: &str,
        source_site: &str,
    ) -> Self {
        Self {
            listing_id,
            title: stub.title,
            employer: stub.employer,
            city: query.location.city.clone(),
            country: query.location.country.clone(),
            description,
            detail_url: stub.detail_url,
            source_query_url: source_query_url.to_string(),
            source_site: source_site.to_string(),
        }
    }
}

/// A listing as persisted, with its observation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredListing {
    #[serde(flatten)]
    pub record: ListingRecord,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

// ============================================================================
// PROGRESS
// ============================================================================

/// A checkpoint row waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub location: String,
    pub role: String,
    pub collected_count: usize,
    pub status: CheckpointStatus,
}

impl Checkpoint {
    pub fn new(
        location: impl Into<String>,
        role: impl Into<String>,
        collected_count: usize,
        status: CheckpointStatus,
    ) -> Self {
        Self {
            location: location.into(),
            role: role.into(),
            collected_count,
            status,
        }
    }
}

/// A checkpoint row as appended to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCheckpoint {
    /// Store-assigned, strictly increasing
    pub seq: i64,
    pub location: String,
    pub role: String,
    pub collected_count: usize,
    pub observed_at: DateTime<Utc>,
    pub status: CheckpointStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sydney() -> Location {
        Location::new("Sydney", "Sydney, New South Wales, Australia", "Australia")
    }

    #[test]
    fn test_listing_id_rejects_empty() {
        assert!(ListingId::new("").is_none());
        assert!(ListingId::new("   ").is_none());
        assert_eq!(ListingId::new("123").unwrap().as_str(), "123");
    }

    #[test]
    fn test_page_url_encodes_role_and_location() {
        let base = Url::parse("https://www.linkedin.com/jobs/search/").unwrap();
        let query = Query::new("Data Analyst", sydney(), 5);

        let url = query.page_url(&base, 25);
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("keywords".to_string(), "Data Analyst".to_string()),
                (
                    "location".to_string(),
                    "Sydney, New South Wales, Australia".to_string()
                ),
                ("start".to_string(), "25".to_string()),
            ]
        );
        assert!(query.search_url(&base).query().unwrap().find("start").is_none());
    }

    #[test]
    fn test_checkpoint_status_round_trip() {
        for status in [
            CheckpointStatus::InProgress,
            CheckpointStatus::Completed,
            CheckpointStatus::Error,
        ] {
            assert_eq!(CheckpointStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(CheckpointStatus::parse("done"), None);
        assert!(!CheckpointStatus::InProgress.is_settled());
        assert!(CheckpointStatus::Error.is_settled());
    }

    #[test]
    fn test_record_takes_city_from_query() {
        let query = Query::new("Chef", sydney(), 5);
        let stub = ListingStub {
            title: "Head Chef".to_string(),
            employer: "Harbour Kitchen".to_string(),
            location_display: "Surry Hills, NSW".to_string(),
            detail_url: "https://www.linkedin.com/jobs/view/42".to_string(),
        };

        let record = ListingRecord::from_stub(
            stub,
            ListingId::new("42").unwrap(),
            String::new(),
            &query,
            "https://www.linkedin.com/jobs/search/?keywords=Chef",
            "LinkedIn",
        );

        assert_eq!(record.city, "Sydney");
        assert_eq!(record.country, "Australia");
        assert_eq!(record.source_site, "LinkedIn");
    }
}
