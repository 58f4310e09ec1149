//! Search-results and detail page markup for the guest job-search pages.

use scraper::{ElementRef, Html, Selector};

use crate::traits::MarkupExtractor;
use crate::types::ListingStub;

/// Selector set for the public (logged-out) job search pages.
#[derive(Debug, Clone)]
pub struct SearchResultsMarkup {
    results_list: Selector,
    card: Selector,
    title: Selector,
    employer: Selector,
    location: Selector,
    link: Selector,
    description: Selector,
}

impl SearchResultsMarkup {
    pub fn new() -> Self {
        Self {
            results_list: selector(".jobs-search__results-list"),
            card: selector(".jobs-search__results-list li"),
            title: selector(".base-search-card__title"),
            employer: selector(".base-search-card__subtitle"),
            location: selector(".job-search-card__location"),
            link: selector("a.base-card__full-link[href]"),
            description: selector(".description__text"),
        }
    }

    fn parse_card(&self, card: ElementRef<'_>) -> Option<ListingStub> {
        let title = first_text(card, &self.title)?;
        let employer = first_text(card, &self.employer)?;
        let location_display = first_text(card, &self.location).unwrap_or_default();
        let detail_url = card
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| href.trim().to_string())
            .filter(|href| !href.is_empty())?;

        Some(ListingStub {
            title,
            employer,
            location_display,
            detail_url,
        })
    }
}

impl Default for SearchResultsMarkup {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupExtractor for SearchResultsMarkup {
    fn search_results(&self, html: &str) -> Option<Vec<ListingStub>> {
        let document = Html::parse_document(html);
        document.select(&self.results_list).next()?;

        Some(
            document
                .select(&self.card)
                .filter_map(|card| self.parse_card(card))
                .collect(),
        )
    }

    fn description(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let block = document.select(&self.description).next()?;
        let text = block.text().collect::<Vec<_>>().join("\n");
        let text = text.trim();
        if text.is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

/// Selectors are compile-time constants; a parse failure is a typo.
fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}
