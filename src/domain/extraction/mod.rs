//! Extraction domain - Turns fetched drug reference pages into answer strings
//!
//! Extractors are pure functions over the fetched HTML. Absent content is a
//! valid negative signal and always yields a deterministic "no information"
//! string, never an error.

mod dosage;
mod interactions;

pub use dosage::extract_dosage_info;
pub use interactions::extract_food_interaction_info;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static MAIN_CONTENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#content.ddc-main-content").unwrap());

/// The page's main content block, or the whole document
fn main_content(document: &Html) -> ElementRef<'_> {
    document
        .select(&MAIN_CONTENT)
        .next()
        .unwrap_or_else(|| document.root_element())
}

/// Concatenated text of an element with each text node trimmed
fn stripped_text(element: &ElementRef<'_>, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}
