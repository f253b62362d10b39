//! Format contract for generated plans

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const GREETING: &str = "Hello!";
pub const DOSAGE_CLOSING: &str = "Follow doctor’s advice!";
pub const CAUTION: &str = "Caution! ";
pub const INTERACTION_CLOSING: &str = "Consult a doctor!";
pub const MAX_SECTION_CHARS: usize = 400;

const ELLIPSIS: &str = "...";

static ROLE_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^(?:assistant|user|system|<\|[^>]*\|>)+[\s\n]*").unwrap());

/// Why a generated plan was rejected
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlanValidationError {
    #[error("expected 2 paragraphs, found {0}")]
    ParagraphCount(usize),

    #[error("dosage paragraph must start with \"Hello!\" and end with \"Follow doctor’s advice!\"")]
    DosageFraming,

    #[error("interaction paragraph must start with \"Caution! \" and end with \"Consult a doctor!\"")]
    InteractionFraming,

    #[error("{section} paragraph has {length} characters, limit is 400")]
    TooLong { section: &'static str, length: usize },
}

/// The two sections of a mitigation plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSections {
    pub dosage: String,
    pub interactions: String,
}

impl PlanSections {
    /// Labeled two-section rendering stored in the plan cache
    pub fn render(&self) -> String {
        format!(
            "Dosage Plan:\n{}\n\nInteraction Plan:\n{}",
            self.dosage, self.interactions
        )
    }
}

/// Removes leading chat role tokens from every line
pub fn strip_role_markers(raw: &str) -> String {
    ROLE_MARKERS.replace_all(raw, "").into_owned()
}

/// Parses raw generated text against the two-paragraph contract
pub fn parse_plan(raw: &str) -> Result<PlanSections, PlanValidationError> {
    let cleaned = strip_role_markers(raw);
    let paragraphs: Vec<&str> = cleaned
        .lines()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let [dosage, interactions] = paragraphs.as_slice() else {
        return Err(PlanValidationError::ParagraphCount(paragraphs.len()));
    };

    if !dosage.starts_with(GREETING) || !dosage.ends_with(DOSAGE_CLOSING) {
        return Err(PlanValidationError::DosageFraming);
    }
    if !interactions.starts_with(CAUTION) || !interactions.ends_with(INTERACTION_CLOSING) {
        return Err(PlanValidationError::InteractionFraming);
    }

    for (section, text) in [("dosage", dosage), ("interaction", interactions)] {
        let length = text.chars().count();
        if length > MAX_SECTION_CHARS {
            return Err(PlanValidationError::TooLong { section, length });
        }
    }

    Ok(PlanSections {
        dosage: dosage.to_string(),
        interactions: interactions.to_string(),
    })
}

/// Cuts a section longer than the limit to `limit - 3` characters plus "..."
pub fn truncate_section(text: &str) -> String {
    if text.chars().count() <= MAX_SECTION_CHARS {
        return text.to_string();
    }

    let kept: String = text
        .chars()
        .take(MAX_SECTION_CHARS - ELLIPSIS.len())
        .collect();
    format!("{}{}", kept, ELLIPSIS)
}
