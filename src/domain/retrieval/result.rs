use std::fmt;

use serde::{Deserialize, Serialize};

use super::is_valid_payload;

/// Tier that produced a retrieval result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Store,
    Cache,
    LiveFetch,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Cache => write!(f, "cache"),
            Self::LiveFetch => write!(f, "live_fetch"),
        }
    }
}

/// Whether a value is a derived answer or a "no data" sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Answer,
    NoData,
}

/// Value returned by the retrieval service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub value: String,
    pub tier: Tier,
    pub kind: PayloadKind,
}

impl RetrievalResult {
    pub fn new(value: impl Into<String>, tier: Tier) -> Self {
        let value = value.into();
        let kind = if is_valid_payload(&value) {
            PayloadKind::Answer
        } else {
            PayloadKind::NoData
        };

        Self { value, tier, kind }
    }

    pub fn is_answer(&self) -> bool {
        self.kind == PayloadKind::Answer
    }

    pub fn into_value(self) -> String {
        self.value
    }
}

impl fmt::Display for RetrievalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let answer = RetrievalResult::new("325 mg every 4 hours as needed", Tier::LiveFetch);
        let sentinel = RetrievalResult::new("No dosage information available for x.", Tier::LiveFetch);

        assert!(answer.is_answer());
        assert_eq!(sentinel.kind, PayloadKind::NoData);
    }
}
