use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::domain::DomainError;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s.,-]").unwrap());

/// Lower-cases free-text input and strips anything outside letters, digits,
/// whitespace and `.,-`
pub fn sanitize_input(text: &str) -> String {
    UNSAFE_CHARS
        .replace_all(text.trim(), "")
        .trim()
        .to_lowercase()
}

/// Known symptoms, the two drugs suggested for each, and input aliases
#[derive(Debug, Clone)]
pub struct SymptomCatalog {
    drugs: BTreeMap<String, [String; 2]>,
    aliases: Vec<(Regex, String)>,
}

impl SymptomCatalog {
    /// `aliases` pairs a pattern matched at the start of the input with the
    /// canonical symptom it stands for
    pub fn new<I, A>(drugs: I, aliases: A) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
        A: IntoIterator<Item = (String, String)>,
    {
        let mut table = BTreeMap::new();

        for (symptom, names) in drugs {
            let pair: [String; 2] = names.try_into().map_err(|names: Vec<String>| {
                DomainError::configuration(format!(
                    "Symptom '{}' must list exactly two drugs, found {}",
                    symptom,
                    names.len()
                ))
            })?;
            table.insert(
                symptom.to_lowercase(),
                pair.map(|drug| drug.to_lowercase()),
            );
        }

        let mut compiled = Vec::new();

        for (pattern, symptom) in aliases {
            let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
                DomainError::configuration(format!("Invalid symptom alias '{}': {}", pattern, e))
            })?;
            let symptom = symptom.to_lowercase();

            if !table.contains_key(&symptom) {
                return Err(DomainError::configuration(format!(
                    "Alias '{}' points to unknown symptom '{}'",
                    pattern, symptom
                )));
            }

            compiled.push((regex, symptom));
        }

        Ok(Self {
            drugs: table,
            aliases: compiled,
        })
    }

    /// Canonical symptom for raw user input
    pub fn normalize(&self, input: &str) -> Result<String, DomainError> {
        let mut symptom = sanitize_input(input);

        for (pattern, replacement) in &self.aliases {
            if pattern.is_match(&symptom) {
                debug!(input = %symptom, symptom = %replacement, "Applied symptom alias");
                symptom = replacement.clone();
            }
        }

        if self.drugs.contains_key(&symptom) {
            Ok(symptom)
        } else {
            Err(DomainError::validation(format!(
                "Unknown symptom '{}'. Expected one of: {}",
                symptom,
                self.symptoms().collect::<Vec<_>>().join(", ")
            )))
        }
    }

    pub fn drugs_for(&self, symptom: &str) -> Option<&[String; 2]> {
        self.drugs.get(symptom)
    }

    pub fn symptoms(&self) -> impl Iterator<Item = &str> {
        self.drugs.keys().map(|s| s.as_str())
    }
}
