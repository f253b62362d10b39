//! Normalized query parameters

use std::collections::HashMap;

use crate::domain::DomainError;

/// Ordered field -> value mapping; every value is stored lower-cased and trimmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    fields: Vec<(String, String)>,
}

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `field`, replacing any previous value in place
    pub fn with(mut self, field: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl AsRef<str>) {
        let field = field.into();
        let value = value.as_ref().trim().to_lowercase();

        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Value of `field`, or a validation error when it is missing or empty
    pub fn require(&self, field: &str) -> Result<&str, DomainError> {
        match self.get(field) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(DomainError::validation(format!(
                "Missing required query parameter '{}'",
                field
            ))),
        }
    }

    /// Space-joined values in insertion order
    pub fn query_text(&self) -> String {
        self.fields
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Values restricted to `fields`, in parameter order
    pub fn restrict_to(&self, fields: &[&str]) -> Vec<(String, String)> {
        self.fields
            .iter()
            .filter(|(name, _)| fields.contains(&name.as_str()))
            .cloned()
            .collect()
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.fields.iter().cloned().collect()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParameters
where
    K: Into<String>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (field, value) in iter {
            params.set(field, value);
        }
        params
    }
}
