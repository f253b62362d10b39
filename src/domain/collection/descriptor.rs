//! Static per-collection metadata

use std::fmt;

/// Turns fetched content into an answer string.
///
/// `args` holds the values of [`FetchSpec::extract_params`], in that order.
pub type ExtractFn = fn(content: Option<&str>, args: &[&str]) -> String;

/// How to fetch and extract a value for a collection
#[derive(Clone, Copy)]
pub struct FetchSpec {
    /// URL template; `${var:drug}` is the primary filter value, slugified
    pub url_template: &'static str,
    /// Query fields passed to `extract`, in order
    pub extract_params: &'static [&'static str],
    pub extract: ExtractFn,
}

impl fmt::Debug for FetchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchSpec")
            .field("url_template", &self.url_template)
            .field("extract_params", &self.extract_params)
            .finish_non_exhaustive()
    }
}

/// Immutable description of one entity collection
#[derive(Debug, Clone, Copy)]
pub struct CollectionDescriptor {
    pub name: &'static str,
    /// Fields used for equality filtering; the first one is the primary field
    pub filter_fields: &'static [&'static str],
    /// Fields returned by store queries
    pub query_fields: &'static [&'static str],
    /// Field holding the derived answer
    pub result_field: &'static str,
    pub cache_key_template: &'static str,
    pub fetch: FetchSpec,
}

impl CollectionDescriptor {
    pub fn primary_field(&self) -> &'static str {
        self.filter_fields.first().copied().unwrap_or_default()
    }

    /// Every property stored for this collection
    pub fn property_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.filter_fields.to_vec();
        for field in self.query_fields.iter().chain([&self.result_field]) {
            if !names.contains(field) {
                names.push(*field);
            }
        }
        names
    }
}

/// URL path segment for a subject name
pub fn slugify(value: &str) -> String {
    value.trim().to_lowercase().replace(' ', "-")
}
