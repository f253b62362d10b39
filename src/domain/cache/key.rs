//! Cache key generation strategies

use std::collections::BTreeMap;
use std::fmt::Debug;

use sha2::{Digest, Sha256};

/// Trait for generating cache keys from input data
pub trait CacheKeyGenerator: Send + Sync + Debug {
    /// Generates a cache key from the given components
    fn generate(&self, params: &CacheKeyParams) -> String;

    /// Generates a key with a namespace prefix
    fn generate_with_namespace(&self, namespace: &str, params: &CacheKeyParams) -> String {
        format!("{}:{}", namespace, self.generate(params))
    }
}

/// Parameters for cache key generation
#[derive(Debug, Clone, Default)]
pub struct CacheKeyParams {
    /// Primary identifier
    pub primary: String,
    /// Secondary components (sorted for consistency)
    pub components: BTreeMap<String, String>,
}

impl CacheKeyParams {
    /// Creates new cache key parameters with a primary identifier
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            components: BTreeMap::new(),
        }
    }

    /// Adds a component to the key parameters
    pub fn with_component(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.components.insert(key.into(), value.into());
        self
    }
}

/// Default cache key generator
///
/// Hashed keys use SHA-256 so that keys written into a cache snapshot stay
/// valid across processes and toolchain versions.
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyGenerator {
    /// Whether to hash the combined key
    hashed: bool,
}

impl DefaultKeyGenerator {
    /// Creates a new default key generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator that produces hex-encoded SHA-256 keys
    pub fn hashed() -> Self {
        Self { hashed: true }
    }

    fn hash_string(input: &str) -> String {
        hex::encode(Sha256::digest(input.as_bytes()))
    }
}

impl CacheKeyGenerator for DefaultKeyGenerator {
    fn generate(&self, params: &CacheKeyParams) -> String {
        let mut parts = vec![params.primary.clone()];

        for (k, v) in &params.components {
            parts.push(format!("{}={}", k, v));
        }

        let combined = parts.join(":");

        if self.hashed {
            Self::hash_string(&combined)
        } else {
            combined
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_params_with_components() {
        let params = CacheKeyParams::new("fever")
            .with_component("age", "30")
            .with_component("weight", "70");

        assert_eq!(params.primary, "fever");
        assert_eq!(params.components.len(), 2);
        assert_eq!(params.components.get("age"), Some(&"30".to_string()));
    }

    #[test]
    fn test_default_key_generator() {
        let generator = DefaultKeyGenerator::new();
        let params = CacheKeyParams::new("test")
            .with_component("a", "1")
            .with_component("b", "2");

        assert_eq!(generator.generate(&params), "test:a=1:b=2");
    }

    #[test]
    fn test_hashed_key_is_stable_sha256() {
        let generator = DefaultKeyGenerator::hashed();
        let params = CacheKeyParams::new("abc");

        // SHA-256("abc")
        assert_eq!(
            generator.generate(&params),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hashed_key_differs_per_component() {
        let generator = DefaultKeyGenerator::hashed();
        let a = CacheKeyParams::new("fever").with_component("age", "30");
        let b = CacheKeyParams::new("fever").with_component("age", "31");

        assert_ne!(generator.generate(&a), generator.generate(&b));
        assert_eq!(generator.generate(&a), generator.generate(&a.clone()));
    }

    #[test]
    fn test_generate_with_namespace() {
        let generator = DefaultKeyGenerator::new();
        let params = CacheKeyParams::new("aspirin");

        let key = generator.generate_with_namespace("embed", &params);
        assert_eq!(key, "embed:aspirin");
    }

    #[test]
    fn test_components_are_sorted() {
        let generator = DefaultKeyGenerator::new();

        let params = CacheKeyParams::new("test")
            .with_component("zebra", "z")
            .with_component("apple", "a")
            .with_component("mango", "m");

        assert_eq!(generator.generate(&params), "test:apple=a:mango=m:zebra=z");
    }
}
