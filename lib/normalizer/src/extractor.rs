use gadgetcache_core::SpecSheet;

use crate::patterns;

/// Turns a listing's name and feature strings into a [`SpecSheet`].
///
/// Implementations backed by a remote service should return `Err` on any
/// malformed answer; the normalizer then falls back to [`RegexExtractor`].
pub trait SpecExtractor: Send + Sync {
    fn extract_specs(&self, name: &str, features: &[String]) -> anyhow::Result<SpecSheet>;
}

/// Fixed-pattern extractor. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;

impl SpecExtractor for RegexExtractor {
    fn extract_specs(&self, _name: &str, features: &[String]) -> anyhow::Result<SpecSheet> {
        Ok(patterns::extract_specs(features))
    }
}
