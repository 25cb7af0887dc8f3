use std::sync::Arc;
use tracing::{debug, warn};

use crate::rewriter::{HeuristicRewriter, QueryRewriter, MAX_QUERY_WORDS};

/// Rewrites longer than this are discarded
pub const MAX_ENHANCED_LEN: usize = 50;

/// Best-effort query rewriting. Empty, overlong, wordy or failed rewrites
/// fall back to the raw query.
#[derive(Clone)]
pub struct QueryEnhancer {
    rewriter: Arc<dyn QueryRewriter>,
}

impl QueryEnhancer {
    pub fn new(rewriter: Arc<dyn QueryRewriter>) -> Self {
        Self { rewriter }
    }

    pub fn heuristic() -> Self {
        Self::new(Arc::new(HeuristicRewriter))
    }

    pub fn enhance(&self, raw_query: &str, budget: Option<u32>) -> String {
        let rewritten = match self.rewriter.rewrite(raw_query, budget) {
            Ok(rewritten) => rewritten,
            Err(e) => {
                warn!("Query rewrite failed, using raw query: {}", e);
                return raw_query.to_string();
            }
        };

        let words: Vec<&str> = rewritten.split_whitespace().collect();
        let word_count = words.len();
        let rewritten = words.join(" ");
        if rewritten.is_empty()
            || word_count > MAX_QUERY_WORDS
            || rewritten.chars().count() > MAX_ENHANCED_LEN
        {
            debug!("Discarding rewrite '{}' for '{}'", rewritten, raw_query);
            return raw_query.to_string();
        }
        debug!("Enhanced '{}' -> '{}'", raw_query, rewritten);
        rewritten
    }
}

impl Default for QueryEnhancer {
    fn default() -> Self {
        Self::heuristic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl QueryRewriter for Fixed {
        fn rewrite(&self, _query: &str, _budget: Option<u32>) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Unavailable;

    impl QueryRewriter for Unavailable {
        fn rewrite(&self, _query: &str, _budget: Option<u32>) -> anyhow::Result<String> {
            anyhow::bail!("connection refused")
        }
    }

    #[test]
    fn test_heuristic_enhancement() {
        let enhancer = QueryEnhancer::default();
        assert_eq!(enhancer.enhance("best phone for pubg", None), "gaming phone");
    }

    #[test]
    fn test_invalid_rewrites_fall_back_to_raw() {
        let raw = "phone with good battery";
        assert_eq!(QueryEnhancer::new(Arc::new(Fixed("   "))).enhance(raw, None), raw);

        let long = "a really long rewrite that goes on and on past the fifty character bound";
        assert_eq!(QueryEnhancer::new(Arc::new(Fixed(long))).enhance(raw, None), raw);

        let wordy = "big new fast 5g gaming phone";
        assert!(wordy.chars().count() <= MAX_ENHANCED_LEN);
        assert_eq!(QueryEnhancer::new(Arc::new(Fixed(wordy))).enhance(raw, None), raw);

        let five = "new fast 5g gaming phone";
        assert_eq!(QueryEnhancer::new(Arc::new(Fixed(five))).enhance(raw, None), five);
    }

    #[test]
    fn test_unavailable_rewriter_is_a_no_op() {
        let enhancer = QueryEnhancer::new(Arc::new(Unavailable));
        assert_eq!(enhancer.enhance("Pixel 8a", Some(50_000)), "Pixel 8a");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let enhancer = QueryEnhancer::new(Arc::new(Fixed("  budget   camera phone ")));
        assert_eq!(enhancer.enhance("x", None), "budget camera phone");
    }
}
