//! # gadgetcache query
//!
//! Rewrites free-text shopping queries into short phrases so that
//! near-duplicate intents ("best phone for pubg", "gaming phone") embed
//! close to each other.

pub mod enhancer;
pub mod rewriter;

pub use enhancer::{QueryEnhancer, MAX_ENHANCED_LEN};
pub use rewriter::{HeuristicRewriter, QueryRewriter, MAX_QUERY_WORDS};
