//! # gadgetcache
//!
//! A semantic cache in front of a phone-listing scraper.
//!
//! Queries are rewritten into short intent phrases, looked up by embedding
//! similarity in a persistent store, and only on a miss sent to the
//! scraper. Scraped listings are normalized into typed records, stored, and
//! returned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gadgetcache::prelude::*;
//! use std::sync::Arc;
//!
//! let config = AdvisorConfig::default();
//! let scraper = Arc::new(ReplayScraper::from_file("listings.json").unwrap());
//! let coordinator = CacheCoordinator::from_config(&config, scraper).unwrap();
//!
//! let resolution = coordinator.resolve("best phone for pubg", 10, Some(30_000));
//! for hit in &resolution.records {
//!     println!("{} ({:?})", hit.record.full_name, hit.score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - [`gadgetcache-core`](gadgetcache_core) - records, vectors, in-memory collection, filters
//! - [`gadgetcache-similarity`](gadgetcache_similarity) - embedders and relevance scoring
//! - [`gadgetcache-storage`](gadgetcache_storage) - LMDB-backed record store, JSON import/export
//! - [`gadgetcache-normalizer`](gadgetcache_normalizer) - raw listing validation and parsing
//! - [`gadgetcache-query`](gadgetcache_query) - query rewriting
//! - [`gadgetcache-providers`](gadgetcache_providers) - HTTP chat and embedding clients

pub mod config;
pub mod coordinator;
pub mod scraper;
pub mod working_set;

pub use config::{AdvisorConfig, DEFAULT_MAX_RESULTS};
pub use coordinator::{CacheCoordinator, Resolution, ResolutionSource};
pub use scraper::{ReplayScraper, Scraper};
pub use working_set::WorkingSet;

// Re-export component types
pub use gadgetcache_core::{
    Category, Error, Filter, RawListing, Record, Result, ScoredRecord, SpecFilter, SpecSheet,
};
pub use gadgetcache_normalizer::{Normalizer, NormalizerConfig, Rejection, RejectionTally, SpecExtractor};
pub use gadgetcache_query::{HeuristicRewriter, QueryEnhancer, QueryRewriter};
pub use gadgetcache_similarity::{Embedder, HashEmbedder};
pub use gadgetcache_storage::{CacheStats, RecordStore};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AdvisorConfig, CacheCoordinator, Resolution, ResolutionSource,
        ReplayScraper, Scraper, WorkingSet,
        RawListing, Record, ScoredRecord, SpecFilter,
        Normalizer, QueryEnhancer, RecordStore, HashEmbedder,
        Error, Result,
    };
}
