//! # gadgetcache core
//!
//! Core data structures for the gadgetcache semantic scrape cache.
//!
//! - [`Record`] - a normalized product listing with a stable identity key
//! - [`RawListing`] - scraper output before normalization
//! - [`Vector`] - dense embedding with cosine operations
//! - [`Collection`] - in-memory records + embeddings with exact nearest neighbor search
//! - [`SpecFilter`] - hardware/price constraints over records
//!
//! ## Example
//!
//! ```rust
//! use gadgetcache_core::{Collection, CollectionConfig, Record, Vector};
//!
//! let collection = Collection::new(CollectionConfig {
//!     name: "phones".to_string(),
//!     vector_dim: 3,
//! });
//!
//! let record = Record {
//!     identity_key: "p1".to_string(),
//!     price: 19_999,
//!     ..Record::default()
//! };
//! collection.upsert(record, Vector::new(vec![1.0, 0.0, 0.0])).unwrap();
//!
//! let hits = collection.search(&Vector::new(vec![1.0, 0.0, 0.0]), 10, None);
//! assert_eq!(hits.len(), 1);
//! ```

pub mod collection;
pub mod vector;
pub mod error;
pub mod record;
pub mod filter;

pub use collection::{Collection, CollectionConfig, Entry, Neighbor};
pub use vector::Vector;
pub use error::{Error, Result};
pub use record::{identity_key, Category, RawListing, Record, ScoredRecord, SpecSheet};
pub use filter::{Filter, SpecFilter};
