//! # gadgetcache similarity
//!
//! Embedding side of the cache: the [`Embedder`] collaborator trait, a
//! deterministic local [`HashEmbedder`], and the conversion from cosine
//! distance to the 0-100 relevance score attached to search hits.
//!
//! ```rust
//! use gadgetcache_similarity::{Embedder, HashEmbedder, relevance_score};
//!
//! let embedder = HashEmbedder::new(64);
//! let v = embedder.embed_one("samsung galaxy s24").unwrap();
//! assert_eq!(v.len(), 64);
//! assert_eq!(relevance_score(0.1), 90.0);
//! ```

pub mod distance;
pub mod embedder;

pub use distance::{hash_text_to_vector, relevance_score};
pub use embedder::{Embedder, HashEmbedder, DEFAULT_TEXT_DIM};
