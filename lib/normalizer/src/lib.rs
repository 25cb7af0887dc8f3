//! # gadgetcache normalizer
//!
//! Turns raw scraped listings into validated [`Record`](gadgetcache_core::Record)s.
//!
//! Listings are screened by name (accessories and non-phones are dropped),
//! prices and ratings are parsed from free text, and hardware specs come
//! from a pluggable [`SpecExtractor`] with a regex fallback.

pub mod extractor;
pub mod normalizer;
pub mod patterns;

pub use extractor::{RegexExtractor, SpecExtractor};
pub use normalizer::{
    BatchOutcome, Normalizer, NormalizerConfig, Rejection, RejectionTally, MAX_PRICE, MIN_PRICE,
};
pub use patterns::{extract_specs, parse_price, parse_rating};
