//! Text embedders
//!
//! The store never embeds directly; it goes through [`Embedder`] so that a
//! remote model can stand in for the local hash embedder.

use crate::distance::hash_text_to_vector;

/// Default embedding dimension
pub const DEFAULT_TEXT_DIM: usize = 256;

/// Embedding collaborator. Must be deterministic for identical input.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    /// Length of every vector this embedder produces
    fn dim(&self) -> usize;

    /// Identifies the embedding function. Vectors produced under a different
    /// fingerprint are not comparable.
    fn fingerprint(&self) -> String;

    /// Embed a single text
    fn embed_one(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Local embedder hashing words and character trigrams into a fixed number
/// of buckets
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::ensure!(self.dim > 0, "embedding dimension must be positive");
        Ok(texts
            .iter()
            .map(|text| hash_text_to_vector(text, self.dim))
            .collect())
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn fingerprint(&self) -> String {
        format!("hash-v1:{}", self.dim)
    }
}
