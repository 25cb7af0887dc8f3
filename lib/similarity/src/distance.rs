//! Text hashing and distance-to-relevance conversion
//!
//! Token positions come from SHA-256 rather than `std` hashers so that the
//! same text maps to the same vector on every run and toolchain.

use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Stable 64-bit hash of a token
fn stable_hash(token: &str) -> u64 {
    let digest = Sha256::digest(token.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Generate character trigrams from a string
fn generate_trigrams(s: &str) -> HashSet<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();

    if chars.len() < 3 {
        return HashSet::new();
    }

    chars.windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Split on anything that is not alphanumeric
fn words(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Hash a string to a fixed-size unit vector.
///
/// Character trigrams give fuzzy overlap ("pubg" vs "pubg mobile"), whole
/// words weigh double. Blank text yields the zero vector.
pub fn hash_text_to_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dim];
    if dim == 0 {
        return vector;
    }
    let normalized = text.to_lowercase();

    for word in words(&normalized) {
        for trigram in generate_trigrams(word) {
            let pos = (stable_hash(&trigram) % dim as u64) as usize;
            vector[pos] += 1.0;
        }

        let pos = (stable_hash(word) % dim as u64) as usize;
        vector[pos] += 2.0;
    }

    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for v in &mut vector {
            *v /= magnitude;
        }
    }

    vector
}

/// Convert a cosine distance into a 0-100 relevance score.
///
/// `max(0, 1 - distance) * 100`, clamped and rounded to two decimals.
pub fn relevance_score(distance: f32) -> f32 {
    let score = (1.0 - distance).max(0.0) * 100.0;
    (score.clamp(0.0, 100.0) * 100.0).round() / 100.0
}
