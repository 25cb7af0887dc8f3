//! # gadgetcache providers
//!
//! Blocking HTTP clients for OpenAI-compatible endpoints:
//!
//! - [`ChatClient`] - chat completions, used as a [`SpecExtractor`](gadgetcache_normalizer::SpecExtractor)
//!   and a [`QueryRewriter`](gadgetcache_query::QueryRewriter)
//! - [`HttpEmbedder`] - `/embeddings`, used as an [`Embedder`](gadgetcache_similarity::Embedder)

pub mod chat;
pub mod embedding;

pub use chat::ChatClient;
pub use embedding::HttpEmbedder;

use anyhow::Result;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoint settings shared by every provider client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub api_base: String,
    pub api_key: String,
    /// Chat model used for spec extraction and query rewriting
    pub model: String,
    /// Embedding model; the local hash embedder is used when unset
    pub embedding_model: Option<String>,
    pub timeout_ms: u64,
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            embedding_model: None,
            timeout_ms: 20_000,
            temperature: 0.0,
        }
    }
}

pub(crate) fn auth_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    if !api_key.is_empty() {
        headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
    }
    Ok(headers)
}

pub(crate) fn http_client(cfg: &ProviderConfig) -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_millis(cfg.timeout_ms))
        .build()?)
}

pub(crate) fn endpoint(cfg: &ProviderConfig, path: &str) -> String {
    format!("{}/{}", cfg.api_base.trim_end_matches('/'), path)
}
