use anyhow::{anyhow, ensure, Result};
use gadgetcache_similarity::Embedder;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::{auth_headers, endpoint, http_client, ProviderConfig};

/// Embeddings from an OpenAI-compatible `/embeddings` endpoint
pub struct HttpEmbedder {
    cfg: ProviderConfig,
    model: String,
    dim: usize,
    client: Client,
}

impl HttpEmbedder {
    pub fn new(cfg: ProviderConfig, model: impl Into<String>, dim: usize) -> Result<Self> {
        ensure!(dim > 0, "embedding dimension must be positive");
        let client = http_client(&cfg)?;
        Ok(Self {
            cfg,
            model: model.into(),
            dim,
            client,
        })
    }
}

impl Embedder for HttpEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "dimensions": self.dim,
        });
        let json: Value = self
            .client
            .post(endpoint(&self.cfg, "embeddings"))
            .headers(auth_headers(&self.cfg.api_key)?)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        let vectors = parse_embedding_response(&json)?;
        ensure!(
            vectors.len() == texts.len(),
            "expected {} embeddings, got {}",
            texts.len(),
            vectors.len()
        );
        for vector in &vectors {
            ensure!(
                vector.len() == self.dim,
                "expected {}-dimensional embedding, got {}",
                self.dim,
                vector.len()
            );
        }
        Ok(vectors)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn fingerprint(&self) -> String {
        format!("{}:{}", self.model, self.dim)
    }
}

/// Vectors from a `data` array, ordered by each item's `index`
fn parse_embedding_response(json: &Value) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow!("embedding response is missing data array"))?;

    let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
    for (fallback_index, item) in data.iter().enumerate() {
        let index = item
            .get("index")
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
            .unwrap_or(fallback_index);
        let embedding = item
            .get("embedding")
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow!("embedding item missing embedding array"))?;
        let vector = embedding
            .iter()
            .map(|value| {
                value
                    .as_f64()
                    .map(|n| n as f32)
                    .ok_or_else(|| anyhow!("embedding value must be numeric"))
            })
            .collect::<Result<Vec<f32>>>()?;
        indexed.push((index, vector));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, vector)| vector).collect())
}
