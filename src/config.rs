use gadgetcache_core::{Error, Result};
use gadgetcache_normalizer::NormalizerConfig;
use gadgetcache_providers::{HttpEmbedder, ProviderConfig};
use gadgetcache_similarity::{Embedder, HashEmbedder, DEFAULT_TEXT_DIM};
use gadgetcache_storage::{RecordStore, DEFAULT_MAP_SIZE_MB};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_MAX_RESULTS: usize = 15;

/// Process-wide settings for a [`CacheCoordinator`](crate::CacheCoordinator)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub data_dir: PathBuf,
    pub embedding_dim: usize,
    pub map_size_mb: usize,
    pub max_results: usize,
    /// Relevance floor for a cache hit; `None` means any result is a hit
    pub min_relevance: Option<f32>,
    pub normalizer: NormalizerConfig,
    /// Remote chat/embedding endpoint; local heuristics only when absent
    pub llm: Option<ProviderConfig>,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./cache_db"),
            embedding_dim: DEFAULT_TEXT_DIM,
            map_size_mb: DEFAULT_MAP_SIZE_MB,
            max_results: DEFAULT_MAX_RESULTS,
            min_relevance: None,
            normalizer: NormalizerConfig::default(),
            llm: None,
        }
    }
}

impl AdvisorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(Error::InvalidConfig("embedding_dim must be positive".to_string()));
        }
        if self.map_size_mb == 0 {
            return Err(Error::InvalidConfig("map_size_mb must be positive".to_string()));
        }
        if let Some(floor) = self.min_relevance {
            if !(0.0..=100.0).contains(&floor) {
                return Err(Error::InvalidConfig(format!(
                    "min_relevance must be within [0, 100], got {}",
                    floor
                )));
            }
        }
        if self.normalizer.min_price > self.normalizer.max_price {
            return Err(Error::InvalidConfig(format!(
                "price bounds are inverted: {} > {}",
                self.normalizer.min_price, self.normalizer.max_price
            )));
        }
        if let Some(llm) = &self.llm {
            if llm.api_base.trim().is_empty() {
                return Err(Error::InvalidConfig("llm.api_base must not be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Remote embedder when `llm.embedding_model` is set, the hash embedder
    /// otherwise
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        let remote = self
            .llm
            .as_ref()
            .and_then(|llm| llm.embedding_model.clone().map(|model| (llm, model)));
        match remote {
            Some((llm, model)) => {
                let embedder = HttpEmbedder::new(llm.clone(), model, self.embedding_dim)
                    .map_err(|e| Error::InvalidConfig(e.to_string()))?;
                Ok(Arc::new(embedder))
            }
            None => Ok(Arc::new(HashEmbedder::new(self.embedding_dim))),
        }
    }

    pub fn open_store(&self) -> Result<RecordStore> {
        self.validate()?;
        RecordStore::open_with_map_size(&self.data_dir, self.embedder()?, self.map_size_mb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AdvisorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_results, 15);
        assert_eq!(config.embedding_dim, 256);
        assert!(config.llm.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = AdvisorConfig {
            embedding_dim: 0,
            ..AdvisorConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = AdvisorConfig {
            min_relevance: Some(120.0),
            ..AdvisorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_open_store_uses_hash_embedder_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AdvisorConfig {
            data_dir: dir.path().to_path_buf(),
            embedding_dim: 32,
            map_size_mb: 16,
            ..AdvisorConfig::default()
        };
        let store = config.open_store().unwrap();
        assert_eq!(store.fingerprint(), "hash-v1:32");
        assert!(store.is_empty());
    }

    #[test]
    fn test_partial_json() {
        let config: AdvisorConfig =
            serde_json::from_str(r#"{"data_dir": "/tmp/phones", "max_results": 5}"#).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/phones"));
        assert_eq!(config.max_results, 5);
        assert_eq!(config.map_size_mb, 1024);
    }
}
