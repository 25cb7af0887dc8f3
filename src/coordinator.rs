use gadgetcache_core::{Error, Record, Result, ScoredRecord};
use gadgetcache_normalizer::{Normalizer, RejectionTally};
use gadgetcache_providers::ChatClient;
use gadgetcache_query::QueryEnhancer;
use gadgetcache_storage::RecordStore;
use parking_lot::{RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

use crate::config::AdvisorConfig;
use crate::scraper::Scraper;
use crate::working_set::WorkingSet;

/// Where a resolution's records came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    Cache,
    Fresh,
    Empty,
}

/// Answer to one `resolve` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    /// The query actually used for lookup and scraping
    pub query: String,
    pub source: ResolutionSource,
    pub records: Vec<ScoredRecord>,
    /// Listings dropped by the normalizer on a miss
    pub rejected: RejectionTally,
}

impl Resolution {
    fn empty(query: String) -> Self {
        Self {
            query,
            source: ResolutionSource::Empty,
            records: Vec::new(),
            rejected: RejectionTally::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveState {
    Enhancing,
    CacheLookup,
    Fetching,
    Normalizing,
    Storing,
    Done,
}

impl fmt::Display for ResolveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolveState::Enhancing => "enhancing",
            ResolveState::CacheLookup => "cache_lookup",
            ResolveState::Fetching => "fetching",
            ResolveState::Normalizing => "normalizing",
            ResolveState::Storing => "storing",
            ResolveState::Done => "done",
        };
        f.write_str(name)
    }
}

fn enter(state: ResolveState) {
    debug!(%state, "resolve state");
}

/// Cache-or-fetch service.
///
/// Answers from the store when it has anything near the query, otherwise
/// scrapes once, normalizes, stores and returns the fresh records.
pub struct CacheCoordinator {
    store: RecordStore,
    enhancer: QueryEnhancer,
    normalizer: Normalizer,
    scraper: Arc<dyn Scraper>,
    working_set: RwLock<WorkingSet>,
    min_relevance: Option<f32>,
}

impl CacheCoordinator {
    /// The working set starts with every record already in `store`
    pub fn new(
        store: RecordStore,
        enhancer: QueryEnhancer,
        normalizer: Normalizer,
        scraper: Arc<dyn Scraper>,
    ) -> Self {
        let working_set = WorkingSet::from_records(store.get_all());
        Self {
            store,
            enhancer,
            normalizer,
            scraper,
            working_set: RwLock::new(working_set),
            min_relevance: None,
        }
    }

    #[must_use]
    pub fn with_min_relevance(mut self, min_relevance: Option<f32>) -> Self {
        self.min_relevance = min_relevance;
        self
    }

    /// Wire up the store and collaborators described by `config`
    pub fn from_config(config: &AdvisorConfig, scraper: Arc<dyn Scraper>) -> Result<Self> {
        let store = config.open_store()?;

        let mut normalizer = Normalizer::new(config.normalizer.clone());
        let mut enhancer = QueryEnhancer::heuristic();
        if let Some(llm) = config.llm.as_ref().filter(|llm| !llm.api_key.is_empty()) {
            let chat = Arc::new(
                ChatClient::new(llm.clone()).map_err(|e| Error::InvalidConfig(e.to_string()))?,
            );
            normalizer = normalizer.with_extractor(chat.clone());
            enhancer = QueryEnhancer::new(chat);
            info!("Using {} at {} for spec extraction and query rewriting", llm.model, llm.api_base);
        }

        Ok(Self::new(store, enhancer, normalizer, scraper).with_min_relevance(config.min_relevance))
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn working_set(&self) -> RwLockReadGuard<'_, WorkingSet> {
        self.working_set.read()
    }

    /// Cache lookup first, a single scrape on a miss.
    ///
    /// The lookup runs with both the enhanced and the raw query, so a query
    /// naming a stored record exactly still finds it.
    ///
    /// Never fails: store or scraper failures produce an empty resolution.
    pub fn resolve(&self, raw_query: &str, max_results: usize, budget: Option<u32>) -> Resolution {
        let span = info_span!("resolve", query = %raw_query);
        let _entered = span.enter();

        enter(ResolveState::Enhancing);
        let query = self.enhancer.enhance(raw_query, budget);

        if max_results == 0 {
            enter(ResolveState::Done);
            return Resolution::empty(query);
        }

        enter(ResolveState::CacheLookup);
        let mut lookups = vec![query.as_str()];
        let raw = raw_query.trim();
        if !raw.is_empty() && raw != query {
            lookups.push(raw);
        }
        let cached = match self.store.search_any(&lookups, max_results) {
            Ok(hits) => hits,
            Err(e) => {
                error!("Cache lookup for '{}' failed: {}", query, e);
                enter(ResolveState::Done);
                return Resolution::empty(query);
            }
        };
        let cached: Vec<ScoredRecord> = match self.min_relevance {
            Some(floor) => cached
                .into_iter()
                .filter(|hit| hit.score.unwrap_or(0.0) >= floor)
                .collect(),
            None => cached,
        };
        if !cached.is_empty() {
            info!("Cache hit for '{}': {} records", query, cached.len());
            self.remember(cached.iter().map(|hit| hit.record.clone()));
            enter(ResolveState::Done);
            return Resolution {
                query,
                source: ResolutionSource::Cache,
                records: cached,
                rejected: RejectionTally::default(),
            };
        }

        enter(ResolveState::Fetching);
        let listings = match self.scraper.scrape(&query, max_results) {
            Ok(listings) => listings,
            Err(e) => {
                warn!("Scrape for '{}' failed: {}", query, e);
                enter(ResolveState::Done);
                return Resolution::empty(query);
            }
        };

        enter(ResolveState::Normalizing);
        let outcome = self.normalizer.normalize_batch(&listings);
        if outcome.records.is_empty() {
            info!("No usable listings for '{}' ({} scraped)", query, listings.len());
            enter(ResolveState::Done);
            return Resolution {
                rejected: outcome.rejected,
                ..Resolution::empty(query)
            };
        }

        enter(ResolveState::Storing);
        if let Err(e) = self.store.upsert(&outcome.records) {
            error!("Storing {} records for '{}' failed: {}", outcome.records.len(), query, e);
            enter(ResolveState::Done);
            return Resolution {
                rejected: outcome.rejected,
                ..Resolution::empty(query)
            };
        }

        info!("Fetched {} fresh records for '{}'", outcome.records.len(), query);
        self.remember(outcome.records.iter().cloned());
        enter(ResolveState::Done);
        Resolution {
            query,
            source: ResolutionSource::Fresh,
            records: outcome.records.into_iter().map(ScoredRecord::unscored).collect(),
            rejected: outcome.rejected,
        }
    }

    fn remember(&self, records: impl IntoIterator<Item = Record>) {
        let added = self.working_set.write().merge(records);
        if added > 0 {
            debug!("Working set grew by {}", added);
        }
    }
}
