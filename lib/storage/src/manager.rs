use ahash::AHashMap;
use gadgetcache_core::{
    Collection, CollectionConfig, Entry, Error, Filter, Neighbor, Record, Result, ScoredRecord,
    Vector,
};
use gadgetcache_similarity::{relevance_score, Embedder};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry as Slot;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::lmdb_storage::LmdbStorage;
use crate::snapshot;

/// Default LMDB map size
pub const DEFAULT_MAP_SIZE_MB: usize = 1024;

const COLLECTION_NAME: &str = "phones";
const META_EMBEDDER: &str = "embedder";

/// On-disk value for one record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    pub record: Record,
    pub embedding: Vec<f32>,
    pub seq: u64,
}

/// Summary of the store contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_records: usize,
    /// Distinct brands, sorted
    pub brands: Vec<String>,
    /// `(min, max)` price, `(0, 0)` when empty
    pub price_range: (u32, u32),
}

/// Persistent record store with nearest-neighbor lookup.
///
/// Records live in LMDB keyed by identity key; an in-memory [`Collection`]
/// mirrors them for search. Opening a store whose embeddings came from a
/// different embedder re-embeds every record so rankings stay comparable.
pub struct RecordStore {
    collection: Collection,
    lmdb: LmdbStorage,
    embedder: Arc<dyn Embedder>,
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn open<P: AsRef<Path>>(data_dir: P, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::open_with_map_size(data_dir, embedder, DEFAULT_MAP_SIZE_MB)
    }

    pub fn open_with_map_size<P: AsRef<Path>>(
        data_dir: P,
        embedder: Arc<dyn Embedder>,
        map_size_mb: usize,
    ) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let lmdb = LmdbStorage::new(data_dir.join("lmdb"), map_size_mb * 1024 * 1024)
            .map_err(|e| Error::Storage(e.to_string()))?;

        let collection = Collection::new(CollectionConfig {
            name: COLLECTION_NAME.to_string(),
            vector_dim: embedder.dim(),
        });

        let store = Self {
            collection,
            lmdb,
            embedder,
            data_dir,
            write_lock: Mutex::new(()),
        };
        store.load()?;
        Ok(store)
    }

    fn load(&self) -> Result<()> {
        let fingerprint = self.embedder.fingerprint();
        let stored_fingerprint = self
            .lmdb
            .get_meta(META_EMBEDDER)
            .map_err(|e| Error::Storage(e.to_string()))?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

        let raw = self
            .lmdb
            .all_records()
            .map_err(|e| Error::Storage(e.to_string()))?;

        let mut entries = Vec::with_capacity(raw.len());
        for bytes in raw {
            match bincode::deserialize::<StoredEntry>(&bytes) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping unreadable cache entry: {}", e),
            }
        }

        let stale = stored_fingerprint.as_deref() != Some(fingerprint.as_str());
        if stale && !entries.is_empty() {
            info!(
                "Re-embedding {} cached records ({} -> {})",
                entries.len(),
                stored_fingerprint.as_deref().unwrap_or("none"),
                fingerprint
            );
            let texts: Vec<String> = entries.iter().map(|e| e.record.search_text.clone()).collect();
            let vectors = self.embed_all(&texts)?;
            for (entry, vector) in entries.iter_mut().zip(vectors) {
                entry.embedding = vector;
            }
            self.persist(&entries)?;
        }
        if stale {
            self.lmdb
                .save_meta(META_EMBEDDER, fingerprint.as_bytes())
                .map_err(|e| Error::Storage(e.to_string()))?;
        }

        for stored in entries {
            let key = stored.record.identity_key.clone();
            let entry = Entry {
                record: stored.record,
                vector: Vector::new(stored.embedding),
                seq: stored.seq,
            };
            if let Err(e) = self.collection.put_entry(entry) {
                warn!("Skipping cache entry {}: {}", key, e);
            }
        }

        if !self.collection.is_empty() {
            info!(
                "Loaded {} cached records into '{}' from {}",
                self.collection.count(),
                self.collection.name(),
                self.data_dir.display()
            );
        }
        Ok(())
    }

    fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self
            .embedder
            .embed(texts)
            .map_err(|e| Error::Embedding(e.to_string()))?;
        if vectors.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} vectors, embedder returned {}",
                texts.len(),
                vectors.len()
            )));
        }
        for vector in &vectors {
            if vector.len() != self.collection.vector_dim() {
                return Err(Error::InvalidDimension {
                    expected: self.collection.vector_dim(),
                    actual: vector.len(),
                });
            }
        }
        Ok(vectors)
    }

    fn persist(&self, entries: &[StoredEntry]) -> Result<()> {
        let mut batch = Vec::with_capacity(entries.len());
        for entry in entries {
            let bytes = bincode::serialize(entry)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            batch.push((entry.record.identity_key.clone(), bytes));
        }
        self.lmdb
            .save_records(&batch)
            .map_err(|e| Error::Persistence(e.to_string()))
    }

    /// Insert or overwrite records by identity key; the last write wins.
    ///
    /// Records without a positive price or with out-of-range values are
    /// dropped. Derived fields (category, search text, and the identity key
    /// when absent) are recomputed before embedding. The batch is committed
    /// in one transaction. Returns the number of records written.
    pub fn upsert(&self, records: &[Record]) -> Result<usize> {
        let mut order: Vec<String> = Vec::new();
        let mut latest: AHashMap<String, Record> = AHashMap::new();
        for record in records {
            if !record.is_valid() {
                warn!("Dropping invalid record '{}' (price {})", record.full_name, record.price);
                continue;
            }
            let mut record = record.clone();
            record.finalize();
            if latest.insert(record.identity_key.clone(), record.clone()).is_none() {
                order.push(record.identity_key);
            }
        }
        if order.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock();

        let records: Vec<Record> = order
            .iter()
            .filter_map(|key| latest.remove(key))
            .collect();
        let texts: Vec<String> = records.iter().map(|r| r.search_text.clone()).collect();
        let vectors = self.embed_all(&texts)?;

        let mut next_seq = self.collection.next_seq();
        let mut entries = Vec::with_capacity(records.len());
        for (record, embedding) in records.into_iter().zip(vectors) {
            let seq = match self.collection.seq_of(&record.identity_key) {
                Some(seq) => seq,
                None => {
                    let seq = next_seq;
                    next_seq += 1;
                    seq
                }
            };
            entries.push(StoredEntry { record, embedding, seq });
        }

        self.persist(&entries)?;

        let written = entries.len();
        for stored in entries {
            self.collection.put_entry(Entry {
                record: stored.record,
                vector: Vector::new(stored.embedding),
                seq: stored.seq,
            })?;
        }
        debug!("Upserted {} records ({} total)", written, self.collection.count());
        Ok(written)
    }

    /// Nearest records to `query`, scored by relevance
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredRecord>> {
        self.search_with(query, limit, None)
    }

    /// Nearest records to `query` among those accepted by `filter`
    pub fn search_filtered(
        &self,
        query: &str,
        limit: usize,
        filter: &dyn Filter,
    ) -> Result<Vec<ScoredRecord>> {
        self.search_with(query, limit, Some(filter))
    }

    /// Nearest records to any of `queries`.
    ///
    /// A record reached by several queries keeps its smallest distance; the
    /// merged hits are ordered by distance, then insertion order.
    pub fn search_any(&self, queries: &[&str], limit: usize) -> Result<Vec<ScoredRecord>> {
        if self.collection.is_empty() || limit == 0 || queries.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.min(self.collection.count());

        let mut best: AHashMap<String, Neighbor> = AHashMap::new();
        for query in queries {
            let embedding = self.embed_query(query)?;
            for neighbor in self.collection.search(&embedding, limit, None) {
                match best.entry(neighbor.record.identity_key.clone()) {
                    Slot::Occupied(mut slot) => {
                        if neighbor.distance < slot.get().distance {
                            slot.insert(neighbor);
                        }
                    }
                    Slot::Vacant(slot) => {
                        slot.insert(neighbor);
                    }
                }
            }
        }

        let mut merged: Vec<Neighbor> = best.into_values().collect();
        merged.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.seq.cmp(&b.seq)));
        merged.truncate(limit);
        Ok(merged.into_iter().map(scored).collect())
    }

    fn search_with(
        &self,
        query: &str,
        limit: usize,
        filter: Option<&dyn Filter>,
    ) -> Result<Vec<ScoredRecord>> {
        if self.collection.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let limit = limit.min(self.collection.count());
        let embedding = self.embed_query(query)?;

        Ok(self
            .collection
            .search(&embedding, limit, filter)
            .into_iter()
            .map(scored)
            .collect())
    }

    fn embed_query(&self, query: &str) -> Result<Vector> {
        let embedding = self
            .embedder
            .embed_one(&query.to_lowercase())
            .map_err(|e| Error::Embedding(e.to_string()))?;
        let embedding = Vector::new(embedding);
        if embedding.dim() != self.collection.vector_dim() {
            return Err(Error::InvalidDimension {
                expected: self.collection.vector_dim(),
                actual: embedding.dim(),
            });
        }
        Ok(embedding)
    }

    /// Every stored record in insertion order
    pub fn get_all(&self) -> Vec<Record> {
        self.collection.records()
    }

    /// Lookup by identity key, read through to disk
    pub fn get(&self, identity_key: &str) -> Result<Option<Record>> {
        if let Some(record) = self.collection.get(identity_key) {
            return Ok(Some(record));
        }
        let bytes = self
            .lmdb
            .get_record(identity_key)
            .map_err(|e| Error::Storage(e.to_string()))?;
        match bytes {
            Some(bytes) => {
                let entry: StoredEntry = bincode::deserialize(&bytes)
                    .map_err(|e| Error::Serialization(e.to_string()))?;
                Ok(Some(entry.record))
            }
            None => Ok(None),
        }
    }

    pub fn count(&self) -> usize {
        self.collection.count()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let records = self.collection.records();
        let brands: BTreeSet<String> = records
            .iter()
            .map(|r| r.brand.clone())
            .filter(|b| !b.is_empty())
            .collect();
        let price_range = match (
            records.iter().map(|r| r.price).min(),
            records.iter().map(|r| r.price).max(),
        ) {
            (Some(min), Some(max)) => (min, max),
            _ => (0, 0),
        };
        CacheStats {
            total_records: records.len(),
            brands: brands.into_iter().collect(),
            price_range,
        }
    }

    /// Upsert every well-formed record from a JSON array file
    pub fn ingest_json<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let records = snapshot::read_records_json(path)
            .map_err(|e| Error::Persistence(e.to_string()))?;
        self.upsert(&records)
    }

    /// Write every record to a JSON array file, atomically replacing it
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let records = self.get_all();
        snapshot::write_records_json(path, &records)
            .map_err(|e| Error::Persistence(e.to_string()))?;
        Ok(records.len())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn fingerprint(&self) -> String {
        self.embedder.fingerprint()
    }
}

fn scored(neighbor: Neighbor) -> ScoredRecord {
    ScoredRecord {
        score: Some(relevance_score(neighbor.distance)),
        distance: Some(neighbor.distance),
        record: neighbor.record,
    }
}
