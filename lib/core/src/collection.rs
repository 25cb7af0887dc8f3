use crate::{Error, Filter, Record, Result, Vector};
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Configuration for a collection
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub name: String,
    pub vector_dim: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            vector_dim: 256,
        }
    }
}

/// A record together with its embedding and insertion sequence number
#[derive(Debug, Clone)]
pub struct Entry {
    pub record: Record,
    pub vector: Vector,
    pub seq: u64,
}

/// A search hit: the record and its cosine distance to the query
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub record: Record,
    pub distance: f32,
    pub seq: u64,
}

/// In-memory records keyed by identity key, searched by exact cosine
/// distance.
///
/// Overwriting a key keeps its original sequence number, so ordering
/// stays stable across updates.
pub struct Collection {
    config: CollectionConfig,
    entries: RwLock<HashMap<String, Entry>>,
    next_seq: AtomicU64,
}

impl Collection {
    pub fn new(config: CollectionConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn vector_dim(&self) -> usize {
        self.config.vector_dim
    }

    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Sequence number the next new key will receive
    pub fn next_seq(&self) -> u64 {
        self.next_seq.load(Ordering::Acquire)
    }

    /// Insert or overwrite a record. Returns the sequence number assigned to
    /// its key.
    pub fn upsert(&self, record: Record, vector: Vector) -> Result<u64> {
        if vector.dim() != self.config.vector_dim {
            return Err(Error::InvalidDimension {
                expected: self.config.vector_dim,
                actual: vector.dim(),
            });
        }

        let mut entries = self.entries.write();
        let seq = match entries.get(&record.identity_key) {
            Some(existing) => existing.seq,
            None => self.next_seq.fetch_add(1, Ordering::AcqRel),
        };
        let key = record.identity_key.clone();
        entries.insert(key, Entry { record, vector, seq });
        Ok(seq)
    }

    /// Insert an entry with an already assigned sequence number, e.g. one
    /// loaded from disk
    pub fn put_entry(&self, entry: Entry) -> Result<()> {
        if entry.vector.dim() != self.config.vector_dim {
            return Err(Error::InvalidDimension {
                expected: self.config.vector_dim,
                actual: entry.vector.dim(),
            });
        }
        self.next_seq.fetch_max(entry.seq + 1, Ordering::AcqRel);
        self.entries
            .write()
            .insert(entry.record.identity_key.clone(), entry);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.entries.read().get(key).map(|e| e.record.clone())
    }

    pub fn seq_of(&self, key: &str) -> Option<u64> {
        self.entries.read().get(key).map(|e| e.seq)
    }

    /// Nearest neighbors by ascending cosine distance; ties keep insertion
    /// order.
    pub fn search(
        &self,
        query: &Vector,
        limit: usize,
        filter: Option<&dyn Filter>,
    ) -> Vec<Neighbor> {
        let entries = self.entries.read();
        let mut results: Vec<Neighbor> = entries
            .values()
            .filter(|entry| filter.map(|f| f.matches(&entry.record)).unwrap_or(true))
            .map(|entry| Neighbor {
                record: entry.record.clone(),
                distance: entry.vector.cosine_distance(query),
                seq: entry.seq,
            })
            .collect();

        results.sort_by_key(|n| (OrderedFloat(n.distance), n.seq));
        results.truncate(limit);
        results
    }

    /// All records in insertion order
    pub fn records(&self) -> Vec<Record> {
        let entries = self.entries.read();
        let mut ordered: Vec<&Entry> = entries.values().collect();
        ordered.sort_by_key(|e| e.seq);
        ordered.into_iter().map(|e| e.record.clone()).collect()
    }
}
