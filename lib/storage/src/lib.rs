pub mod manager;
pub mod lmdb_storage;
pub mod snapshot;

pub use manager::{CacheStats, RecordStore, StoredEntry, DEFAULT_MAP_SIZE_MB};
pub use lmdb_storage::LmdbStorage;
pub use snapshot::{read_records_json, write_records_json};
