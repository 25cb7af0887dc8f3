// LMDB-backed record persistence
use anyhow::Result;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

const DB_RECORDS: &str = "records";
const DB_META: &str = "meta";

/// LMDB rejects keys above 511 bytes; longer identity keys are stored under
/// their SHA-256.
const MAX_RAW_KEY_LEN: usize = 480;

pub struct LmdbStorage {
    env: Arc<Env>,
    records_db: Database<Str, Bytes>,
    meta_db: Database<Str, Bytes>,
}

impl LmdbStorage {
    pub fn new<P: AsRef<Path>>(path: P, map_size: usize) -> Result<Self> {
        std::fs::create_dir_all(&path)?;

        let env = Arc::new(
            unsafe {
                EnvOpenOptions::new()
                    .map_size(map_size)
                    .max_dbs(4)
                    .open(path)?
            }
        );

        let mut wtxn = env.write_txn()?;

        let records_db: Database<Str, Bytes> = env
            .create_database(&mut wtxn, Some(DB_RECORDS))?;

        let meta_db: Database<Str, Bytes> = env
            .create_database(&mut wtxn, Some(DB_META))?;

        wtxn.commit()?;

        Ok(Self {
            env,
            records_db,
            meta_db,
        })
    }

    /// Key under which an identity key is stored
    pub fn storage_key(identity_key: &str) -> String {
        if identity_key.len() <= MAX_RAW_KEY_LEN {
            identity_key.to_string()
        } else {
            let digest = Sha256::digest(identity_key.as_bytes());
            let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
            format!("sha256:{}", hex)
        }
    }

    /// Write a batch in one transaction; either all entries land or none do
    pub fn save_records(&self, batch: &[(String, Vec<u8>)]) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        for (identity_key, data) in batch {
            self.records_db.put(&mut wtxn, &Self::storage_key(identity_key), data)?;
        }
        wtxn.commit()?;
        Ok(())
    }

    pub fn get_record(&self, identity_key: &str) -> Result<Option<Vec<u8>>> {
        let rtxn = self.env.read_txn()?;
        match self.records_db.get(&rtxn, &Self::storage_key(identity_key))? {
            Some(data) => Ok(Some(data.to_vec())),
            None => Ok(None),
        }
    }

    /// Every stored value, in key order
    pub fn all_records(&self) -> Result<Vec<Vec<u8>>> {
        let rtxn = self.env.read_txn()?;
        let mut values = Vec::new();
        for result in self.records_db.iter(&rtxn)? {
            let (_, data) = result?;
            values.push(data.to_vec());
        }
        Ok(values)
    }

    pub fn count_records(&self) -> Result<u64> {
        let rtxn = self.env.read_txn()?;
        Ok(self.records_db.len(&rtxn)?)
    }

    pub fn save_meta(&self, name: &str, data: &[u8]) -> Result<()> {
        let mut wtxn = self.env.write_txn()?;
        self.meta_db.put(&mut wtxn, name, data)?;
        wtxn.commit()?;
        Ok(())
    }

    pub fn get_meta(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, name)? {
            Some(data) => Ok(Some(data.to_vec())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MAP_SIZE: usize = 16 * 1024 * 1024;

    #[test]
    fn test_record_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LmdbStorage::new(dir.path(), TEST_MAP_SIZE).unwrap();

        storage.save_records(&[("poco_x6".to_string(), b"one".to_vec())]).unwrap();
        storage.save_records(&[("poco_x6".to_string(), b"two".to_vec())]).unwrap();

        assert_eq!(storage.get_record("poco_x6").unwrap(), Some(b"two".to_vec()));
        assert_eq!(storage.get_record("missing").unwrap(), None);
        assert_eq!(storage.count_records().unwrap(), 1);
    }

    #[test]
    fn test_batch_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LmdbStorage::new(dir.path(), TEST_MAP_SIZE).unwrap();

        let batch = vec![
            ("b".to_string(), b"2".to_vec()),
            ("a".to_string(), b"1".to_vec()),
        ];
        storage.save_records(&batch).unwrap();

        assert_eq!(storage.all_records().unwrap(), vec![b"1".to_vec(), b"2".to_vec()]);
    }

    #[test]
    fn test_long_keys_are_hashed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LmdbStorage::new(dir.path(), TEST_MAP_SIZE).unwrap();

        let long_key = "x".repeat(2000);
        assert!(LmdbStorage::storage_key(&long_key).starts_with("sha256:"));
        storage.save_records(&[(long_key.clone(), b"v".to_vec())]).unwrap();
        assert_eq!(storage.get_record(&long_key).unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn test_meta() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LmdbStorage::new(dir.path(), TEST_MAP_SIZE).unwrap();

        assert_eq!(storage.get_meta("embedder").unwrap(), None);
        storage.save_meta("embedder", b"hash-v1:256").unwrap();
        assert_eq!(storage.get_meta("embedder").unwrap(), Some(b"hash-v1:256".to_vec()));
    }
}
