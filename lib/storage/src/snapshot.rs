// JSON import/export of cached records
use anyhow::{anyhow, Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use gadgetcache_core::Record;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Read a JSON array of records.
///
/// Elements that do not deserialize are skipped with a warning. Derived
/// fields are recomputed from the stored attributes.
pub fn read_records_json<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        _ => return Err(anyhow!("{} does not contain a JSON array", path.display())),
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Record>(item) {
            Ok(mut record) => {
                record.finalize();
                records.push(record);
            }
            Err(e) => warn!("Skipping malformed record #{} in {}: {}", index, path.display(), e),
        }
    }
    Ok(records)
}

/// Write records as a pretty-printed JSON array, replacing `path` atomically
pub fn write_records_json<P: AsRef<Path>>(path: P, records: &[Record]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(records)?;

    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(&json))
        .map_err(|e| anyhow!("writing {}: {}", path.display(), e))?;
    Ok(())
}
