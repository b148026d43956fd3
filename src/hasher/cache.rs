use crate::error::Error;
use crate::hasher::HashMethod;
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, trace};

/// Cached digest for one `(message_id, source_file, method)` triple.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HashCacheEntry {
    pub digest: u64,
    /// Unix seconds of the last write for this key.
    pub last_seen_at: i64,
}

/// Persistent digest cache backed by RocksDB.
///
/// Keys are `"{message_id}|{source_file}|{method}"`; one entry per key,
/// last writer wins. RocksDB serializes concurrent writers itself, so the
/// cache can be shared by reference across scanner threads without extra
/// locking.
///
/// Known limitation, preserved on purpose: an entry is never invalidated
/// when a message's content changes under an unchanged Message-ID. The only
/// escape hatch is `clear_all`.
pub struct HashCache {
    db: DB,
}

impl HashCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        debug!("Using '{}' for hash cache", path.display());

        let mut db_options = Options::default();
        db_options.create_if_missing(true);
        let db = DB::open(&db_options, path)
            .map_err(|e| Error::Cache(format!("failed to open hash cache: {}", e)))?;
        Ok(Self { db })
    }

    fn cache_key(message_id: &str, source_file: &Path, method: HashMethod) -> Vec<u8> {
        format!("{}|{}|{}", message_id, source_file.display(), method).into_bytes()
    }

    pub fn get(
        &self,
        message_id: &str,
        source_file: &Path,
        method: HashMethod,
    ) -> Result<Option<u64>, Error> {
        let key = Self::cache_key(message_id, source_file, method);
        match self.db.get(&key)? {
            Some(value) => {
                let entry: HashCacheEntry = bincode::deserialize(&value)?;
                trace!("Cache hit for {}", message_id);
                Ok(Some(entry.digest))
            }
            None => Ok(None),
        }
    }

    /// Write-through store; overwrites any previous entry for the key.
    pub fn set(
        &self,
        message_id: &str,
        source_file: &Path,
        method: HashMethod,
        digest: u64,
    ) -> Result<(), Error> {
        let key = Self::cache_key(message_id, source_file, method);
        let entry = HashCacheEntry {
            digest,
            last_seen_at: chrono::Utc::now().timestamp(),
        };
        let serialized = bincode::serialize(&entry)?;
        self.db.put(&key, serialized)?;
        Ok(())
    }

    pub fn count_keys(&self) -> Result<usize, Error> {
        let mut count = 0usize;
        for item in self.db.iterator(IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn clear_all(&self) -> Result<(), Error> {
        let mut batch = WriteBatch::default();
        for item in self.db.iterator(IteratorMode::Start) {
            let (key, _) = item?;
            batch.delete(&key);
        }
        self.db.write(batch)?;
        info!("Hash cache cleared");
        Ok(())
    }
}
