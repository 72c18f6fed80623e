use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::NameIndex;

pub const DEFAULT_CACHE_KEY: &str = "astroObjectNames";

/// A stored name index. Freshness is the entry count, compared against the
/// collection's remote `count`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheRecord {
    pub index: NameIndex,
}

impl CacheRecord {
    pub fn new(index: NameIndex) -> Self {
        Self { index }
    }

    pub fn entry_count(&self) -> u64 {
        self.index.len() as u64
    }

    pub fn is_fresh(&self, remote_count: u64) -> bool {
        self.entry_count() == remote_count
    }

    pub fn to_json(&self) -> Result<String, CacheError> {
        serde_json::to_string(self).map_err(|source| CacheError::Encode { source })
    }

    pub fn from_json(raw: &str) -> Result<Self, CacheError> {
        serde_json::from_str(raw).map_err(|source| CacheError::Decode { source })
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to read cache entry: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cache entry: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache entry is not a valid name index: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode name index: {source}")]
    Encode {
        #[source]
        source: serde_json::Error,
    },
}

/// Session-scoped storage for a single name index record.
pub trait CachePort: Send + Sync {
    fn read(&self) -> Result<Option<CacheRecord>, CacheError>;
    fn write(&self, record: &CacheRecord) -> Result<(), CacheError>;
}

impl<T: CachePort + ?Sized> CachePort for std::sync::Arc<T> {
    fn read(&self) -> Result<Option<CacheRecord>, CacheError> {
        (**self).read()
    }

    fn write(&self, record: &CacheRecord) -> Result<(), CacheError> {
        (**self).write(record)
    }
}

/// In-process store holding the serialized record, like a browser's
/// per-tab session storage.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl CachePort for MemoryCache {
    fn read(&self) -> Result<Option<CacheRecord>, CacheError> {
        match self.raw() {
            Some(raw) => CacheRecord::from_json(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn write(&self, record: &CacheRecord) -> Result<(), CacheError> {
        let raw = record.to_json()?;
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(raw);
        }
        Ok(())
    }
}

/// One JSON file per key under a cache directory.
#[derive(Clone, Debug)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", sanitize_key(key))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        DEFAULT_CACHE_KEY.to_string()
    } else {
        cleaned
    }
}

impl CachePort for FileCache {
    fn read(&self) -> Result<Option<CacheRecord>, CacheError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => CacheRecord::from_json(&raw).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Read {
                path: self.path.display().to_string(),
                source: e,
            }),
        }
    }

    fn write(&self, record: &CacheRecord) -> Result<(), CacheError> {
        let raw = record.to_json()?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(&self.path, raw).map_err(|e| CacheError::Write {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}
