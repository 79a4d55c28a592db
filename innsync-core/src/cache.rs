//! Local snapshot cache.
//!
//! The cache is a key-value blob store used only as a startup buffer:
//! the working set is rebuilt from it before the remote feed arrives,
//! and re-persisted after every settled change. Cache failures are
//! never surfaced to the user; they only reduce durability.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::booking::Booking;
use crate::error::{BookingError, BookingResult};

/// Cache key for the booking snapshot. Versioned so a future format
/// change can leave stale blobs behind instead of misparsing them.
pub const CACHE_KEY: &str = "innsync_bookings_v1";

/// A key-value blob store surviving restarts.
pub trait BookingCache: Send + Sync {
    fn get(&self, key: &str) -> BookingResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> BookingResult<()>;
}

/// Serialize a snapshot to the cache blob format (a JSON array).
pub fn encode_snapshot(bookings: &[Booking]) -> BookingResult<String> {
    serde_json::to_string(bookings).map_err(|e| BookingError::Serialization(e.to_string()))
}

/// Parse a cache blob back into bookings.
pub fn decode_snapshot(raw: &str) -> BookingResult<Vec<Booking>> {
    serde_json::from_str(raw).map_err(|e| BookingError::Serialization(e.to_string()))
}

/// Persist a snapshot, swallowing any failure.
pub fn persist_snapshot(cache: &dyn BookingCache, bookings: &[Booking]) {
    let encoded = match encode_snapshot(bookings) {
        Ok(encoded) => encoded,
        Err(err) => {
            tracing::warn!(error = %err, "failed to encode booking snapshot for cache");
            return;
        }
    };
    if let Err(err) = cache.set(CACHE_KEY, &encoded) {
        tracing::warn!(error = %err, "failed to persist booking snapshot to cache");
    }
}

/// Load the cached snapshot, treating a missing or malformed blob as
/// empty.
pub fn load_snapshot(cache: &dyn BookingCache) -> Vec<Booking> {
    match cache.get(CACHE_KEY) {
        Ok(Some(raw)) => match decode_snapshot(&raw) {
            Ok(bookings) => bookings,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring malformed cache blob");
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to read booking cache");
            Vec::new()
        }
    }
}

/// File-backed cache: one file per key under a directory.
///
/// Writes go through a temp file and rename so a crash mid-write never
/// leaves a truncated blob.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> FileCache {
        FileCache { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BookingCache for FileCache {
    fn get(&self, key: &str) -> BookingResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> BookingResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let temp = self.dir.join(format!("{key}.json.tmp"));
        std::fs::write(&temp, value)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }
}

/// In-memory cache, for processes that want no persistence and for
/// tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> MemoryCache {
        MemoryCache::default()
    }
}

impl BookingCache for MemoryCache {
    fn get(&self, key: &str) -> BookingResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| BookingError::Cache("cache lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> BookingResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| BookingError::Cache("cache lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
