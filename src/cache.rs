//! Persisted cache of endoflife.date responses
//!
//! One SQLite table holds every entry, keyed by `(namespace, key)`. Values
//! are JSON documents with their own time-to-live. Writes go through a single
//! writer connection inside a transaction; reads are spread over a small pool
//! of read-only WAL connections.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CacheError;

const DB_FILE_NAME: &str = "eol-cache.db";
const READER_POOL_SIZE: usize = 4;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Kind of cached fact; each kind lives in its own key space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    /// Whether a product exists in the dataset
    Availability,
    /// A single release cycle, keyed `product/cycle`
    Version,
    /// Every cycle of a product, keyed by product
    VersionSet,
}

impl CacheNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheNamespace::Availability => "availability",
            CacheNamespace::Version => "version",
            CacheNamespace::VersionSet => "version_set",
        }
    }

    pub fn all() -> &'static [CacheNamespace] {
        &[
            CacheNamespace::Availability,
            CacheNamespace::Version,
            CacheNamespace::VersionSet,
        ]
    }
}

/// Entry counts reported by `--verbose` runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub path: PathBuf,
    pub availability: usize,
    pub version: usize,
    pub version_set: usize,
    pub expired: usize,
}

impl CacheStats {
    pub fn total(&self) -> usize {
        self.availability + self.version + self.version_set
    }
}

pub struct EolCache {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
    path: PathBuf,
    offline: bool,
}

impl EolCache {
    /// Opens (creating if needed) the cache database inside `dir`
    pub fn open(dir: &Path, offline: bool) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir).map_err(|source| CacheError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;
        Self::open_file(&dir.join(DB_FILE_NAME), offline)
    }

    pub fn open_file(db_path: &Path, offline: bool) -> Result<Self, CacheError> {
        info!("Opening EOL cache at {}", db_path.display());

        let writer = Connection::open(db_path)?;
        writer.pragma_update(None, "journal_mode", "WAL")?;
        writer.pragma_update(None, "synchronous", "NORMAL")?;
        writer.busy_timeout(BUSY_TIMEOUT)?;
        Self::create_schema(&writer)?;

        let readers = (0..READER_POOL_SIZE)
            .map(|_| {
                let conn = Connection::open_with_flags(
                    db_path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                Ok(Mutex::new(conn))
            })
            .collect::<Result<Vec<_>, CacheError>>()?;

        debug!("Cache ready with {} reader connections", readers.len());

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
            path: db_path.to_path_buf(),
            offline,
        })
    }

    fn create_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                namespace TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                stored_at INTEGER NOT NULL,
                ttl_ms INTEGER,
                PRIMARY KEY (namespace, key)
            )
            "#,
            [],
        )?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when no network access may be attempted on a miss
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.writer.lock().map_err(|_| CacheError::LockPoisoned)
    }

    fn lock_reader(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        let index = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        self.readers[index]
            .lock()
            .map_err(|_| CacheError::LockPoisoned)
    }

    fn current_timestamp_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Returns the value stored under `key` if it is still valid
    pub fn get<T: DeserializeOwned>(
        &self,
        namespace: CacheNamespace,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        self.get_at(namespace, key, Self::current_timestamp_ms())
    }

    /// Same as [`get`](Self::get) with an explicit clock, in epoch milliseconds
    pub fn get_at<T: DeserializeOwned>(
        &self,
        namespace: CacheNamespace,
        key: &str,
        now_ms: i64,
    ) -> Result<Option<T>, CacheError> {
        let row: Option<(String, i64, Option<i64>)> = {
            let conn = self.lock_reader()?;
            conn.query_row(
                "SELECT value, stored_at, ttl_ms FROM entries WHERE namespace = ?1 AND key = ?2",
                (namespace.as_str(), key),
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?
        };

        let Some((value, stored_at, ttl_ms)) = row else {
            debug!("Cache miss {}/{}", namespace.as_str(), key);
            return Ok(None);
        };

        if let Some(ttl_ms) = ttl_ms {
            if now_ms - stored_at >= ttl_ms {
                debug!("Cache entry {}/{} expired", namespace.as_str(), key);
                return Ok(None);
            }
        }

        match serde_json::from_str(&value) {
            Ok(parsed) => {
                debug!("Cache hit {}/{}", namespace.as_str(), key);
                Ok(Some(parsed))
            }
            Err(e) => {
                warn!(
                    "Evicting corrupt cache entry {}/{}: {}",
                    namespace.as_str(),
                    key,
                    e
                );
                self.invalidate(namespace, key)?;
                Ok(None)
            }
        }
    }

    /// Stores `value`, replacing any previous entry for the key
    pub fn put<T: Serialize>(
        &self,
        namespace: CacheNamespace,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.put_at(namespace, key, value, ttl, Self::current_timestamp_ms())
    }

    pub fn put_at<T: Serialize>(
        &self,
        namespace: CacheNamespace,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
        now_ms: i64,
    ) -> Result<(), CacheError> {
        let encoded = serde_json::to_string(value)?;
        let ttl_ms = ttl.map(|ttl| i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX));

        let mut conn = self.lock_writer()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT OR REPLACE INTO entries (namespace, key, value, stored_at, ttl_ms)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            (namespace.as_str(), key, &encoded, now_ms, ttl_ms),
        )?;
        tx.commit()?;

        debug!("Cached {}/{}", namespace.as_str(), key);
        Ok(())
    }

    pub fn invalidate(&self, namespace: CacheNamespace, key: &str) -> Result<(), CacheError> {
        let conn = self.lock_writer()?;
        conn.execute(
            "DELETE FROM entries WHERE namespace = ?1 AND key = ?2",
            (namespace.as_str(), key),
        )?;
        Ok(())
    }

    /// Removes every entry; returns how many were deleted
    pub fn clear(&self) -> Result<usize, CacheError> {
        let conn = self.lock_writer()?;
        let removed = conn.execute("DELETE FROM entries", [])?;
        info!("Cleared {} cache entries", removed);
        Ok(removed)
    }

    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let now = Self::current_timestamp_ms();
        let conn = self.lock_reader()?;

        let mut stats = CacheStats {
            path: self.path.clone(),
            ..CacheStats::default()
        };

        for namespace in CacheNamespace::all() {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM entries WHERE namespace = ?1",
                [namespace.as_str()],
                |row| row.get(0),
            )?;
            let count = usize::try_from(count).unwrap_or(0);
            match namespace {
                CacheNamespace::Availability => stats.availability = count,
                CacheNamespace::Version => stats.version = count,
                CacheNamespace::VersionSet => stats.version_set = count,
            }
        }

        let expired: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE ttl_ms IS NOT NULL AND ?1 - stored_at >= ttl_ms",
            [now],
            |row| row.get(0),
        )?;
        stats.expired = usize::try_from(expired).unwrap_or(0);

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Eol, VersionRecord};
    use rstest::rstest;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(86_400);

    fn open_cache(temp_dir: &TempDir) -> EolCache {
        EolCache::open(temp_dir.path(), false).unwrap()
    }

    #[test]
    fn put_then_get_returns_value_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open_cache(&temp_dir);
        let record = VersionRecord::new("18", Eol::NotPlanned).with_latest("18.3.1");

        cache
            .put(CacheNamespace::Version, "react/18", &record, Some(DAY))
            .unwrap();

        let cached: Option<VersionRecord> = cache.get(CacheNamespace::Version, "react/18").unwrap();
        assert_eq!(cached, Some(record));
    }

    #[test]
    fn get_returns_none_for_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open_cache(&temp_dir);
        let cached: Option<bool> = cache.get(CacheNamespace::Availability, "react").unwrap();
        assert_eq!(cached, None);
    }

    #[rstest]
    #[case(0, true)]
    #[case(86_399_999, true)]
    #[case(86_400_000, false)]
    #[case(90_000_000, false)]
    fn entry_validity_follows_ttl(#[case] elapsed_ms: i64, #[case] valid: bool) {
        let temp_dir = TempDir::new().unwrap();
        let cache = open_cache(&temp_dir);
        let stored_at = 1_700_000_000_000;
        cache
            .put_at(CacheNamespace::Availability, "react", &true, Some(DAY), stored_at)
            .unwrap();

        let cached: Option<bool> = cache
            .get_at(CacheNamespace::Availability, "react", stored_at + elapsed_ms)
            .unwrap();
        assert_eq!(cached.is_some(), valid);
    }

    #[test]
    fn entry_without_ttl_never_expires() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open_cache(&temp_dir);
        cache
            .put_at(CacheNamespace::VersionSet, "python", &Vec::<VersionRecord>::new(), None, 0)
            .unwrap();

        let cached: Option<Vec<VersionRecord>> = cache
            .get_at(CacheNamespace::VersionSet, "python", i64::MAX / 2)
            .unwrap();
        assert_eq!(cached, Some(vec![]));
    }

    #[test]
    fn put_replaces_existing_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open_cache(&temp_dir);
        cache
            .put(CacheNamespace::Availability, "react", &false, Some(DAY))
            .unwrap();
        cache
            .put(CacheNamespace::Availability, "react", &true, Some(DAY))
            .unwrap();

        let cached: Option<bool> = cache.get(CacheNamespace::Availability, "react").unwrap();
        assert_eq!(cached, Some(true));
        assert_eq!(cache.stats().unwrap().availability, 1);
    }

    #[test]
    fn namespaces_are_independent() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open_cache(&temp_dir);
        cache
            .put(CacheNamespace::Availability, "react", &true, Some(DAY))
            .unwrap();

        let cached: Option<bool> = cache.get(CacheNamespace::VersionSet, "react").unwrap();
        assert_eq!(cached, None);
    }

    #[test]
    fn corrupt_entry_is_a_miss_and_evicted() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open_cache(&temp_dir);
        cache
            .put(CacheNamespace::Version, "react/16", &"not a record", Some(DAY))
            .unwrap();

        let cached: Option<VersionRecord> = cache.get(CacheNamespace::Version, "react/16").unwrap();
        assert_eq!(cached, None);
        assert_eq!(cache.stats().unwrap().version, 0);
    }

    #[test]
    fn invalidate_removes_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open_cache(&temp_dir);
        cache
            .put(CacheNamespace::Availability, "react", &true, Some(DAY))
            .unwrap();
        cache.invalidate(CacheNamespace::Availability, "react").unwrap();

        let cached: Option<bool> = cache.get(CacheNamespace::Availability, "react").unwrap();
        assert_eq!(cached, None);
    }

    #[test]
    fn clear_and_stats() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open_cache(&temp_dir);
        cache
            .put(CacheNamespace::Availability, "react", &true, Some(DAY))
            .unwrap();
        cache
            .put(
                CacheNamespace::Version,
                "react/18",
                &VersionRecord::new("18", Eol::NotPlanned),
                Some(DAY),
            )
            .unwrap();
        cache
            .put_at(
                CacheNamespace::Version,
                "react/16",
                &VersionRecord::new("16", Eol::Reached),
                Some(DAY),
                0,
            )
            .unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.availability, 1);
        assert_eq!(stats.version, 2);
        assert_eq!(stats.version_set, 0);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.total(), 3);

        assert_eq!(cache.clear().unwrap(), 3);
        assert_eq!(cache.stats().unwrap().total(), 0);
    }

    #[test]
    fn entries_persist_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = open_cache(&temp_dir);
            cache
                .put(CacheNamespace::Availability, "nodejs", &true, Some(DAY))
                .unwrap();
        }
        let reopened = EolCache::open(temp_dir.path(), true).unwrap();
        assert!(reopened.is_offline());
        let cached: Option<bool> = reopened.get(CacheNamespace::Availability, "nodejs").unwrap();
        assert_eq!(cached, Some(true));
    }

    #[test]
    fn concurrent_writes_to_same_key_keep_one_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = std::sync::Arc::new(open_cache(&temp_dir));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    cache
                        .put(CacheNamespace::Availability, "django", &(i % 2 == 0), Some(DAY))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let cached: Option<bool> = cache.get(CacheNamespace::Availability, "django").unwrap();
        assert!(cached.is_some());
        assert_eq!(cache.stats().unwrap().availability, 1);
    }
}
