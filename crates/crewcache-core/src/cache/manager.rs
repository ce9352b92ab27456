use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

/// Event, status, and show mirrors are considered stale after 5 minutes.
pub const CACHE_TTL_MINUTES: i64 = 5;

/// The per-team roster cache is deliberately shorter-lived than the event
/// and status caches, so membership changes show up quickly.
pub const ROSTER_TTL_SECONDS: i64 = 60;

/// TTL for event/status/show mirrors.
pub fn default_ttl() -> Duration {
    Duration::minutes(CACHE_TTL_MINUTES)
}

/// TTL for per-team roster mirrors.
pub fn roster_ttl() -> Duration {
    Duration::seconds(ROSTER_TTL_SECONDS)
}

/// A snapshot of rows with the time they were fetched, as persisted to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.cached_at > ttl
    }
}

/// In-memory mirror of one backend table.
///
/// Non-authoritative: the backend owns the rows, the mirror is what the
/// stores read between refreshes. `fetched_at` of `None` means expired.
#[derive(Debug)]
pub struct Mirror<T> {
    rows: Vec<T>,
    fetched_at: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl<T> Mirror<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            rows: Vec::new(),
            fetched_at: None,
            ttl,
        }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<T> {
        &mut self.rows
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// True while the last successful fetch is within the TTL window.
    pub fn is_fresh(&self) -> bool {
        match self.fetched_at {
            Some(at) => Utc::now() - at <= self.ttl,
            None => false,
        }
    }

    /// Replace the mirror wholesale after a successful backend fetch.
    pub fn replace(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.fetched_at = Some(Utc::now());
    }

    /// Restore rows and their original fetch stamp from the persisted cache,
    /// so a restart does not reset the TTL clock.
    pub fn restore(&mut self, rows: Vec<T>, fetched_at: DateTime<Utc>) {
        self.rows = rows;
        self.fetched_at = Some(fetched_at);
    }

    /// Clear the rows and mark the mirror expired.
    pub fn invalidate(&mut self) {
        self.rows.clear();
        self.fetched_at = None;
    }
}

/// Persists mirrors as JSON files under the cache directory, one per entity,
/// carrying their fetch stamps across restarts.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    pub fn save<T: Serialize>(&self, name: &str, cached: &CachedData<T>) -> Result<()> {
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(cached)?;
        std::fs::write(&path, contents)?;
        debug!(cache = name, "Cache file written");
        Ok(())
    }

    /// Remove the persisted snapshot for an entity, if any.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.cache_path(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache file: {}", name))?;
            debug!(cache = name, "Cache file removed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_data_fresh_then_expired() {
        let fresh = CachedData::new(vec![1, 2, 3]);
        assert!(!fresh.is_expired(default_ttl()));

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(CACHE_TTL_MINUTES + 1);
        assert!(old.is_expired(default_ttl()));
    }

    #[test]
    fn test_mirror_starts_expired() {
        let mirror: Mirror<i32> = Mirror::new(default_ttl());
        assert!(!mirror.is_fresh());
        assert!(mirror.rows().is_empty());
    }

    #[test]
    fn test_mirror_replace_marks_fresh() {
        let mut mirror = Mirror::new(default_ttl());
        mirror.replace(vec![1, 2]);
        assert!(mirror.is_fresh());
        assert_eq!(mirror.rows(), &[1, 2]);
    }

    #[test]
    fn test_mirror_restore_keeps_old_stamp() {
        let mut mirror = Mirror::new(default_ttl());
        let stale = Utc::now() - Duration::minutes(CACHE_TTL_MINUTES + 10);
        mirror.restore(vec![1], stale);
        assert!(!mirror.is_fresh());
        assert_eq!(mirror.rows(), &[1]);
    }

    #[test]
    fn test_mirror_invalidate_clears_everything() {
        let mut mirror = Mirror::new(default_ttl());
        mirror.replace(vec![1, 2]);
        mirror.invalidate();
        assert!(mirror.rows().is_empty());
        assert!(mirror.fetched_at().is_none());
        assert!(!mirror.is_fresh());
    }

    #[test]
    fn test_roster_ttl_is_shorter() {
        assert!(roster_ttl() < default_ttl());
    }
}
