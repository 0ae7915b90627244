//! File-based geocode cache at ~/.placefinder/cache.json.
//!
//! Keys are case-insensitive, trimmed query strings. Entries older than the
//! TTL are ignored on read and dropped on the next write.

use super::types::Coordinate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_TTL_DAYS: u32 = 30;

#[derive(Serialize, Deserialize, Clone, Debug)]
struct CacheEntry {
    lat: f64,
    lon: f64,
    /// Query as the user typed it.
    query: String,
    /// Unix milliseconds.
    timestamp: i64,
}

pub struct GeocodeCache {
    path: PathBuf,
    ttl_ms: i64,
    entries: HashMap<String, CacheEntry>,
}

impl GeocodeCache {
    pub fn load_from(path: PathBuf, ttl_days: u32) -> Self {
        let entries = Self::read_file(&path).unwrap_or_default();
        tracing::debug!(path = %path.display(), entries = entries.len(), "loaded geocode cache");
        Self {
            path,
            ttl_ms: i64::from(ttl_days) * 24 * 3600 * 1000,
            entries,
        }
    }

    pub fn default_path() -> PathBuf {
        crate::config::data_dir().join("cache.json")
    }

    fn read_file(path: &Path) -> Option<HashMap<String, CacheEntry>> {
        let data = fs::read_to_string(path).ok()?;
        serde_json::from_str(&data).ok()
    }

    fn key(query: &str) -> String {
        query.trim().to_lowercase()
    }

    fn is_fresh(&self, entry: &CacheEntry, now: i64) -> bool {
        now.saturating_sub(entry.timestamp) <= self.ttl_ms
    }

    /// Cached coordinate for a query, if present and not expired.
    pub fn get(&self, query: &str) -> Option<Coordinate> {
        let entry = self.entries.get(&Self::key(query))?;
        let now = chrono::Utc::now().timestamp_millis();
        if !self.is_fresh(entry, now) {
            return None;
        }
        Some(Coordinate::new(entry.lat, entry.lon))
    }

    /// Store a result and persist. Write failures are logged, not returned.
    pub fn put(&mut self, query: &str, coordinate: Coordinate) {
        let now = chrono::Utc::now().timestamp_millis();
        self.entries.insert(
            Self::key(query),
            CacheEntry {
                lat: coordinate.lat,
                lon: coordinate.lon,
                query: query.trim().to_string(),
                timestamp: now,
            },
        );
        let ttl_ms = self.ttl_ms;
        self.entries.retain(|_, e| now.saturating_sub(e.timestamp) <= ttl_ms);
        if let Err(e) = self.persist() {
            tracing::warn!(path = %self.path.display(), error = %e, "could not write geocode cache");
        }
    }

    fn persist(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cache() -> (GeocodeCache, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        (GeocodeCache::load_from(path, DEFAULT_TTL_DAYS), dir)
    }

    #[test]
    fn test_put_get_case_insensitive() {
        let (mut cache, _dir) = test_cache();
        cache.put("  Accra ", Coordinate::new(5.6037, -0.187));
        assert_eq!(cache.get("ACCRA"), Some(Coordinate::new(5.6037, -0.187)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_miss() {
        let (cache, _dir) = test_cache();
        assert!(cache.get("nowhere").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        {
            let mut cache = GeocodeCache::load_from(path.clone(), DEFAULT_TTL_DAYS);
            cache.put("London", Coordinate::new(51.5074, -0.1278));
        }
        let reloaded = GeocodeCache::load_from(path, DEFAULT_TTL_DAYS);
        assert_eq!(reloaded.get("london"), Some(Coordinate::new(51.5074, -0.1278)));
    }

    #[test]
    fn test_expired_entry_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let stale = r#"{
            "paris": {"lat": 48.8566, "lon": 2.3522, "query": "Paris", "timestamp": 0}
        }"#;
        fs::write(&path, stale).unwrap();
        let cache = GeocodeCache::load_from(path, DEFAULT_TTL_DAYS);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("paris").is_none());
    }

    #[test]
    fn test_put_drops_expired() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"old": {"lat": 0, "lon": 0, "query": "old", "timestamp": 0}}"#).unwrap();
        let mut cache = GeocodeCache::load_from(path, DEFAULT_TTL_DAYS);
        cache.put("new", Coordinate::new(1.0, 1.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_extreme_timestamp_is_expired() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let entry = format!(r#"{{"accra": {{"lat": 5.6, "lon": -0.2, "query": "Accra", "timestamp": {}}}}}"#, i64::MIN);
        fs::write(&path, entry).unwrap();
        let mut cache = GeocodeCache::load_from(path, DEFAULT_TTL_DAYS);
        assert!(cache.get("accra").is_none());
        cache.put("london", Coordinate::new(51.5, -0.1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "not json").unwrap();
        assert!(GeocodeCache::load_from(path, DEFAULT_TTL_DAYS).is_empty());
    }
}
