use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{CacheCategory, CacheStore, CachedResponse};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "biathlon_tracker";
const CACHE_FILE: &str = "http_cache.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct HttpCacheFile {
    version: u32,
    entries: HashMap<String, DiskEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DiskEntry {
    body: Value,
    fetched_at_ms: i64,
}

/// Response cache persisted as a single JSON file, so TTLs survive restarts.
#[derive(Debug)]
pub struct DiskCache {
    path: PathBuf,
    state: Mutex<Option<HttpCacheFile>>,
}

impl DiskCache {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    pub fn in_default_location() -> Option<Self> {
        app_cache_dir().map(|dir| Self::at(dir.join(CACHE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_file<T>(&self, action: impl FnOnce(&mut HttpCacheFile) -> T) -> T {
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let cache = guard.get_or_insert_with(|| load_cache_file(&self.path));
        action(cache)
    }
}

impl CacheStore for DiskCache {
    fn get(&self, key: &str) -> Option<CachedResponse> {
        self.with_file(|cache| {
            let entry = cache.entries.get(key)?;
            let fetched_at = DateTime::<Utc>::from_timestamp_millis(entry.fetched_at_ms)?;
            Some(CachedResponse {
                body: entry.body.clone(),
                fetched_at,
            })
        })
    }

    fn put(&self, key: &str, entry: CachedResponse) {
        let result = self.with_file(|cache| {
            cache.version = CACHE_VERSION;
            let newest_ms = entry.fetched_at.timestamp_millis();
            let max_age_ms = max_entry_age_ms();
            cache
                .entries
                .retain(|_, kept| newest_ms - kept.fetched_at_ms < max_age_ms);
            cache.entries.insert(
                key.to_string(),
                DiskEntry {
                    body: entry.body,
                    fetched_at_ms: entry.fetched_at.timestamp_millis(),
                },
            );
            save_cache_file(&self.path, cache)
        });
        if let Err(err) = result {
            warn!("http cache not persisted to {}: {err:#}", self.path.display());
        }
    }
}

// Past the longest TTL an entry can never be served again.
fn max_entry_age_ms() -> i64 {
    CacheCategory::AthleteBio.ttl().num_milliseconds()
}

fn load_cache_file(path: &Path) -> HttpCacheFile {
    let Ok(raw) = fs::read_to_string(path) else {
        return HttpCacheFile::default();
    };
    let cache = serde_json::from_str::<HttpCacheFile>(&raw).unwrap_or_default();
    if cache.version != CACHE_VERSION {
        return HttpCacheFile::default();
    }
    cache
}

fn save_cache_file(path: &Path, cache: &HttpCacheFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok();
    }
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(cache).context("serialize http cache")?;
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, path).context("swap http cache")?;
    Ok(())
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;

    #[test]
    fn entries_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CACHE_FILE);
        let fetched_at = Utc.with_ymd_and_hms(2026, 1, 10, 9, 30, 0).unwrap();

        let cache = DiskCache::at(&path);
        cache.put(
            "https://api/Events?SeasonId=2526&Level=1",
            CachedResponse {
                body: json!([{"EventId": "BT2526SWRLCP01"}]),
                fetched_at,
            },
        );
        assert!(path.exists());

        let reopened = DiskCache::at(&path);
        let entry = reopened
            .get("https://api/Events?SeasonId=2526&Level=1")
            .expect("entry persisted");
        assert_eq!(entry.fetched_at, fetched_at);
        assert_eq!(entry.body[0]["EventId"], "BT2526SWRLCP01");
        assert!(reopened.get("https://api/other").is_none());
    }

    #[test]
    fn writes_drop_entries_past_the_longest_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILE);
        let t0 = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
        let response = |fetched_at| CachedResponse {
            body: json!({"Results": []}),
            fetched_at,
        };

        let cache = DiskCache::at(&path);
        assert_eq!(cache.path(), path.as_path());
        cache.put("https://api/CISBios?IBUId=OLD", response(t0));
        cache.put(
            "https://api/CISBios?IBUId=RECENT",
            response(t0 + TimeDelta::hours(1)),
        );
        cache.put(
            "https://api/Events?SeasonId=2526&Level=1",
            response(t0 + TimeDelta::hours(24)),
        );

        assert!(cache.get("https://api/CISBios?IBUId=OLD").is_none());
        assert!(cache.get("https://api/CISBios?IBUId=RECENT").is_some());

        let reopened = DiskCache::at(&path);
        assert!(reopened.get("https://api/CISBios?IBUId=OLD").is_none());
        assert!(reopened.get("https://api/CISBios?IBUId=RECENT").is_some());
        assert!(
            reopened
                .get("https://api/Events?SeasonId=2526&Level=1")
                .is_some()
        );
    }

    #[test]
    fn version_mismatch_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILE);
        fs::write(
            &path,
            r#"{"version":99,"entries":{"k":{"body":null,"fetched_at_ms":0}}}"#,
        )
        .unwrap();
        assert!(DiskCache::at(&path).get("k").is_none());

        fs::write(&path, "not json").unwrap();
        assert!(DiskCache::at(&path).get("k").is_none());
    }
}
