use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use serde_json::Value;

use crate::fetch::{Fetched, JsonSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    Events,
    Competitions,
    Results,
    RaceDetails,
    Analytics,
    AthleteBio,
    Standings,
}

impl CacheCategory {
    pub fn ttl(self) -> TimeDelta {
        match self {
            CacheCategory::Events => TimeDelta::hours(1),
            CacheCategory::Competitions => TimeDelta::minutes(10),
            CacheCategory::Results | CacheCategory::RaceDetails | CacheCategory::Analytics => {
                TimeDelta::minutes(1)
            }
            CacheCategory::AthleteBio => TimeDelta::hours(24),
            CacheCategory::Standings => TimeDelta::hours(1),
        }
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *lock(&self.now) = now;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut guard = lock(&self.now);
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *lock(&self.now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub body: Value,
    pub fetched_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Fresh strictly before the TTL elapses; at the boundary it is stale.
    pub fn is_fresh(&self, ttl: TimeDelta, now: DateTime<Utc>) -> bool {
        now - self.fetched_at < ttl
    }
}

pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<CachedResponse>;
    fn put(&self, key: &str, entry: CachedResponse);
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CachedResponse>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<CachedResponse> {
        lock(&self.entries).get(key).cloned()
    }

    fn put(&self, key: &str, entry: CachedResponse) {
        lock(&self.entries).insert(key.to_string(), entry);
    }
}

/// A failed refetch serves [`Fetched::Empty`] and leaves the stale entry in
/// place. Failures are never cached.
#[derive(Clone)]
pub struct CachedSource {
    source: Arc<dyn JsonSource>,
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
}

impl CachedSource {
    pub fn new(
        source: Arc<dyn JsonSource>,
        store: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            store,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn fetch(&self, category: CacheCategory, url: &str) -> Fetched<Value> {
        let now = self.clock.now();
        if let Some(entry) = self.store.get(url) {
            if entry.is_fresh(category.ttl(), now) {
                debug!("cache hit ({category:?}) {url}");
                return Fetched::Data(entry.body);
            }
            debug!("cache stale ({category:?}) {url}");
        } else {
            debug!("cache miss ({category:?}) {url}");
        }

        let fetched = Fetched::from_result(url, self.source.get_json(url));
        if let Fetched::Data(body) = &fetched {
            self.store.put(
                url,
                CachedResponse {
                    body: body.clone(),
                    fetched_at: self.clock.now(),
                },
            );
        }
        fetched
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
