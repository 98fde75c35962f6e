use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{CacheCategory, CacheStore, CachedSource, Clock, MemoryCache, SystemClock};
use crate::config::{CacheBackend, Config};
use crate::fetch::{Fetched, HttpSource, JsonSource};
use crate::http_cache::DiskCache;
use crate::model::{AthleteBio, Competition, Event, RaceDetails, RaceResult};

const WORLD_CUP_LEVEL: u32 = 1;

pub fn events_url(base: &str, season: &str) -> String {
    format!("{base}/Events?SeasonId={season}&Level={WORLD_CUP_LEVEL}")
}

pub fn competitions_url(base: &str, event_id: &str) -> String {
    format!("{base}/Competitions?EventId={event_id}")
}

pub fn results_url(base: &str, race_id: &str) -> String {
    format!("{base}/Results?RaceId={race_id}")
}

pub fn race_details_url(base: &str, race_id: &str) -> String {
    format!("{base}/RaceDetails?RaceId={race_id}")
}

pub fn analytic_results_url(base: &str, race_id: &str, type_id: &str) -> String {
    format!("{base}/AnalyticResults?RaceId={race_id}&TypeId={type_id}")
}

pub fn athlete_bio_url(base: &str, ibu_id: &str) -> String {
    format!("{base}/CISBios?IBUId={ibu_id}")
}

pub fn cup_results_url(base: &str, cup_id: &str) -> String {
    format!("{base}/CupResults?CupId={cup_id}")
}

#[derive(Clone)]
pub struct BiathlonApi {
    base: String,
    source: CachedSource,
    fetch_parallelism: usize,
}

impl BiathlonApi {
    pub fn new(base: impl Into<String>, source: CachedSource) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            source,
            fetch_parallelism: 6,
        }
    }

    /// Live HTTP source, system clock, and the configured cache backend.
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn CacheStore> = match config.cache_backend {
            CacheBackend::Disk => match DiskCache::in_default_location() {
                Some(disk) => {
                    info!("disk cache at {}", disk.path().display());
                    Arc::new(disk)
                }
                None => {
                    warn!("no cache directory available, falling back to memory cache");
                    Arc::new(MemoryCache::new())
                }
            },
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
        };
        let source: Arc<dyn JsonSource> = Arc::new(HttpSource::new(config.http_timeout));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self::new(&config.api_base, CachedSource::new(source, store, clock))
            .with_fetch_parallelism(config.fetch_parallelism)
    }

    pub fn with_fetch_parallelism(mut self, threads: usize) -> Self {
        self.fetch_parallelism = threads.max(1);
        self
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn fetch_parallelism(&self) -> usize {
        self.fetch_parallelism
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.source.now()
    }

    pub fn events(&self, season: &str) -> Vec<Event> {
        let url = events_url(&self.base, season);
        self.fetch_list(CacheCategory::Events, &url, None)
    }

    pub fn competitions(&self, event_id: &str) -> Vec<Competition> {
        let url = competitions_url(&self.base, event_id);
        self.fetch_list(CacheCategory::Competitions, &url, None)
    }

    pub fn results(&self, race_id: &str) -> Vec<RaceResult> {
        let url = results_url(&self.base, race_id);
        self.fetch_list(CacheCategory::Results, &url, Some("Results"))
    }

    pub fn race_details(&self, race_id: &str) -> Option<RaceDetails> {
        let url = race_details_url(&self.base, race_id);
        self.fetch_record(CacheCategory::RaceDetails, &url)
    }

    pub fn analytic_results(&self, race_id: &str, type_id: &str) -> Vec<Value> {
        let url = analytic_results_url(&self.base, race_id, type_id);
        match self.source.fetch(CacheCategory::Analytics, &url) {
            Fetched::Data(body) => list_items(body, Some("Results")),
            Fetched::Empty => Vec::new(),
        }
    }

    pub fn athlete_bio(&self, ibu_id: &str) -> Option<AthleteBio> {
        let url = athlete_bio_url(&self.base, ibu_id);
        self.fetch_record(CacheCategory::AthleteBio, &url)
    }

    pub fn standings_raw(&self, cup_id: &str) -> Option<Value> {
        let url = cup_results_url(&self.base, cup_id);
        self.source
            .fetch(CacheCategory::Standings, &url)
            .into_option()
            .filter(|body| !body.is_null())
    }

    fn fetch_list<T: DeserializeOwned>(
        &self,
        category: CacheCategory,
        url: &str,
        field: Option<&str>,
    ) -> Vec<T> {
        let Fetched::Data(body) = self.source.fetch(category, url) else {
            return Vec::new();
        };
        let items = list_items(body, field);
        let total = items.len();
        let parsed: Vec<T> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        if parsed.len() < total {
            debug!("{url}: dropped {} unparseable rows", total - parsed.len());
        }
        parsed
    }

    fn fetch_record<T: DeserializeOwned>(&self, category: CacheCategory, url: &str) -> Option<T> {
        let body = self.source.fetch(category, url).into_option()?;
        if body.is_null() {
            return None;
        }
        match serde_json::from_value(body) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("{url}: unexpected record shape: {err}");
                None
            }
        }
    }
}

/// The array under `field`, or the body itself when it is already an array.
fn list_items(body: Value, field: Option<&str>) -> Vec<Value> {
    match (body, field) {
        (Value::Array(items), _) => items,
        (Value::Object(mut map), Some(field)) => match map.remove(field) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
