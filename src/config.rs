use std::env;
use std::time::Duration;

use log::LevelFilter;

pub const DEFAULT_API_BASE: &str = "https://biathlonresults.com/modules/sportapi/api";
pub const DEFAULT_SEASON: &str = "2526";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PARALLELISM: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Disk,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub season: String,
    pub http_timeout: Duration,
    pub fetch_parallelism: usize,
    pub log_level: LevelFilter,
    pub cache_backend: CacheBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            season: DEFAULT_SEASON.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fetch_parallelism: DEFAULT_PARALLELISM,
            log_level: LevelFilter::Info,
            cache_backend: CacheBackend::Memory,
        }
    }
}

impl Config {
    /// Reads the process environment (after merging `.env`), falling back to
    /// defaults for anything missing or malformed.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_base = lookup("BIATHLON_API_BASE")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.api_base);
        let season = lookup("BIATHLON_SEASON")
            .map(|v| v.trim().to_string())
            .filter(|v| v.len() == 4 && v.chars().all(|c| c.is_ascii_digit()))
            .unwrap_or(defaults.season);
        let timeout_secs = lookup("HTTP_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);
        let fetch_parallelism = lookup("FETCH_PARALLELISM")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_PARALLELISM)
            .clamp(2, 32);
        let log_level = lookup("LOG_LEVEL")
            .map(|v| parse_level(&v))
            .unwrap_or(defaults.log_level);
        let cache_backend = match lookup("BIATHLON_CACHE").as_deref().map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("disk") => CacheBackend::Disk,
            _ => CacheBackend::Memory,
        };

        Self {
            api_base,
            season,
            http_timeout: Duration::from_secs(timeout_secs),
            fetch_parallelism,
            log_level,
            cache_backend,
        }
    }
}

fn parse_level(raw: &str) -> LevelFilter {
    match raw.trim().to_ascii_uppercase().as_str() {
        "OFF" => LevelFilter::Off,
        "ERROR" => LevelFilter::Error,
        "WARN" => LevelFilter::Warn,
        "DEBUG" => LevelFilter::Debug,
        "TRACE" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}
