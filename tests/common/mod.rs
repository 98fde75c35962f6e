#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use biathlon_tracker::api::BiathlonApi;
use biathlon_tracker::cache::{CachedSource, ManualClock, MemoryCache};
use biathlon_tracker::fetch::{FetchError, JsonSource};

pub const BASE: &str = "https://fixtures.test/api";

pub fn read_fixture(name: &str) -> Value {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    serde_json::from_str(&raw).expect("fixture should be valid json")
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
        .single()
        .expect("valid timestamp")
}

/// Canned responses keyed by URL. Unknown URLs answer http 404.
#[derive(Default)]
pub struct FixtureSource {
    responses: Mutex<HashMap<String, Result<Value, FetchError>>>,
    calls: Mutex<Vec<String>>,
}

impl FixtureSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: impl Into<String>, body: Value) {
        self.responses.lock().unwrap().insert(url.into(), Ok(body));
    }

    pub fn respond_fixture(&self, url: impl Into<String>, fixture: &str) {
        self.respond(url, read_fixture(fixture));
    }

    pub fn fail(&self, url: impl Into<String>, err: FetchError) {
        self.responses.lock().unwrap().insert(url.into(), Err(err));
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl JsonSource for FixtureSource {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}

pub fn cached_source(source: Arc<FixtureSource>, clock: Arc<ManualClock>) -> CachedSource {
    CachedSource::new(source, Arc::new(MemoryCache::new()), clock)
}

pub fn api_with(source: Arc<FixtureSource>, clock: Arc<ManualClock>) -> BiathlonApi {
    BiathlonApi::new(BASE, cached_source(source, clock)).with_fetch_parallelism(3)
}

pub fn url(path: &str) -> String {
    format!("{BASE}/{path}")
}

/// Season 2526 calendar: three stages, their races and results.
pub fn season_source() -> Arc<FixtureSource> {
    let source = FixtureSource::new();
    source.respond_fixture(url("Events?SeasonId=2526&Level=1"), "events_2526.json");
    source.respond_fixture(
        url("Competitions?EventId=BT2526SWRLCP01"),
        "competitions_cp01.json",
    );
    source.respond_fixture(
        url("Competitions?EventId=BT2526SWRLCP02"),
        "competitions_cp02.json",
    );
    source.respond_fixture(
        url("Competitions?EventId=BT2526SWRLCP03"),
        "competitions_cp03.json",
    );
    source.respond_fixture(
        url("Results?RaceId=BT2526SWRLCP01SMSP"),
        "results_cp01_smsp.json",
    );
    source.respond_fixture(
        url("Results?RaceId=BT2526SWRLCP02SMSP"),
        "results_cp02_smsp.json",
    );
    source.fail(
        url("Results?RaceId=BT2526SWRLCP03SMSP"),
        FetchError::Transport("connection reset".to_string()),
    );
    source
}

/// Analytic feeds of the Oestersund men's sprint. Types not registered here
/// answer 404, RNG1 answers with an empty list.
pub fn register_sprint_analytics(source: &FixtureSource) {
    let race = "BT2526SWRLCP01SMSP";
    let analytic = |type_id: &str| url(&format!("AnalyticResults?RaceId={race}&TypeId={type_id}"));
    source.respond_fixture(analytic("S1TM"), "analytic_s1tm.json");
    source.respond_fixture(analytic("S2TM"), "analytic_s2tm.json");
    source.respond_fixture(analytic("STTM"), "analytic_sttm.json");
    source.respond_fixture(analytic("RNGT"), "analytic_rngt.json");
    source.respond_fixture(analytic("RNG1"), "analytic_empty.json");
}
