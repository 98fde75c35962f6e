use std::collections::HashMap;
use std::fmt;

use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::api::BiathlonApi;
use crate::model::{AthleteId, RaceResult};
use crate::parse::{pick_string, pick_u32, rank_position};

pub const MAX_COURSE_LEGS: usize = 5;
pub const MAX_LAPS: usize = 12;
pub const MAX_STAGES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MetricCode {
    CourseTime(u8),
    LapTime(u8),
    ShootingTime(u8),
    RangeTime(u8),
    ShootingTotal,
    RangeTotal,
    CourseTotal,
    SkiTotal,
}

use MetricCode::*;

pub const RANGE_ANALYSIS: &[MetricCode] = &[
    ShootingTime(1),
    ShootingTime(2),
    ShootingTime(3),
    ShootingTime(4),
    ShootingTotal,
    RangeTime(1),
    RangeTime(2),
    RangeTime(3),
    RangeTime(4),
    RangeTotal,
];

pub const COURSE_ANALYSIS: &[MetricCode] = &[
    CourseTime(1),
    CourseTime(2),
    CourseTime(3),
    CourseTime(4),
    CourseTime(5),
    LapTime(1),
    LapTime(2),
    LapTime(3),
    LapTime(4),
    LapTime(5),
    LapTime(6),
    LapTime(7),
    LapTime(8),
    LapTime(9),
    LapTime(10),
    LapTime(11),
    LapTime(12),
    CourseTotal,
    SkiTotal,
];

impl MetricCode {
    /// Parses an upstream `TypeId`. Legs outside the known ranges are rejected.
    pub fn parse(type_id: &str) -> Option<Self> {
        let id = type_id.trim().to_ascii_uppercase();
        match id.as_str() {
            "STTM" => return Some(ShootingTotal),
            "RNGT" => return Some(RangeTotal),
            "CRST" => return Some(CourseTotal),
            "SKIT" => return Some(SkiTotal),
            _ => {}
        }
        let code = if let Some(leg) = id.strip_prefix("CRST") {
            CourseTime(parse_leg(leg, MAX_COURSE_LEGS)?)
        } else if let Some(leg) = id.strip_prefix("CRS") {
            LapTime(parse_leg(leg, MAX_LAPS)?)
        } else if let Some(leg) = id.strip_prefix("RNG") {
            RangeTime(parse_leg(leg, MAX_STAGES)?)
        } else if let Some(rest) = id.strip_prefix('S') {
            ShootingTime(parse_leg(rest.strip_suffix("TM")?, MAX_STAGES)?)
        } else {
            return None;
        };
        Some(code)
    }

    pub fn type_id(self) -> String {
        match self {
            CourseTime(n) => format!("CRST{n}"),
            LapTime(n) => format!("CRS{n}"),
            ShootingTime(n) => format!("S{n}TM"),
            RangeTime(n) => format!("RNG{n}"),
            ShootingTotal => "STTM".to_string(),
            RangeTotal => "RNGT".to_string(),
            CourseTotal => "CRST".to_string(),
            SkiTotal => "SKIT".to_string(),
        }
    }
}

impl fmt::Display for MetricCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_id())
    }
}

fn parse_leg(raw: &str, max: usize) -> Option<u8> {
    let leg = raw.parse::<u8>().ok()?;
    (1..=max).contains(&usize::from(leg)).then_some(leg)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompositeAthleteRecord {
    pub ibu_id: AthleteId,
    pub bib: Option<u32>,
    pub family_name: String,
    pub given_name: String,
    pub nat: String,
    pub course_times: [Option<String>; MAX_COURSE_LEGS],
    pub lap_times: [Option<String>; MAX_LAPS],
    pub shooting_times: [Option<String>; MAX_STAGES],
    pub range_times: [Option<String>; MAX_STAGES],
    pub shooting_total_time: Option<String>,
    pub range_total_time: Option<String>,
    pub course_total_time: Option<String>,
    pub ski_total_time: Option<String>,
    // From the base results, not the analytic feeds.
    pub rank: Option<String>,
    pub misses_total: Option<String>,
    pub misses_by_stage: Option<String>,
}

impl CompositeAthleteRecord {
    fn new(ibu_id: &str) -> Self {
        Self {
            ibu_id: ibu_id.to_string(),
            ..Self::default()
        }
    }

    pub fn metric(&self, code: MetricCode) -> Option<&str> {
        match code {
            CourseTime(n) => leg(&self.course_times, n),
            LapTime(n) => leg(&self.lap_times, n),
            ShootingTime(n) => leg(&self.shooting_times, n),
            RangeTime(n) => leg(&self.range_times, n),
            ShootingTotal => self.shooting_total_time.as_deref(),
            RangeTotal => self.range_total_time.as_deref(),
            CourseTotal => self.course_total_time.as_deref(),
            SkiTotal => self.ski_total_time.as_deref(),
        }
    }

    fn slot_mut(&mut self, code: MetricCode) -> Option<&mut Option<String>> {
        match code {
            CourseTime(n) => leg_mut(&mut self.course_times, n),
            LapTime(n) => leg_mut(&mut self.lap_times, n),
            ShootingTime(n) => leg_mut(&mut self.shooting_times, n),
            RangeTime(n) => leg_mut(&mut self.range_times, n),
            ShootingTotal => Some(&mut self.shooting_total_time),
            RangeTotal => Some(&mut self.range_total_time),
            CourseTotal => Some(&mut self.course_total_time),
            SkiTotal => Some(&mut self.ski_total_time),
        }
    }

    fn absorb_identity(&mut self, row: &MetricRow) {
        if self.bib.is_none() {
            self.bib = row.bib;
        }
        fill_if_empty(&mut self.family_name, row.family_name.as_deref());
        fill_if_empty(&mut self.given_name, row.given_name.as_deref());
        fill_if_empty(&mut self.nat, row.nat.as_deref());
    }
}

fn leg<const N: usize>(slots: &[Option<String>; N], n: u8) -> Option<&str> {
    let idx = usize::from(n).checked_sub(1)?;
    slots.get(idx)?.as_deref()
}

fn leg_mut<const N: usize>(slots: &mut [Option<String>; N], n: u8) -> Option<&mut Option<String>> {
    let idx = usize::from(n).checked_sub(1)?;
    slots.get_mut(idx)
}

fn fill_if_empty(target: &mut String, value: Option<&str>) {
    if !target.is_empty() {
        return;
    }
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *target = value.to_string();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub ibu_id: AthleteId,
    pub bib: Option<u32>,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub nat: Option<String>,
    pub value: Option<String>,
}

impl MetricRow {
    pub fn from_value(row: &Value) -> Option<Self> {
        Some(Self {
            ibu_id: pick_string(row, &["IBUId", "IbuId"])?,
            bib: pick_u32(row, &["Bib"]),
            family_name: pick_string(row, &["FamilyName"]),
            given_name: pick_string(row, &["GivenName"]),
            nat: pick_string(row, &["Nat"]),
            value: pick_string(row, &["Result", "Value", "TotalTime", "Time"]),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricResultSet {
    pub code: MetricCode,
    pub rows: Vec<MetricRow>,
}

impl MetricResultSet {
    pub fn from_raw(code: MetricCode, rows: &[Value]) -> Self {
        Self {
            code,
            rows: rows.iter().filter_map(MetricRow::from_value).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceAnalysis {
    pub race_id: String,
    /// Metric types that returned at least one row, in request order.
    pub available: Vec<MetricCode>,
    pub athletes: HashMap<AthleteId, CompositeAthleteRecord>,
}

impl RaceAnalysis {
    pub fn athlete(&self, ibu_id: &str) -> Option<&CompositeAthleteRecord> {
        self.athletes.get(ibu_id)
    }

    pub fn has_metric(&self, code: MetricCode) -> bool {
        self.available.contains(&code)
    }

    // unranked last
    pub fn athletes_by_rank(&self) -> Vec<&CompositeAthleteRecord> {
        let mut athletes: Vec<_> = self.athletes.values().collect();
        athletes.sort_by(|a, b| {
            let key = |r: &CompositeAthleteRecord| {
                (
                    r.rank.as_deref().and_then(rank_position).unwrap_or(u32::MAX),
                    r.bib.unwrap_or(u32::MAX),
                )
            };
            key(a).cmp(&key(b)).then_with(|| a.ibu_id.cmp(&b.ibu_id))
        });
        athletes
    }
}

/// `None` only when every set is empty.
pub fn fold_metric_sets(
    sets: &[MetricResultSet],
) -> Option<(Vec<MetricCode>, HashMap<AthleteId, CompositeAthleteRecord>)> {
    let available: Vec<MetricCode> = sets
        .iter()
        .filter(|set| !set.rows.is_empty())
        .map(|set| set.code)
        .collect();
    if available.is_empty() {
        return None;
    }

    let mut athletes: HashMap<AthleteId, CompositeAthleteRecord> = HashMap::new();
    for set in sets {
        for row in &set.rows {
            let record = athletes
                .entry(row.ibu_id.clone())
                .or_insert_with(|| CompositeAthleteRecord::new(&row.ibu_id));
            record.absorb_identity(row);
            if let (Some(slot), Some(value)) = (record.slot_mut(set.code), row.value.as_ref()) {
                *slot = Some(value.clone());
            }
        }
    }
    Some((available, athletes))
}

// Athletes without analytic rows are not added.
pub fn enrich_with_results(
    athletes: &mut HashMap<AthleteId, CompositeAthleteRecord>,
    results: &[RaceResult],
) {
    for result in results {
        let Some(record) = athletes.get_mut(&result.ibu_id) else {
            continue;
        };
        if !result.rank.is_empty() {
            record.rank = Some(result.rank.clone());
        }
        if result.shooting_total.is_some() {
            record.misses_total.clone_from(&result.shooting_total);
        }
        if let Some(stages) = misses_by_stage(result) {
            record.misses_by_stage = Some(stages);
        }
        if record.bib.is_none() {
            record.bib = result.bib;
        }
        fill_if_empty(&mut record.family_name, Some(&result.family_name));
        fill_if_empty(&mut record.given_name, Some(&result.given_name));
        fill_if_empty(&mut record.nat, Some(&result.nat));
    }
}

pub fn misses_by_stage(result: &RaceResult) -> Option<String> {
    if let Some(stages) = result.shootings.as_ref().filter(|s| !s.is_empty()) {
        return Some(stages.clone());
    }
    match (result.shooting_prone, result.shooting_standing) {
        (Some(prone), Some(standing)) => Some(format!("{prone}+{standing}")),
        _ => None,
    }
}

pub fn fetch_race_analysis(
    api: &BiathlonApi,
    race_id: &str,
    codes: &[MetricCode],
) -> Option<RaceAnalysis> {
    let sets: Vec<MetricResultSet> = with_fetch_pool(api.fetch_parallelism(), || {
        codes
            .par_iter()
            .map(|code| {
                let rows = api.analytic_results(race_id, &code.type_id());
                MetricResultSet::from_raw(*code, &rows)
            })
            .collect()
    });

    let Some((available, mut athletes)) = fold_metric_sets(&sets) else {
        info!("{race_id}: no analytic data across {} metric types", codes.len());
        return None;
    };

    let results = api.results(race_id);
    enrich_with_results(&mut athletes, &results);
    info!(
        "{race_id}: merged {} athletes from {}/{} metric types",
        athletes.len(),
        available.len(),
        codes.len()
    );

    Some(RaceAnalysis {
        race_id: race_id.to_string(),
        available,
        athletes,
    })
}

/// Analysis over upstream type ids such as `S1TM` or `CRS3`. Unknown ids are
/// skipped with a warning; `None` when none is known.
pub fn fetch_metric_analysis(
    api: &BiathlonApi,
    race_id: &str,
    type_ids: &[&str],
) -> Option<RaceAnalysis> {
    let mut codes: Vec<MetricCode> = Vec::new();
    for raw in type_ids {
        match MetricCode::parse(raw) {
            Some(code) if !codes.contains(&code) => codes.push(code),
            Some(_) => {}
            None => warn!("{race_id}: unknown metric type '{raw}'"),
        }
    }
    if codes.is_empty() {
        return None;
    }
    fetch_race_analysis(api, race_id, &codes)
}

pub fn fetch_range_analysis(api: &BiathlonApi, race_id: &str) -> Option<RaceAnalysis> {
    fetch_race_analysis(api, race_id, RANGE_ANALYSIS)
}

pub fn fetch_course_analysis(api: &BiathlonApi, race_id: &str) -> Option<RaceAnalysis> {
    fetch_race_analysis(api, race_id, COURSE_ANALYSIS)
}

fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
