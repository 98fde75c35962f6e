use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::BiathlonApi;
use crate::model::AthleteId;
use crate::parse::{pick_string, rank_position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StandingsCategory {
    Men,
    Women,
}

impl StandingsCategory {
    pub fn code(self) -> &'static str {
        match self {
            StandingsCategory::Men => "SM",
            StandingsCategory::Women => "SW",
        }
    }
}

impl FromStr for StandingsCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SM" | "MEN" => Ok(StandingsCategory::Men),
            "SW" | "WOMEN" => Ok(StandingsCategory::Women),
            other => Err(format!("unknown standings category '{other}' (expected SM or SW)")),
        }
    }
}

impl fmt::Display for StandingsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

pub fn cup_id(season: &str, category: StandingsCategory) -> String {
    format!("BT{season}SWRLCP__{}TS", category.code())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsEntry {
    /// Upstream label, usually a number.
    pub rank: String,
    pub ibu_id: AthleteId,
    pub family_name: String,
    pub given_name: String,
    pub nat: String,
    pub total_score: String,
}

impl StandingsEntry {
    pub fn rank_position(&self) -> Option<u32> {
        rank_position(&self.rank)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StandingsShape {
    Rows {
        #[serde(rename = "Rows")]
        rows: Vec<Value>,
    },
    Bare(Vec<Value>),
    Results {
        #[serde(rename = "Results")]
        results: Vec<Value>,
    },
    Standings {
        #[serde(rename = "Standings")]
        standings: Vec<Value>,
    },
    Data {
        #[serde(rename = "Data")]
        data: Vec<Value>,
    },
    Unrecognized(Value),
}

impl StandingsShape {
    pub fn classify(body: Value) -> Self {
        serde_json::from_value(body.clone()).unwrap_or(StandingsShape::Unrecognized(body))
    }

    fn rows(&self) -> &[Value] {
        match self {
            StandingsShape::Rows { rows } => rows,
            StandingsShape::Bare(rows) => rows,
            StandingsShape::Results { results } => results,
            StandingsShape::Standings { standings } => standings,
            StandingsShape::Data { data } => data,
            StandingsShape::Unrecognized(_) => &[],
        }
    }
}

pub fn normalize_standings(body: Value) -> Vec<StandingsEntry> {
    let shape = StandingsShape::classify(body);
    if let StandingsShape::Unrecognized(value) = &shape {
        let kind = match value {
            Value::Object(map) => format!("object with keys {:?}", map.keys().collect::<Vec<_>>()),
            Value::Null => "null".to_string(),
            other => format!("{other}").chars().take(40).collect(),
        };
        warn!("unrecognized standings shape: {kind}");
    }
    shape.rows().iter().filter_map(normalize_entry).collect()
}

/// Rows without an athlete identifier are dropped.
fn normalize_entry(row: &Value) -> Option<StandingsEntry> {
    let ibu_id = pick_string(row, &["IBUId", "IbuId", "AthleteId"])?;
    let (family_name, given_name) = match (
        pick_string(row, &["FamilyName"]),
        pick_string(row, &["GivenName"]),
    ) {
        (Some(family), given) => (family, given.unwrap_or_default()),
        (None, _) => split_name(&pick_string(row, &["Name", "ShortName"]).unwrap_or_default()),
    };
    Some(StandingsEntry {
        rank: pick_string(row, &["Rank", "R"]).unwrap_or_default(),
        ibu_id,
        family_name,
        given_name,
        nat: pick_string(row, &["Nat", "Nation"]).unwrap_or_default(),
        total_score: pick_string(row, &["Score", "TotalScore", "Points"]).unwrap_or_default(),
    })
}

/// `"FAMILY Given"` split at the first whitespace.
pub fn split_name(full: &str) -> (String, String) {
    let trimmed = full.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((family, given)) => (family.to_string(), given.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

pub fn fetch_standings(
    api: &BiathlonApi,
    category: StandingsCategory,
    season: &str,
) -> Vec<StandingsEntry> {
    match api.standings_raw(&cup_id(season, category)) {
        Some(body) => normalize_standings(body),
        None => Vec::new(),
    }
}
