use serde::{Deserialize, Serialize};

use crate::parse::{string_or_default, string_or_none, u32_or_none, vec_or_default};

pub type AthleteId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    #[serde(deserialize_with = "string_or_default")]
    pub event_id: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub season_id: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub short_description: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub organizer: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub start_date: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub end_date: String,
    #[serde(default, deserialize_with = "string_or_none")]
    pub nat: Option<String>,
    #[serde(default, rename = "UTCOffset")]
    pub utc_offset: Option<f64>,
}

impl Event {
    pub fn location(&self) -> &str {
        if self.short_description.is_empty() {
            &self.description
        } else {
            &self.short_description
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    #[serde(rename = "RaceId", deserialize_with = "string_or_default")]
    pub race_id: String,
    #[serde(rename = "EventId", default, deserialize_with = "string_or_default")]
    pub event_id: String,
    #[serde(rename = "catId", default, deserialize_with = "string_or_default")]
    pub category: String,
    #[serde(rename = "DisciplineId", default, deserialize_with = "string_or_default")]
    pub discipline: String,
    #[serde(
        rename = "ShortDescription",
        alias = "Short",
        default,
        deserialize_with = "string_or_default"
    )]
    pub short_description: String,
    #[serde(rename = "Description", default, deserialize_with = "string_or_default")]
    pub description: String,
    #[serde(rename = "StartTime", default, deserialize_with = "string_or_default")]
    pub start_time: String,
    #[serde(rename = "km", default)]
    pub km: Option<f64>,
    #[serde(
        rename = "StatusText",
        alias = "Status",
        default,
        deserialize_with = "string_or_none"
    )]
    pub status_text: Option<String>,
}

impl Competition {
    pub fn name(&self) -> &str {
        if self.description.is_empty() {
            &self.short_description
        } else {
            &self.description
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaceResult {
    #[serde(rename = "IBUId", default, deserialize_with = "string_or_default")]
    pub ibu_id: AthleteId,
    #[serde(default, deserialize_with = "string_or_default")]
    pub family_name: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub given_name: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub nat: String,
    #[serde(default, deserialize_with = "u32_or_none")]
    pub bib: Option<u32>,
    /// Kept as the upstream label: a number, or a status like `DNF`.
    #[serde(default, deserialize_with = "string_or_default")]
    pub rank: String,
    #[serde(default, deserialize_with = "string_or_none")]
    pub shooting_total: Option<String>,
    /// Per-stage misses, e.g. `"0+1+0+0"`.
    #[serde(default, deserialize_with = "string_or_none")]
    pub shootings: Option<String>,
    #[serde(default, deserialize_with = "u32_or_none")]
    pub shooting_prone: Option<u32>,
    #[serde(default, deserialize_with = "u32_or_none")]
    pub shooting_standing: Option<u32>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub total_time: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub behind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaceDetails {
    #[serde(default, deserialize_with = "string_or_default")]
    pub race_id: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub event_id: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub start_time: String,
    #[serde(default, deserialize_with = "string_or_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "vec_or_default")]
    pub results: Vec<RaceResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AthleteBio {
    #[serde(rename = "IBUId", default, deserialize_with = "string_or_default")]
    pub ibu_id: AthleteId,
    #[serde(default, deserialize_with = "string_or_default")]
    pub family_name: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub given_name: String,
    #[serde(default, deserialize_with = "string_or_default")]
    pub nat: String,
    #[serde(default, deserialize_with = "string_or_none")]
    pub nat_long: Option<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    pub birthdate: Option<String>,
}

impl AthleteBio {
    pub fn nation_label(&self) -> &str {
        self.nat_long.as_deref().unwrap_or(&self.nat)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AthleteRaceResult {
    pub race_id: String,
    pub event_id: String,
    pub competition_name: String,
    pub location: String,
    pub date: String,
    pub rank: String,
    pub shooting_total: Option<String>,
    pub total_time: Option<String>,
    pub behind: Option<String>,
}
