use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analytics::{RaceAnalysis, fetch_course_analysis, fetch_range_analysis};
use crate::api::BiathlonApi;
use crate::model::{Competition, Event, RaceResult};
use crate::status::{RaceStatus, active_event, competition_status, next_event};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledCompetition {
    pub competition: Competition,
    /// `None` when the start time cannot be read.
    pub status: Option<RaceStatus>,
}

impl ScheduledCompetition {
    pub fn at(competition: Competition, now: DateTime<Utc>) -> Self {
        let status = competition_status(&competition, now);
        Self {
            competition,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub season: String,
    pub total_events: usize,
    pub active_event: Option<Event>,
    pub competitions: Vec<ScheduledCompetition>,
    pub live_competitions: usize,
    /// Only looked up when no stage is running.
    pub next_event: Option<Event>,
}

pub fn fetch_dashboard(api: &BiathlonApi, season: &str) -> Dashboard {
    let events = api.events(season);
    let now = api.now();

    let active = active_event(&events, now).cloned();
    let competitions: Vec<ScheduledCompetition> = match &active {
        Some(event) => api
            .competitions(&event.event_id)
            .into_iter()
            .map(|c| ScheduledCompetition::at(c, now))
            .collect(),
        None => Vec::new(),
    };
    let next = match active {
        Some(_) => None,
        None => next_event(&events, now).cloned(),
    };
    let live_competitions = competitions
        .iter()
        .filter(|c| c.status == Some(RaceStatus::Live))
        .count();

    Dashboard {
        season: season.to_string(),
        total_events: events.len(),
        active_event: active,
        competitions,
        live_competitions,
        next_event: next,
    }
}

pub fn fetch_event_schedule(api: &BiathlonApi, event_id: &str) -> Vec<ScheduledCompetition> {
    let now = api.now();
    api.competitions(event_id)
        .into_iter()
        .map(|c| ScheduledCompetition::at(c, now))
        .collect()
}

/// Everything known about one race: schedule entry, results, both analyses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceOverview {
    pub event: Option<Event>,
    pub competition: ScheduledCompetition,
    pub results: Vec<RaceResult>,
    pub range_analysis: Option<RaceAnalysis>,
    pub course_analysis: Option<RaceAnalysis>,
}

/// `None` when the race is not listed under the event.
pub fn fetch_race_overview(
    api: &BiathlonApi,
    season: &str,
    event_id: &str,
    race_id: &str,
) -> Option<RaceOverview> {
    let now = api.now();
    let competition = api
        .competitions(event_id)
        .into_iter()
        .find(|c| c.race_id == race_id)?;
    let event = api
        .events(season)
        .into_iter()
        .find(|e| e.event_id == event_id);
    let competition = ScheduledCompetition::at(competition, now);

    let started = competition.status != Some(RaceStatus::Upcoming);
    let (range_analysis, course_analysis) = if started {
        (
            fetch_range_analysis(api, race_id),
            fetch_course_analysis(api, race_id),
        )
    } else {
        (None, None)
    };
    let results = race_results(api, race_id, started);

    Some(RaceOverview {
        event,
        results,
        competition,
        range_analysis,
        course_analysis,
    })
}

// The results list can lag behind the race record once a race has started.
fn race_results(api: &BiathlonApi, race_id: &str, started: bool) -> Vec<RaceResult> {
    let results = api.results(race_id);
    if !results.is_empty() || !started {
        return results;
    }
    api.race_details(race_id)
        .map(|details| details.results)
        .unwrap_or_default()
}

/// Event id a race belongs to: the race id minus its four-character suffix.
pub fn event_id_of_race(race_id: &str) -> Option<&str> {
    let cut = race_id.len().checked_sub(4)?;
    race_id.get(..cut).filter(|id| !id.is_empty())
}
