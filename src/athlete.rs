use log::info;
use serde::Serialize;

use crate::api::BiathlonApi;
use crate::model::{AthleteBio, AthleteRaceResult, Competition, Event, RaceResult};
use crate::parse::rank_position;
use crate::status::parse_start_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AthleteSummary {
    pub races: usize,
    pub wins: usize,
    pub podiums: usize,
    pub top10: usize,
}

impl AthleteSummary {
    pub fn from_results(results: &[AthleteRaceResult]) -> Self {
        let mut summary = Self {
            races: results.len(),
            ..Self::default()
        };
        for position in results.iter().filter_map(|r| rank_position(&r.rank)) {
            if position == 1 {
                summary.wins += 1;
            }
            if position <= 3 {
                summary.podiums += 1;
            }
            if position <= 10 {
                summary.top10 += 1;
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AthleteProfile {
    pub bio: AthleteBio,
    pub results: Vec<AthleteRaceResult>,
    pub summary: AthleteSummary,
}

/// Oldest first. A competition whose results cannot be fetched is skipped.
pub fn fetch_athlete_results(
    api: &BiathlonApi,
    ibu_id: &str,
    season: &str,
) -> Vec<AthleteRaceResult> {
    let events = api.events(season);
    let mut matched = Vec::new();
    let mut scanned = 0usize;

    for event in &events {
        for competition in api.competitions(&event.event_id) {
            scanned += 1;
            let results = api.results(&competition.race_id);
            matched.extend(
                results
                    .iter()
                    .filter(|row| row.ibu_id == ibu_id)
                    .map(|row| denormalize(event, &competition, row)),
            );
        }
    }

    sort_by_date(&mut matched);
    info!(
        "{ibu_id}: {} results across {} events / {scanned} competitions in season {season}",
        matched.len(),
        events.len()
    );
    matched
}

/// `None` when the biography is unavailable.
pub fn fetch_athlete_profile(
    api: &BiathlonApi,
    ibu_id: &str,
    season: &str,
) -> Option<AthleteProfile> {
    let bio = api.athlete_bio(ibu_id)?;
    let results = fetch_athlete_results(api, ibu_id, season);
    let summary = AthleteSummary::from_results(&results);
    Some(AthleteProfile {
        bio,
        results,
        summary,
    })
}

fn denormalize(event: &Event, competition: &Competition, row: &RaceResult) -> AthleteRaceResult {
    let event_id = if competition.event_id.is_empty() {
        event.event_id.clone()
    } else {
        competition.event_id.clone()
    };
    AthleteRaceResult {
        race_id: competition.race_id.clone(),
        event_id,
        competition_name: competition.name().to_string(),
        location: event.location().to_string(),
        date: competition.start_time.clone(),
        rank: row.rank.clone(),
        shooting_total: row.shooting_total.clone(),
        total_time: row.total_time.clone(),
        behind: row.behind.clone(),
    }
}

// Unparseable dates keep their relative order at the end.
fn sort_by_date(results: &mut [AthleteRaceResult]) {
    results.sort_by_key(|r| {
        let start = parse_start_time(&r.date);
        (start.is_none(), start)
    });
}
