mod common;

use std::sync::Arc;

use chrono::TimeDelta;
use serde_json::Value;

use biathlon_tracker::cache::ManualClock;
use biathlon_tracker::schedule::{fetch_dashboard, fetch_event_schedule, fetch_race_overview};
use biathlon_tracker::status::{RaceStatus, classify};

use common::{api_with, register_sprint_analytics, season_source, url, utc};

#[test]
fn status_around_the_start() {
    let start = utc(2025, 12, 5, 13, 15, 0);
    let cases = [
        (-TimeDelta::seconds(1), RaceStatus::Upcoming),
        (TimeDelta::zero(), RaceStatus::Live),
        (TimeDelta::hours(1), RaceStatus::Live),
        (TimeDelta::hours(2), RaceStatus::Live),
        (TimeDelta::hours(2) + TimeDelta::seconds(1), RaceStatus::Finished),
        (TimeDelta::hours(3), RaceStatus::Finished),
    ];
    for (offset, expected) in cases {
        assert_eq!(classify(start, start + offset), expected, "offset {offset}");
    }
}

#[test]
fn dashboard_during_a_stage() {
    let clock = Arc::new(ManualClock::new(utc(2025, 12, 5, 13, 30, 0)));
    let api = api_with(season_source(), clock);

    let dashboard = fetch_dashboard(&api, "2526");
    assert_eq!(dashboard.total_events, 3);
    assert_eq!(
        dashboard.active_event.as_ref().map(|e| e.event_id.as_str()),
        Some("BT2526SWRLCP01")
    );
    let statuses: Vec<_> = dashboard.competitions.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        [Some(RaceStatus::Finished), Some(RaceStatus::Live)]
    );
    assert_eq!(dashboard.live_competitions, 1);
    assert!(dashboard.next_event.is_none());
}

#[test]
fn dashboard_between_stages_points_at_the_next_one() {
    let clock = Arc::new(ManualClock::new(utc(2025, 12, 9, 12, 0, 0)));
    let api = api_with(season_source(), clock.clone());

    let dashboard = fetch_dashboard(&api, "2526");
    assert!(dashboard.active_event.is_none());
    assert!(dashboard.competitions.is_empty());
    assert_eq!(
        dashboard.next_event.as_ref().map(|e| e.event_id.as_str()),
        Some("BT2526SWRLCP02")
    );

    // A stage stays active through the whole of its last day.
    clock.set(utc(2025, 12, 21, 23, 59, 59));
    let dashboard = fetch_dashboard(&api, "2526");
    assert_eq!(
        dashboard.active_event.as_ref().map(|e| e.location()),
        Some("BMW IBU World Cup Biathlon Annecy-Le Grand Bornand")
    );

    clock.advance(TimeDelta::seconds(1));
    let dashboard = fetch_dashboard(&api, "2526");
    assert!(dashboard.active_event.is_none());
    assert!(dashboard.next_event.is_none());
}

#[test]
fn event_schedule_tags_each_race() {
    let clock = Arc::new(ManualClock::new(utc(2025, 12, 19, 10, 0, 0)));
    let api = api_with(season_source(), clock);

    let schedule = fetch_event_schedule(&api, "BT2526SWRLCP03");
    assert_eq!(schedule.len(), 1);
    assert_eq!(schedule[0].status, Some(RaceStatus::Upcoming));
    assert!(fetch_event_schedule(&api, "BT2526SWRLCP99").is_empty());
}

#[test]
fn upcoming_race_overview_skips_analysis() {
    let source = season_source();
    let clock = Arc::new(ManualClock::new(utc(2025, 12, 19, 10, 0, 0)));
    let api = api_with(source.clone(), clock);

    let overview = fetch_race_overview(&api, "2526", "BT2526SWRLCP03", "BT2526SWRLCP03SMSP")
        .expect("race is listed");
    assert_eq!(overview.competition.status, Some(RaceStatus::Upcoming));
    assert!(overview.results.is_empty());
    assert!(overview.range_analysis.is_none());
    assert!(overview.course_analysis.is_none());
    // Competitions, events, results; no analytic requests.
    assert_eq!(source.total_calls(), 3);
}

#[test]
fn finished_race_overview_carries_results_and_analysis() {
    let source = season_source();
    register_sprint_analytics(&source);
    let clock = Arc::new(ManualClock::new(utc(2025, 12, 5, 16, 0, 0)));
    let api = api_with(source, clock);

    let overview = fetch_race_overview(&api, "2526", "BT2526SWRLCP01", "BT2526SWRLCP01SMSP")
        .expect("race is listed");
    assert_eq!(overview.competition.status, Some(RaceStatus::Finished));
    assert_eq!(
        overview.event.as_ref().map(|e| e.location()),
        Some("Oestersund")
    );
    assert_eq!(overview.results.len(), 3);
    assert_eq!(overview.results[2].rank, "DNF");
    let range = overview.range_analysis.expect("range feeds exist");
    assert_eq!(range.athletes.len(), 2);
    assert!(overview.course_analysis.is_none());

    assert!(fetch_race_overview(&api, "2526", "BT2526SWRLCP01", "BT2526SWRLCP01SMPU").is_none());
}

#[test]
fn race_details_record_or_none() {
    let source = season_source();
    source.respond_fixture(
        url("RaceDetails?RaceId=BT2526SWRLCP01SWSP"),
        "race_details_cp01_swsp.json",
    );
    source.respond(url("RaceDetails?RaceId=BT2526SWRLCP02SMSP"), Value::Null);
    let api = api_with(source, Arc::new(ManualClock::new(utc(2025, 12, 5, 16, 0, 0))));

    let details = api
        .race_details("BT2526SWRLCP01SWSP")
        .expect("record is published");
    assert_eq!(details.event_id, "BT2526SWRLCP01");
    assert_eq!(details.status.as_deref(), Some("Official"));
    assert_eq!(details.results.len(), 2);
    assert_eq!(details.results[1].bib, Some(18));
    assert_eq!(details.results[1].shooting_total.as_deref(), Some("1"));

    assert!(api.race_details("BT2526SWRLCP02SMSP").is_none());
    assert!(api.race_details("BT2526SWRLCP03SMSP").is_none());
}

#[test]
fn overview_falls_back_to_race_details_results() {
    let source = season_source();
    source.respond_fixture(
        url("RaceDetails?RaceId=BT2526SWRLCP01SWSP"),
        "race_details_cp01_swsp.json",
    );
    let api = api_with(
        source.clone(),
        Arc::new(ManualClock::new(utc(2025, 12, 5, 16, 0, 0))),
    );

    let overview = fetch_race_overview(&api, "2526", "BT2526SWRLCP01", "BT2526SWRLCP01SWSP")
        .expect("race is listed");
    assert_eq!(overview.competition.status, Some(RaceStatus::Finished));
    let names: Vec<&str> = overview
        .results
        .iter()
        .map(|r| r.family_name.as_str())
        .collect();
    assert_eq!(names, ["DOE", "SIMON"]);
    assert_eq!(
        source.calls_to(&url("RaceDetails?RaceId=BT2526SWRLCP01SWSP")),
        1
    );

    // Published results win over the race record.
    fetch_race_overview(&api, "2526", "BT2526SWRLCP01", "BT2526SWRLCP01SMSP")
        .expect("race is listed");
    assert_eq!(
        source.calls_to(&url("RaceDetails?RaceId=BT2526SWRLCP01SMSP")),
        0
    );
}
