mod common;

use biathlon_tracker::model::{AthleteBio, Competition, Event, RaceResult};

use common::read_fixture;

#[test]
fn parses_event_calendar() {
    let events: Vec<Event> =
        serde_json::from_value(read_fixture("events_2526.json")).expect("events fixture");
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].event_id, "BT2526SWRLCP01");
    assert_eq!(events[0].location(), "Oestersund");
    assert_eq!(events[0].nat.as_deref(), Some("SWE"));
    assert_eq!(events[0].utc_offset, Some(1.0));
    // No short description: falls back to the long one.
    assert_eq!(
        events[2].location(),
        "BMW IBU World Cup Biathlon Annecy-Le Grand Bornand"
    );
}

#[test]
fn parses_competitions_with_either_short_key() {
    let cp01: Vec<Competition> =
        serde_json::from_value(read_fixture("competitions_cp01.json")).expect("cp01 fixture");
    assert_eq!(cp01.len(), 2);
    assert_eq!(cp01[0].category, "SW");
    assert_eq!(cp01[0].km, Some(7.5));
    assert_eq!(cp01[1].status_text.as_deref(), Some("Final"));

    let cp02: Vec<Competition> =
        serde_json::from_value(read_fixture("competitions_cp02.json")).expect("cp02 fixture");
    assert_eq!(cp02[0].short_description, "Men 10km Sprint");
    assert_eq!(cp02[0].status_text, None);
}

#[test]
fn parses_results_with_mixed_scalar_types() {
    let results: Vec<RaceResult> =
        serde_json::from_value(read_fixture("results_cp01_smsp.json")["Results"].clone())
            .expect("results fixture");
    assert_eq!(results.len(), 3);

    assert_eq!(results[0].bib, Some(5));
    assert_eq!(results[0].shootings.as_deref(), Some("0+0"));
    assert_eq!(results[1].bib, Some(12));
    assert_eq!(results[1].rank, "2");
    assert_eq!(results[1].shooting_standing, Some(1));
    assert_eq!(results[2].rank, "DNF");
    assert_eq!(results[2].total_time, None);
    assert_eq!(results[2].shooting_total, None);
}

#[test]
fn parses_athlete_bio() {
    let bio: AthleteBio =
        serde_json::from_value(read_fixture("athlete_bio.json")).expect("bio fixture");
    assert_eq!(bio.ibu_id, "BTFRA21003199701");
    assert_eq!(bio.given_name, "Eric");
    assert_eq!(bio.birthdate.as_deref(), Some("2001-10-21T00:00:00"));
}
