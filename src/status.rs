use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::Serialize;

use crate::model::{Competition, Event};

/// Assumed race length. The upstream never confirms a finish, so a race that
/// overruns reads as finished early and a short one reads as live too long.
pub fn live_window() -> TimeDelta {
    TimeDelta::hours(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceStatus {
    Upcoming,
    Live,
    Finished,
}

impl RaceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RaceStatus::Upcoming => "upcoming",
            RaceStatus::Live => "live",
            RaceStatus::Finished => "finished",
        }
    }
}

pub fn classify(start: DateTime<Utc>, now: DateTime<Utc>) -> RaceStatus {
    if now < start {
        RaceStatus::Upcoming
    } else if now <= start + live_window() {
        RaceStatus::Live
    } else {
        RaceStatus::Finished
    }
}

/// RFC 3339 first; timestamps without an offset are taken as UTC.
pub fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(naive.and_utc());
        }
    }
    parse_day(trimmed).map(|day| day.and_time(NaiveTime::MIN).and_utc())
}

pub fn competition_status(competition: &Competition, now: DateTime<Utc>) -> Option<RaceStatus> {
    parse_start_time(&competition.start_time).map(|start| classify(start, now))
}

/// A stage stays active until the end of the day of its end date.
pub fn is_event_active(event: &Event, now: DateTime<Utc>) -> bool {
    let Some(start) = parse_start_time(&event.start_date) else {
        return false;
    };
    let Some(end_day) = parse_day(&event.end_date) else {
        return false;
    };
    let end = end_day.and_time(last_instant_of_day()).and_utc();
    start <= now && now <= end
}

pub fn active_event(events: &[Event], now: DateTime<Utc>) -> Option<&Event> {
    events.iter().find(|event| is_event_active(event, now))
}

pub fn next_event(events: &[Event], now: DateTime<Utc>) -> Option<&Event> {
    events
        .iter()
        .filter_map(|event| parse_start_time(&event.start_date).map(|start| (start, event)))
        .filter(|(start, _)| *start > now)
        .min_by_key(|(start, _)| *start)
        .map(|(_, event)| event)
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn last_instant_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
}
