use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use biathlon_tracker::analysis_export::export_race_analysis;
use biathlon_tracker::analytics::{
    MAX_STAGES, MetricCode, RaceAnalysis, fetch_course_analysis, fetch_metric_analysis,
    fetch_range_analysis,
};
use biathlon_tracker::api::BiathlonApi;
use biathlon_tracker::athlete::fetch_athlete_profile;
use biathlon_tracker::config::Config;
use biathlon_tracker::logging::setup_logging;
use biathlon_tracker::schedule::{
    ScheduledCompetition, event_id_of_race, fetch_dashboard, fetch_event_schedule,
    fetch_race_overview,
};
use biathlon_tracker::standings::{StandingsCategory, fetch_standings};

const USAGE: &str = "usage: biathlon_tracker [--season=YYYY] <command>

commands:
  events                     season calendar
  dashboard                  active stage, live races, next stage
  event <event_id>           races of one stage with their status
  race <race_id>             results and shooting/course analysis
  metrics <race_id> <type>.. selected analytic metrics, e.g. S1TM RNGT CRS3
  athlete <ibu_id>           biography and season results
  standings <SM|SW>          World Cup total score
  export <race_id> <file>    race analysis as an xlsx workbook";

fn main() -> Result<()> {
    let config = Config::from_env();
    if let Err(err) = setup_logging(config.log_level) {
        eprintln!("error: logger setup failed: {err}");
    }

    let (season, args) = split_season_arg(std::env::args().skip(1).collect());
    let season = season.unwrap_or_else(|| config.season.clone());
    let api = BiathlonApi::from_config(&config);

    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };
    let arg = |idx: usize, what: &str| {
        args.get(idx)
            .map(String::as_str)
            .ok_or_else(|| anyhow!("missing {what}\n\n{USAGE}"))
    };

    match command.as_str() {
        "events" => print_events(&api, &season),
        "dashboard" => print_dashboard(&api, &season),
        "event" => print_event(&api, arg(1, "event id")?),
        "race" => print_race(&api, &season, arg(1, "race id")?)?,
        "metrics" => {
            let race_id = arg(1, "race id")?;
            let type_ids: Vec<&str> = args.iter().skip(2).map(String::as_str).collect();
            if type_ids.is_empty() {
                return Err(anyhow!("missing metric type ids\n\n{USAGE}"));
            }
            print_metrics(&api, race_id, &type_ids);
        }
        "athlete" => print_athlete(&api, &season, arg(1, "IBU id")?),
        "standings" => {
            let category = arg(1, "category")?
                .parse::<StandingsCategory>()
                .map_err(|err| anyhow!(err))?;
            print_standings(&api, &season, category);
        }
        "export" => {
            let race_id = arg(1, "race id")?;
            let path = PathBuf::from(arg(2, "output file")?);
            let range = fetch_range_analysis(&api, race_id);
            let course = fetch_course_analysis(&api, race_id);
            let report = export_race_analysis(&path, range.as_ref(), course.as_ref())
                .context("export failed")?;
            println!(
                "Wrote {} ({} range rows, {} course rows)",
                path.display(),
                report.range_rows,
                report.course_rows
            );
        }
        other => return Err(anyhow!("unknown command '{other}'\n\n{USAGE}")),
    }
    Ok(())
}

fn split_season_arg(args: Vec<String>) -> (Option<String>, Vec<String>) {
    let mut season = None;
    let mut rest = Vec::with_capacity(args.len());
    for arg in args {
        match arg.strip_prefix("--season=") {
            Some(value) if !value.trim().is_empty() => season = Some(value.trim().to_string()),
            _ => rest.push(arg),
        }
    }
    (season, rest)
}

fn print_events(api: &BiathlonApi, season: &str) {
    let events = api.events(season);
    if events.is_empty() {
        println!("No events for season {season}");
        return;
    }
    for event in events {
        println!(
            "{:<16} {} .. {}  {}",
            event.event_id,
            day(&event.start_date),
            day(&event.end_date),
            event.location()
        );
    }
}

fn print_dashboard(api: &BiathlonApi, season: &str) {
    let dashboard = fetch_dashboard(api, season);
    println!("Season {}: {} events", dashboard.season, dashboard.total_events);
    match &dashboard.active_event {
        Some(event) => {
            println!(
                "Active stage: {} ({} live)",
                event.location(),
                dashboard.live_competitions
            );
            print_competitions(&dashboard.competitions);
        }
        None => match &dashboard.next_event {
            Some(event) => println!(
                "No stage running. Next: {} from {}",
                event.location(),
                day(&event.start_date)
            ),
            None => println!("No stage running and none scheduled."),
        },
    }
}

fn print_event(api: &BiathlonApi, event_id: &str) {
    let schedule = fetch_event_schedule(api, event_id);
    if schedule.is_empty() {
        println!("No races for {event_id}");
        return;
    }
    print_competitions(&schedule);
}

fn print_competitions(competitions: &[ScheduledCompetition]) {
    for entry in competitions {
        let status = entry.status.map(|s| s.as_str()).unwrap_or("?");
        println!(
            "  {:<20} {:<9} {}  {}",
            entry.competition.race_id,
            status,
            entry.competition.start_time,
            entry.competition.name()
        );
    }
}

fn print_race(api: &BiathlonApi, season: &str, race_id: &str) -> Result<()> {
    let event_id =
        event_id_of_race(race_id).ok_or_else(|| anyhow!("'{race_id}' is not a race id"))?;
    let Some(overview) = fetch_race_overview(api, season, event_id, race_id) else {
        println!("Race {race_id} not found under {event_id}");
        return Ok(());
    };

    let status = overview.competition.status.map(|s| s.as_str()).unwrap_or("?");
    println!(
        "{} [{status}] {}",
        overview.competition.competition.name(),
        overview
            .event
            .as_ref()
            .map(|e| e.location())
            .unwrap_or_default()
    );
    for result in overview.results.iter().take(30) {
        println!(
            "  {:>4} {:>3} {:<28} {:<3} {:>10} {:>8} {}",
            result.rank,
            result.bib.map(|b| b.to_string()).unwrap_or_default(),
            format!("{} {}", result.family_name, result.given_name),
            result.nat,
            result.total_time.as_deref().unwrap_or("-"),
            result.behind.as_deref().unwrap_or("-"),
            result.shooting_total.as_deref().unwrap_or("-"),
        );
    }
    match &overview.range_analysis {
        Some(analysis) => print_range(analysis),
        None => println!("No shooting analysis available."),
    }
    match &overview.course_analysis {
        Some(analysis) => println!(
            "Course analysis: {} athletes, {} metric types",
            analysis.athletes.len(),
            analysis.available.len()
        ),
        None => println!("No course analysis available."),
    }
    Ok(())
}

fn print_range(analysis: &RaceAnalysis) {
    println!("Shooting times:");
    for athlete in analysis.athletes_by_rank().into_iter().take(30) {
        let stages: Vec<&str> = (1..=MAX_STAGES as u8)
            .map(|n| athlete.metric(MetricCode::ShootingTime(n)).unwrap_or("-"))
            .collect();
        println!(
            "  {:<24} {:>8} total {:>8}  misses {}",
            athlete.family_name,
            stages.join(" "),
            athlete.metric(MetricCode::ShootingTotal).unwrap_or("-"),
            athlete.misses_by_stage.as_deref().unwrap_or("-"),
        );
    }
}

fn print_metrics(api: &BiathlonApi, race_id: &str, type_ids: &[&str]) {
    let Some(analysis) = fetch_metric_analysis(api, race_id, type_ids) else {
        println!("No data for {} in {race_id}", type_ids.join(" "));
        return;
    };
    let header: Vec<String> = analysis.available.iter().map(|c| c.type_id()).collect();
    println!("  {:<4} {:<24} {}", "Rank", "Athlete", header.join(" "));
    for athlete in analysis.athletes_by_rank() {
        let values: Vec<&str> = analysis
            .available
            .iter()
            .map(|code| athlete.metric(*code).unwrap_or("-"))
            .collect();
        println!(
            "  {:<4} {:<24} {}",
            athlete.rank.as_deref().unwrap_or("-"),
            athlete.family_name,
            values.join(" ")
        );
    }
}

fn print_athlete(api: &BiathlonApi, season: &str, ibu_id: &str) {
    let Some(profile) = fetch_athlete_profile(api, ibu_id, season) else {
        println!("Athlete {ibu_id} not found");
        return;
    };
    let bio = &profile.bio;
    println!(
        "{} {} ({})",
        bio.given_name,
        bio.family_name,
        bio.nation_label()
    );
    println!(
        "Season {season}: {} races, {} wins, {} podiums, {} top 10",
        profile.summary.races, profile.summary.wins, profile.summary.podiums, profile.summary.top10
    );
    for result in &profile.results {
        println!(
            "  {}  {:<28} {:<16} {:>4}  {}",
            day(&result.date),
            result.competition_name,
            result.location,
            result.rank,
            result.total_time.as_deref().unwrap_or("-"),
        );
    }
}

fn print_standings(api: &BiathlonApi, season: &str, category: StandingsCategory) {
    let standings = fetch_standings(api, category, season);
    if standings.is_empty() {
        println!("No standings for {category} in season {season}");
        return;
    }
    for entry in standings {
        println!(
            "{:>4}  {:<28} {:<3} {:>6}",
            entry.rank,
            format!("{} {}", entry.given_name, entry.family_name),
            entry.nat,
            entry.total_score
        );
    }
}

fn day(raw: &str) -> &str {
    raw.get(..10).unwrap_or(raw)
}
