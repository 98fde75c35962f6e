use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::analytics::{
    CompositeAthleteRecord, MAX_COURSE_LEGS, MAX_LAPS, MAX_STAGES, MetricCode, RaceAnalysis,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub range_rows: usize,
    pub course_rows: usize,
}

/// Writes a `Range` and a `Course` sheet. A missing analysis still gets its
/// sheet, with only the header row.
pub fn export_race_analysis(
    path: &Path,
    range: Option<&RaceAnalysis>,
    course: Option<&RaceAnalysis>,
) -> Result<ExportReport> {
    let range_rows = range.map(range_table).unwrap_or_else(|| vec![range_header()]);
    let course_rows = course
        .map(course_table)
        .unwrap_or_else(|| vec![course_header()]);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Range").context("name range sheet")?;
        write_rows(sheet, &range_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Course").context("name course sheet")?;
        write_rows(sheet, &course_rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;

    Ok(ExportReport {
        range_rows: range_rows.len() - 1,
        course_rows: course_rows.len() - 1,
    })
}

fn identity_header() -> Vec<String> {
    ["Rank", "Bib", "IBU ID", "Family Name", "Given Name", "Nat"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn range_header() -> Vec<String> {
    let mut header = identity_header();
    header.extend((1..=MAX_STAGES).map(|n| format!("Shooting {n}")));
    header.push("Shooting Total".to_string());
    header.extend((1..=MAX_STAGES).map(|n| format!("Range {n}")));
    header.push("Range Total".to_string());
    header.push("Misses".to_string());
    header.push("Misses By Stage".to_string());
    header
}

fn course_header() -> Vec<String> {
    let mut header = identity_header();
    header.extend((1..=MAX_COURSE_LEGS).map(|n| format!("Course {n}")));
    header.extend((1..=MAX_LAPS).map(|n| format!("Lap {n}")));
    header.push("Course Total".to_string());
    header.push("Ski Total".to_string());
    header
}

fn range_table(analysis: &RaceAnalysis) -> Vec<Vec<String>> {
    let mut rows = vec![range_header()];
    for athlete in analysis.athletes_by_rank() {
        let mut row = identity_row(athlete);
        row.extend(athlete.shooting_times.iter().map(cell));
        row.push(metric_cell(athlete, MetricCode::ShootingTotal));
        row.extend(athlete.range_times.iter().map(cell));
        row.push(metric_cell(athlete, MetricCode::RangeTotal));
        row.push(cell(&athlete.misses_total));
        row.push(cell(&athlete.misses_by_stage));
        rows.push(row);
    }
    rows
}

fn course_table(analysis: &RaceAnalysis) -> Vec<Vec<String>> {
    let mut rows = vec![course_header()];
    for athlete in analysis.athletes_by_rank() {
        let mut row = identity_row(athlete);
        row.extend(athlete.course_times.iter().map(cell));
        row.extend(athlete.lap_times.iter().map(cell));
        row.push(metric_cell(athlete, MetricCode::CourseTotal));
        row.push(metric_cell(athlete, MetricCode::SkiTotal));
        rows.push(row);
    }
    rows
}

fn identity_row(athlete: &CompositeAthleteRecord) -> Vec<String> {
    vec![
        cell(&athlete.rank),
        athlete.bib.map(|b| b.to_string()).unwrap_or_else(dash),
        athlete.ibu_id.clone(),
        athlete.family_name.clone(),
        athlete.given_name.clone(),
        athlete.nat.clone(),
    ]
}

fn metric_cell(athlete: &CompositeAthleteRecord, code: MetricCode) -> String {
    athlete.metric(code).map(str::to_string).unwrap_or_else(dash)
}

fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(dash)
}

fn dash() -> String {
    "-".to_string()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    let bold = Format::new().set_bold();
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let result = if row_idx == 0 {
                worksheet.write_string_with_format(row_idx as u32, col_idx as u16, value, &bold)
            } else {
                worksheet.write_string(row_idx as u32, col_idx as u16, value)
            };
            result.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
