//! Handlers for `studyweek availability` and `studyweek routine update`.
//!
//! A routine file lists the student's whole week:
//!
//! ```toml
//! [[blocks]]
//! weekday = "MON"
//! start_time = "18:00"
//! end_time = "20:00"
//! label = "after school"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use studyweek_core::plan::get_weekly_availability;
use studyweek_core::proposer::PlanProposer;
use studyweek_core::regenerate::{
    OutcomeStatus, RegenerationConfig, RegenerationReport, regenerate_on_routine_change,
};
use studyweek_core::routine::TimeBlockInput;

#[derive(Debug, Deserialize)]
pub struct RoutineFile {
    #[serde(default)]
    pub blocks: Vec<TimeBlockInput>,
}

pub fn parse_routine_file(content: &str) -> Result<RoutineFile> {
    toml::from_str(content).context("failed to parse routine file")
}

pub fn read_routine_file(path: &Path) -> Result<RoutineFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read routine file: {}", path.display()))?;
    parse_routine_file(&content).with_context(|| format!("in {}", path.display()))
}

// -----------------------------------------------------------------------
// studyweek availability <student-id>
// -----------------------------------------------------------------------

pub async fn run_availability(pool: &PgPool, student_id: Uuid) -> Result<()> {
    let report = get_weekly_availability(pool, student_id).await?;

    println!("Weekly availability for {student_id}");
    println!();
    for day in &report.daily_totals {
        println!("  {:<3}  {:>4} min", day.weekday.code(), day.total_minutes);
    }
    println!("  ---------------");
    println!("  ALL  {:>4} min", report.total_week_minutes);

    if !report.blocks.is_empty() {
        println!();
        println!("Blocks:");
        for block in &report.blocks {
            println!(
                "  {} {}-{}  {:>3} min  {}",
                block.weekday,
                block.start_time.format("%H:%M"),
                block.end_time.format("%H:%M"),
                block.total_minutes,
                block.label.as_deref().unwrap_or("")
            );
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// studyweek routine update <student-id> <file>
// -----------------------------------------------------------------------

pub async fn run_routine_update(
    pool: &PgPool,
    proposer: &dyn PlanProposer,
    student_id: Uuid,
    file: &Path,
    today: NaiveDate,
    config: &RegenerationConfig,
) -> Result<()> {
    let routine = read_routine_file(file)?;
    let report =
        regenerate_on_routine_change(pool, proposer, student_id, &routine.blocks, today, config)
            .await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &RegenerationReport) {
    println!("Routine updated.");
    println!();
    println!("  Blocks replaced:  {}", report.deleted_count);
    println!("  Blocks inserted:  {}", report.updated_block_ids.len());
    println!(
        "  Upcoming plans:   {} ({} regenerated, {} unchanged, {} failed)",
        report.summary.total_plans,
        report.summary.regenerated,
        report.summary.unchanged,
        report.summary.failed
    );

    if report.outcomes.is_empty() {
        return;
    }
    println!();
    for outcome in &report.outcomes {
        let status = match outcome.status {
            OutcomeStatus::Regenerated => "regenerated",
            OutcomeStatus::Unchanged => "unchanged",
            OutcomeStatus::Failed => "FAILED",
        };
        print!(
            "  {} {}  {:<11}  {} tasks, {} min",
            outcome.plan_date, outcome.weekday, status, outcome.tasks_count, outcome.total_minutes
        );
        if let Some(changes) = &outcome.changes {
            print!(
                "  (was {} tasks, {} min)",
                changes.old_tasks_count, changes.old_minutes
            );
        }
        if let Some(message) = &outcome.error_message {
            print!("  {message}");
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blocks_with_aliases() {
        let file = parse_routine_file(
            r#"
[[blocks]]
weekday = "MON"
start_time = "18:00"
end_time = "20:00"
label = "after school"

[[blocks]]
day_of_week = "sat"
start_time = "10:00"
end_time = "11:30"
total_minutes = 90
"#,
        )
        .unwrap();
        assert_eq!(file.blocks.len(), 2);
        assert_eq!(file.blocks[0].label.as_deref(), Some("after school"));
        assert_eq!(file.blocks[1].weekday, "sat");
        assert_eq!(file.blocks[1].duration_minutes, Some(90));
    }

    #[test]
    fn empty_file_has_no_blocks() {
        assert!(parse_routine_file("").unwrap().blocks.is_empty());
    }

    #[test]
    fn missing_times_are_rejected() {
        let result = parse_routine_file("[[blocks]]\nweekday = \"MON\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn read_reports_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = read_routine_file(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read routine file"));
    }
}
