//! Handlers for `studyweek plan` subcommands.
//!
//! - `studyweek plan create <student-id> [--start-date]`  -- generate a week
//! - `studyweek plan show <student-id> [--from] [--to]`   -- list day plans
//! - `studyweek plan done <task-id> [--reopen]`           -- toggle a task

use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use studyweek_core::plan::{
    DayPlanWithTasks, create_weekly_plan, list_day_plans_with_tasks, set_task_completed,
};
use studyweek_core::proposer::PlanProposer;

// -----------------------------------------------------------------------
// studyweek plan create
// -----------------------------------------------------------------------

pub async fn cmd_create(
    pool: &PgPool,
    proposer: &dyn PlanProposer,
    student_id: Uuid,
    start_date: Option<NaiveDate>,
    today: NaiveDate,
    timeout: Duration,
) -> Result<()> {
    let week = create_weekly_plan(pool, proposer, student_id, start_date, today, timeout).await?;

    println!("Weekly plan created.");
    println!();
    println!("  Week:          {} .. {}", week.start_date, week.end_date);
    println!("  Day plans:     {}", week.day_plan_ids.len());
    println!("  Total minutes: {}", week.summary.total_minutes);
    if !week.summary.focus_areas.is_empty() {
        println!("  Focus:         {}", week.summary.focus_areas.join("; "));
    }
    if !week.summary.category_minutes.is_empty() {
        println!("  By category:");
        for (category, minutes) in &week.summary.category_minutes {
            println!("    {category:<12} {minutes:>4} min");
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// studyweek plan show
// -----------------------------------------------------------------------

pub async fn cmd_show(
    pool: &PgPool,
    student_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    let plans = list_day_plans_with_tasks(pool, student_id, from, to).await?;

    if plans.is_empty() {
        println!("No day plans found. Use `studyweek plan create {student_id}` to create a week.");
        return Ok(());
    }

    for plan in &plans {
        print_day(plan);
        println!();
    }
    Ok(())
}

fn print_day(day: &DayPlanWithTasks) {
    let mark = if day.plan.is_completed { "x" } else { " " };
    println!(
        "[{mark}] {} {}  {}  ({} / {} min)",
        day.plan.plan_date,
        day.plan.weekday(),
        day.plan.title,
        day.total_minutes(),
        day.plan.target_minutes
    );
    for task in &day.tasks {
        let mark = if task.is_completed { "x" } else { " " };
        let slot = task.time_slot.as_deref().unwrap_or("-");
        println!(
            "    [{mark}] {}. {:<11} {:>3} min  {}  {}",
            task.sequence, slot, task.assigned_minutes, task.category, task.title
        );
        println!("        id: {}", task.id);
    }
}

// -----------------------------------------------------------------------
// studyweek plan done
// -----------------------------------------------------------------------

pub async fn cmd_done(pool: &PgPool, task_id: Uuid, reopen: bool) -> Result<()> {
    let day = set_task_completed(pool, task_id, !reopen).await?;
    if reopen {
        println!("Task {task_id} reopened.");
    } else {
        println!("Task {task_id} completed.");
    }
    println!();
    print_day(&day);
    Ok(())
}
