//! Plan service layer.
//!
//! Entry points used by the CLI and the HTTP API: weekly availability,
//! initial weekly generation, the day-plan read path, and task completion.

use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use studyweek_db::models::{DayPlan, HabitLog, Student, Task, TimeBlock};
use studyweek_db::queries::{day_plans, students, tasks as task_queries, time_blocks};

use super::materialize::{MaterializedWeek, materialize_week, week_dates};
use crate::error::EngineError;
use crate::proposer::{
    AvailabilityScope, PlanProposer, ProposalRequest, StudentContext, request_plan,
};
use crate::routine::{DailyTotal, WeeklyAvailability};

/// Habit text used when a student has no habit logs.
pub const NO_HABIT_DATA: &str = "### No habit analysis available\n\
No problem-solving habit analysis has been recorded for this student. \
Plan from the learning style and a standard progression for each subject: \
concept study, then practice, then review.";

/// Earliest date after `today` that falls on a Monday. A Monday `today`
/// yields the following Monday.
pub fn next_monday(today: NaiveDate) -> NaiveDate {
    let ahead = 7 - u64::from(today.weekday().num_days_from_monday());
    today + Days::new(ahead)
}

/// Free-text habit summary handed to the proposer.
pub fn habit_summary(logs: &[HabitLog]) -> String {
    if logs.is_empty() {
        return NO_HABIT_DATA.to_owned();
    }
    logs.iter()
        .map(|log| {
            format!(
                "### {}\n- habit summary: {}\n- detected tags: {}",
                log.subject,
                log.summary.trim(),
                if log.tags.is_empty() {
                    "none".to_owned()
                } else {
                    log.tags.join(", ")
                }
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub async fn load_student(pool: &PgPool, student_id: Uuid) -> Result<Student, EngineError> {
    students::get_student(pool, student_id)
        .await?
        .ok_or(EngineError::StudentNotFound(student_id))
}

/// A student's current routine: per-weekday totals for all seven days plus
/// the ordered blocks.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub student_id: Uuid,
    pub daily_totals: Vec<DailyTotal>,
    pub total_week_minutes: i32,
    pub blocks: Vec<TimeBlock>,
}

pub async fn get_weekly_availability(
    pool: &PgPool,
    student_id: Uuid,
) -> Result<AvailabilityReport, EngineError> {
    load_student(pool, student_id).await?;
    let blocks = time_blocks::list_time_blocks(pool, student_id).await?;
    let availability = WeeklyAvailability::from_rows(&blocks);

    Ok(AvailabilityReport {
        student_id,
        daily_totals: availability.daily_totals(),
        total_week_minutes: availability.total_week_minutes(),
        blocks,
    })
}

/// Generate and persist a seven-day plan.
///
/// `start_date` defaults to [`next_monday`] of `today`. Fails with
/// [`EngineError::PlanAlreadyExists`] before calling the proposer if any of
/// the seven dates already has a plan. A proposer failure aborts the call;
/// no partial week is ever stored.
pub async fn create_weekly_plan(
    pool: &PgPool,
    proposer: &dyn PlanProposer,
    student_id: Uuid,
    start_date: Option<NaiveDate>,
    today: NaiveDate,
    timeout: Duration,
) -> Result<MaterializedWeek, EngineError> {
    let student = load_student(pool, student_id).await?;

    let blocks = time_blocks::list_time_blocks(pool, student_id).await?;
    if blocks.is_empty() {
        return Err(EngineError::NoRoutine(student_id));
    }
    let availability = WeeklyAvailability::from_rows(&blocks);

    let start_date = start_date.unwrap_or_else(|| next_monday(today));
    let taken =
        day_plans::existing_plan_dates(pool, student_id, &week_dates(start_date)).await?;
    if let Some(date) = taken.first() {
        return Err(EngineError::PlanAlreadyExists { date: *date });
    }

    let logs = students::list_habit_logs(pool, student_id).await?;
    let habits = habit_summary(&logs);
    let context = StudentContext::from(&student);
    let request = ProposalRequest {
        student: &context,
        habit_summary: &habits,
        scope: AvailabilityScope::Week {
            start_date,
            availability: &availability,
        },
    };

    info!(
        %student_id,
        %start_date,
        proposer = proposer.name(),
        available_minutes = availability.total_week_minutes(),
        "generating weekly plan"
    );
    let proposal = request_plan(proposer, &request, timeout).await?;

    materialize_week(pool, student_id, start_date, &proposal).await
}

/// A day plan with its tasks in sequence order.
#[derive(Debug, Clone, Serialize)]
pub struct DayPlanWithTasks {
    #[serde(flatten)]
    pub plan: DayPlan,
    pub tasks: Vec<Task>,
}

impl DayPlanWithTasks {
    pub fn total_minutes(&self) -> i64 {
        self.tasks.iter().map(|t| i64::from(t.assigned_minutes)).sum()
    }
}

/// Plans of a student between `from` and `to` (inclusive, open ends
/// unbounded), ordered by date.
pub async fn list_day_plans_with_tasks(
    pool: &PgPool,
    student_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<DayPlanWithTasks>, EngineError> {
    load_student(pool, student_id).await?;
    let plans = day_plans::list_day_plans(pool, student_id, from, to).await?;

    let mut out = Vec::with_capacity(plans.len());
    for plan in plans {
        let tasks = task_queries::list_tasks_for_plan(pool, plan.id).await?;
        out.push(DayPlanWithTasks { plan, tasks });
    }
    Ok(out)
}

/// Mark a task done or reopen it, then set its day plan's completion flag to
/// whether every task of that plan is done.
pub async fn set_task_completed(
    pool: &PgPool,
    task_id: Uuid,
    completed: bool,
) -> Result<DayPlanWithTasks, EngineError> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    if task_queries::get_task(&mut *tx, task_id).await?.is_none() {
        return Err(EngineError::TaskNotFound(task_id));
    }
    let task = task_queries::set_task_completed(&mut *tx, task_id, completed).await?;

    let tasks = task_queries::list_tasks_for_plan(&mut *tx, task.day_plan_id).await?;
    let all_done = tasks.iter().all(|t| t.is_completed);
    day_plans::set_day_plan_completed(&mut *tx, task.day_plan_id, all_done).await?;
    let plan = day_plans::get_day_plan(&mut *tx, task.day_plan_id)
        .await?
        .with_context(|| format!("day plan {} vanished", task.day_plan_id))?;

    tx.commit()
        .await
        .context("failed to commit task completion")?;

    Ok(DayPlanWithTasks { plan, tasks })
}
