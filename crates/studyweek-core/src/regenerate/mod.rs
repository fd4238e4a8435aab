//! Selective regeneration after a routine change.
//!
//! A routine update replaces all of a student's time blocks and then
//! rewrites only the upcoming, incomplete day plans that fall on affected
//! weekdays. Everything runs in one transaction:
//!
//! ```text
//! validate_routine ──► replace time blocks
//!                        │
//!                        ▼
//!        for each plan dated >= today and not completed
//!            classify ──► Unchanged        → outcome: unchanged
//!                     ──► MissingRoutine   → outcome: failed (tasks kept)
//!                     ──► Regenerate       → proposer
//!                                              ├─ ok  → replace tasks, regenerated
//!                                              └─ err → failed (tasks kept)
//!                        │
//!                        ▼
//!                      commit
//! ```
//!
//! Proposer failures are recorded per day and never abort the pass. Any
//! database error rolls back the routine replacement and every day mutation.
//! Proposer calls run one after another; concurrent updates for the same
//! student are not serialized.

pub mod classify;
pub mod outcome;

use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use studyweek_db::models::DayPlan;
use studyweek_db::queries::time_blocks::NewTimeBlock;
use studyweek_db::queries::{day_plans, students, tasks as task_queries, time_blocks};

use crate::error::EngineError;
use crate::plan::{habit_summary, load_student};
use crate::proposer::{
    AvailabilityScope, DEFAULT_TIMEOUT, PlanProposer, ProposalRequest, ProposedDay,
    StudentContext, request_plan,
};
use crate::routine::{TimeBlockInput, TimeBlockSpec, WeeklyAvailability, validate_routine};

pub use classify::{DayDecision, NO_ROUTINE_MESSAGE, affected_weekdays, classify};
pub use outcome::{
    OutcomeStatus, PlanChanges, RegenerationOutcome, RegenerationReport, RegenerationSummary,
};

#[derive(Debug, Clone)]
pub struct RegenerationConfig {
    /// Bound on each per-day proposer call. An elapsed timeout fails that
    /// day only.
    pub proposer_timeout: Duration,
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            proposer_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Replace a student's routine with `blocks` and regenerate affected
/// upcoming day plans.
///
/// Returns `Err` only for structural failures (invalid routine, unknown
/// student, database errors), in which case nothing is persisted. Per-day
/// proposer failures appear in the report as `failed` outcomes.
pub async fn regenerate_on_routine_change(
    pool: &PgPool,
    proposer: &dyn PlanProposer,
    student_id: Uuid,
    blocks: &[TimeBlockInput],
    today: NaiveDate,
    config: &RegenerationConfig,
) -> Result<RegenerationReport, EngineError> {
    let specs = validate_routine(blocks)?;

    let student = load_student(pool, student_id).await?;
    let logs = students::list_habit_logs(pool, student_id).await?;
    let habits = habit_summary(&logs);
    let context = StudentContext::from(&student);

    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let previous = time_blocks::list_time_blocks(&mut *tx, student_id).await?;
    let affected = affected_weekdays(&previous, &specs);
    let rows: Vec<NewTimeBlock<'_>> = specs.iter().map(TimeBlockSpec::as_new_block).collect();
    let (deleted_count, inserted) =
        time_blocks::replace_time_blocks(&mut *tx, student_id, &rows).await?;
    let availability = WeeklyAvailability::from_blocks(specs.iter().cloned());

    info!(
        %student_id,
        deleted = deleted_count,
        inserted = inserted.len(),
        affected = ?affected,
        "routine replaced"
    );

    let plans = day_plans::list_future_incomplete(&mut *tx, student_id, today).await?;
    let mut outcomes = Vec::with_capacity(plans.len());

    for plan in &plans {
        let (old_count, old_minutes) = task_queries::task_totals(&mut *tx, plan.id).await?;

        let outcome = match classify(plan.plan_date, &affected, &availability) {
            DayDecision::Unchanged => {
                info!(date = %plan.plan_date, "day unchanged");
                RegenerationOutcome::unchanged(plan, old_count, old_minutes)
            }
            DayDecision::MissingRoutine => {
                warn!(date = %plan.plan_date, "affected day has no blocks, keeping tasks");
                RegenerationOutcome::failed(plan, old_count, old_minutes, NO_ROUTINE_MESSAGE)
            }
            DayDecision::Regenerate { blocks } => {
                let request = ProposalRequest {
                    student: &context,
                    habit_summary: &habits,
                    scope: AvailabilityScope::Day {
                        date: plan.plan_date,
                        weekday: plan.weekday(),
                        blocks,
                    },
                };
                match request_plan(proposer, &request, config.proposer_timeout).await {
                    Ok(proposal) => match proposal.days.first() {
                        Some(day) => {
                            let (new_count, new_minutes) = apply_day(&mut *tx, plan, day).await?;
                            info!(
                                date = %plan.plan_date,
                                old_tasks = old_count,
                                new_tasks = new_count,
                                "day regenerated"
                            );
                            RegenerationOutcome::regenerated(
                                plan,
                                PlanChanges {
                                    old_tasks_count: old_count,
                                    new_tasks_count: new_count,
                                    old_minutes,
                                    new_minutes,
                                },
                            )
                        }
                        None => RegenerationOutcome::failed(
                            plan,
                            old_count,
                            old_minutes,
                            "proposer returned no day",
                        ),
                    },
                    Err(e) => {
                        warn!(date = %plan.plan_date, error = %e, "regeneration failed, keeping tasks");
                        RegenerationOutcome::failed(plan, old_count, old_minutes, e.to_string())
                    }
                }
            }
        };
        outcomes.push(outcome);
    }

    tx.commit()
        .await
        .context("failed to commit routine update")?;

    let report = RegenerationReport::new(
        inserted.iter().map(|b| b.id).collect(),
        deleted_count,
        outcomes,
    );
    info!(
        %student_id,
        total = report.summary.total_plans,
        regenerated = report.summary.regenerated,
        unchanged = report.summary.unchanged,
        failed = report.summary.failed,
        "routine update complete"
    );
    Ok(report)
}

/// Replace one plan's tasks with a proposed day and rewrite its header.
/// Returns the new task count and minutes.
async fn apply_day(
    conn: &mut PgConnection,
    plan: &DayPlan,
    day: &ProposedDay,
) -> Result<(i64, i64), EngineError> {
    task_queries::replace_tasks(&mut *conn, plan.id, &day.new_tasks()).await?;
    day_plans::update_day_plan_header(
        &mut *conn,
        plan.id,
        &day.title_for(plan.plan_date),
        day.total_planned_minutes,
    )
    .await?;
    Ok((day.tasks.len() as i64, day.task_minutes()))
}
