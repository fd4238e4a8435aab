//! Persist a validated seven-day proposal as day plans and tasks.

use anyhow::Context;
use chrono::{Days, NaiveDate};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use studyweek_db::queries::{day_plans, tasks as task_queries};

use super::summary::{WeeklySummary, summarize_week};
use crate::error::EngineError;
use crate::proposer::{ProposedPlan, ProposerError, validate_week};

/// Result of materializing one week.
#[derive(Debug, Clone, Serialize)]
pub struct MaterializedWeek {
    /// Day-plan ids for `start_date`, `start_date + 1`, ... `start_date + 6`.
    pub day_plan_ids: Vec<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub summary: WeeklySummary,
}

/// The seven calendar dates of a week starting at `start_date`.
pub fn week_dates(start_date: NaiveDate) -> Vec<NaiveDate> {
    (0..7).map(|i| start_date + Days::new(i)).collect()
}

/// Create one day plan per proposed day on `start_date + index`, each with
/// its tasks in proposal order.
///
/// Everything happens in one transaction: if any date already has a plan or
/// any insert fails, nothing is kept.
pub async fn materialize_week(
    pool: &PgPool,
    student_id: Uuid,
    start_date: NaiveDate,
    plan: &ProposedPlan,
) -> Result<MaterializedWeek, EngineError> {
    validate_week(plan).map_err(ProposerError::from)?;

    let dates = week_dates(start_date);
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let taken = day_plans::existing_plan_dates(&mut *tx, student_id, &dates).await?;
    if let Some(date) = taken.first() {
        // Transaction rolls back on drop.
        return Err(EngineError::PlanAlreadyExists { date: *date });
    }

    let mut day_plan_ids = Vec::with_capacity(dates.len());
    for (date, day) in dates.iter().zip(&plan.days) {
        let row = day_plans::insert_day_plan(
            &mut *tx,
            student_id,
            *date,
            &day.title_for(*date),
            day.total_planned_minutes,
        )
        .await?;

        for task in &day.tasks {
            task_queries::insert_task(&mut *tx, row.id, &task.as_new_task()).await?;
        }
        day_plan_ids.push(row.id);
    }

    tx.commit()
        .await
        .context("failed to commit weekly plan")?;

    let summary = summarize_week(plan, start_date);
    info!(
        %student_id,
        %start_date,
        days = day_plan_ids.len(),
        total_minutes = summary.total_minutes,
        "weekly plan materialized"
    );

    Ok(MaterializedWeek {
        day_plan_ids,
        start_date,
        end_date: summary.end_date,
        summary,
    })
}
