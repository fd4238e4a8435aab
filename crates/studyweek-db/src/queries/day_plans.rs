//! Database query functions for the `day_plans` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::DayPlan;

/// Insert a plan header for one date. Fails on the `(student_id, plan_date)`
/// unique constraint if the date already has a plan.
pub async fn insert_day_plan<'e, E>(
    executor: E,
    student_id: Uuid,
    plan_date: NaiveDate,
    title: &str,
    target_minutes: i32,
) -> Result<DayPlan>
where
    E: PgExecutor<'e>,
{
    let plan = sqlx::query_as::<_, DayPlan>(
        "INSERT INTO day_plans (student_id, plan_date, title, target_minutes) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(student_id)
    .bind(plan_date)
    .bind(title)
    .bind(target_minutes)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert day plan for {plan_date}"))?;

    Ok(plan)
}

pub async fn get_day_plan<'e, E>(executor: E, id: Uuid) -> Result<Option<DayPlan>>
where
    E: PgExecutor<'e>,
{
    let plan = sqlx::query_as::<_, DayPlan>("SELECT * FROM day_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch day plan")?;

    Ok(plan)
}

pub async fn get_day_plan_by_date<'e, E>(
    executor: E,
    student_id: Uuid,
    plan_date: NaiveDate,
) -> Result<Option<DayPlan>>
where
    E: PgExecutor<'e>,
{
    let plan = sqlx::query_as::<_, DayPlan>(
        "SELECT * FROM day_plans WHERE student_id = $1 AND plan_date = $2",
    )
    .bind(student_id)
    .bind(plan_date)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("failed to fetch day plan for {plan_date}"))?;

    Ok(plan)
}

/// Dates among `dates` that already carry a plan for this student.
pub async fn existing_plan_dates<'e, E>(
    executor: E,
    student_id: Uuid,
    dates: &[NaiveDate],
) -> Result<Vec<NaiveDate>>
where
    E: PgExecutor<'e>,
{
    let found: Vec<NaiveDate> = sqlx::query_scalar(
        "SELECT plan_date FROM day_plans \
         WHERE student_id = $1 AND plan_date = ANY($2) \
         ORDER BY plan_date ASC",
    )
    .bind(student_id)
    .bind(dates)
    .fetch_all(executor)
    .await
    .context("failed to check existing day plans")?;

    Ok(found)
}

/// Plans of a student within an inclusive date range. Open ends are unbounded.
pub async fn list_day_plans<'e, E>(
    executor: E,
    student_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<DayPlan>>
where
    E: PgExecutor<'e>,
{
    let plans = sqlx::query_as::<_, DayPlan>(
        "SELECT * FROM day_plans \
         WHERE student_id = $1 \
           AND ($2::date IS NULL OR plan_date >= $2) \
           AND ($3::date IS NULL OR plan_date <= $3) \
         ORDER BY plan_date ASC",
    )
    .bind(student_id)
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await
    .context("failed to list day plans")?;

    Ok(plans)
}

/// Plans dated `today` or later that are not yet completed, earliest first.
/// These are the only plans a routine change may rewrite.
pub async fn list_future_incomplete<'e, E>(
    executor: E,
    student_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<DayPlan>>
where
    E: PgExecutor<'e>,
{
    let plans = sqlx::query_as::<_, DayPlan>(
        "SELECT * FROM day_plans \
         WHERE student_id = $1 AND plan_date >= $2 AND NOT is_completed \
         ORDER BY plan_date ASC",
    )
    .bind(student_id)
    .bind(today)
    .fetch_all(executor)
    .await
    .context("failed to list upcoming day plans")?;

    Ok(plans)
}

/// Rewrite title and target minutes after the task list was replaced.
pub async fn update_day_plan_header<'e, E>(
    executor: E,
    id: Uuid,
    title: &str,
    target_minutes: i32,
) -> Result<DayPlan>
where
    E: PgExecutor<'e>,
{
    let plan = sqlx::query_as::<_, DayPlan>(
        "UPDATE day_plans SET title = $2, target_minutes = $3, updated_at = now() \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(title)
    .bind(target_minutes)
    .fetch_optional(executor)
    .await
    .context("failed to update day plan")?;

    plan.with_context(|| format!("day plan {id} not found"))
}

pub async fn set_day_plan_completed<'e, E>(executor: E, id: Uuid, completed: bool) -> Result<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "UPDATE day_plans SET is_completed = $2, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(completed)
    .execute(executor)
    .await
    .context("failed to update day plan completion")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("day plan {id} not found");
    }

    Ok(())
}
