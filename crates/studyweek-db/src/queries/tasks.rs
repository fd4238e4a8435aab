//! Database query functions for the `tasks` table.

use anyhow::{Context, Result};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::models::{Difficulty, Task};

/// Parameters for inserting one task into a day plan.
#[derive(Debug, Clone)]
pub struct NewTask<'a> {
    pub sequence: i32,
    pub category: &'a str,
    pub title: &'a str,
    pub assigned_minutes: i32,
    pub time_slot: Option<&'a str>,
    pub difficulty: Option<Difficulty>,
    pub instruction: Option<&'a str>,
    pub rest_after_minutes: i32,
}

pub async fn insert_task<'e, E>(executor: E, day_plan_id: Uuid, new: &NewTask<'_>) -> Result<Task>
where
    E: PgExecutor<'e>,
{
    let task = sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (day_plan_id, sequence, category, title, assigned_minutes, \
                            time_slot, difficulty, instruction, rest_after_minutes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(day_plan_id)
    .bind(new.sequence)
    .bind(new.category)
    .bind(new.title)
    .bind(new.assigned_minutes)
    .bind(new.time_slot)
    .bind(new.difficulty)
    .bind(new.instruction)
    .bind(new.rest_after_minutes)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert task #{} {:?}", new.sequence, new.title))?;

    Ok(task)
}

pub async fn get_task<'e, E>(executor: E, id: Uuid) -> Result<Option<Task>>
where
    E: PgExecutor<'e>,
{
    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch task")?;

    Ok(task)
}

/// Tasks of one day plan in sequence order.
pub async fn list_tasks_for_plan<'e, E>(executor: E, day_plan_id: Uuid) -> Result<Vec<Task>>
where
    E: PgExecutor<'e>,
{
    let tasks = sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks WHERE day_plan_id = $1 ORDER BY sequence ASC",
    )
    .bind(day_plan_id)
    .fetch_all(executor)
    .await
    .context("failed to list tasks for day plan")?;

    Ok(tasks)
}

/// Task count and summed assigned minutes of one day plan.
pub async fn task_totals<'e, E>(executor: E, day_plan_id: Uuid) -> Result<(i64, i64)>
where
    E: PgExecutor<'e>,
{
    let totals: (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(assigned_minutes), 0)::bigint \
         FROM tasks WHERE day_plan_id = $1",
    )
    .bind(day_plan_id)
    .fetch_one(executor)
    .await
    .context("failed to sum tasks for day plan")?;

    Ok(totals)
}

/// Delete every task of a day plan and insert `tasks` in their place.
/// Returns the number of tasks removed.
pub async fn replace_tasks(
    conn: &mut PgConnection,
    day_plan_id: Uuid,
    tasks: &[NewTask<'_>],
) -> Result<u64> {
    let deleted = sqlx::query("DELETE FROM tasks WHERE day_plan_id = $1")
        .bind(day_plan_id)
        .execute(&mut *conn)
        .await
        .context("failed to clear tasks for day plan")?
        .rows_affected();

    for task in tasks {
        insert_task(&mut *conn, day_plan_id, task).await?;
    }

    Ok(deleted)
}

/// Mark a task done (stamping `completed_at`) or reopen it.
pub async fn set_task_completed<'e, E>(executor: E, id: Uuid, completed: bool) -> Result<Task>
where
    E: PgExecutor<'e>,
{
    let task = sqlx::query_as::<_, Task>(
        "UPDATE tasks \
         SET is_completed = $2, \
             completed_at = CASE WHEN $2 THEN now() ELSE NULL END \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(completed)
    .fetch_optional(executor)
    .await
    .context("failed to update task completion")?;

    task.with_context(|| format!("task {id} not found"))
}
