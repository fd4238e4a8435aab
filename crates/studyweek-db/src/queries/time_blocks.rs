//! Database query functions for the `time_blocks` table.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::models::{TimeBlock, Weekday};

/// Rows come back Monday first, then by start time.
const WEEK_ORDER: &str = "array_position(ARRAY['MON','TUE','WED','THU','FRI','SAT','SUN'], weekday)";

/// Parameters for inserting one time block.
#[derive(Debug, Clone)]
pub struct NewTimeBlock<'a> {
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub total_minutes: i32,
    pub label: Option<&'a str>,
    pub category: Option<&'a str>,
}

pub async fn insert_time_block<'e, E>(
    executor: E,
    student_id: Uuid,
    new: &NewTimeBlock<'_>,
) -> Result<TimeBlock>
where
    E: PgExecutor<'e>,
{
    let block = sqlx::query_as::<_, TimeBlock>(
        "INSERT INTO time_blocks (student_id, weekday, start_time, end_time, total_minutes, label, category) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(student_id)
    .bind(new.weekday)
    .bind(new.start_time)
    .bind(new.end_time)
    .bind(new.total_minutes)
    .bind(new.label)
    .bind(new.category)
    .fetch_one(executor)
    .await
    .with_context(|| {
        format!(
            "failed to insert time block {} {}-{}",
            new.weekday, new.start_time, new.end_time
        )
    })?;

    Ok(block)
}

/// Every block of a student, in week order.
pub async fn list_time_blocks<'e, E>(executor: E, student_id: Uuid) -> Result<Vec<TimeBlock>>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "SELECT * FROM time_blocks WHERE student_id = $1 ORDER BY {WEEK_ORDER}, start_time ASC"
    );
    let blocks = sqlx::query_as::<_, TimeBlock>(&query)
        .bind(student_id)
        .fetch_all(executor)
        .await
        .context("failed to list time blocks")?;

    Ok(blocks)
}

/// Blocks of a student on one weekday, ordered by start time.
pub async fn list_time_blocks_for_weekday<'e, E>(
    executor: E,
    student_id: Uuid,
    weekday: Weekday,
) -> Result<Vec<TimeBlock>>
where
    E: PgExecutor<'e>,
{
    let blocks = sqlx::query_as::<_, TimeBlock>(
        "SELECT * FROM time_blocks WHERE student_id = $1 AND weekday = $2 ORDER BY start_time ASC",
    )
    .bind(student_id)
    .bind(weekday)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to list time blocks for {weekday}"))?;

    Ok(blocks)
}

/// Delete every block of a student. Returns the number of rows removed.
pub async fn delete_time_blocks<'e, E>(executor: E, student_id: Uuid) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM time_blocks WHERE student_id = $1")
        .bind(student_id)
        .execute(executor)
        .await
        .context("failed to delete time blocks")?;

    Ok(result.rows_affected())
}

/// Replace a student's whole routine: delete all existing blocks, then insert
/// `blocks` in the given order.
///
/// Returns `(deleted_count, inserted_rows)`. Run inside a transaction so a
/// failed insert leaves the old routine in place.
pub async fn replace_time_blocks(
    conn: &mut PgConnection,
    student_id: Uuid,
    blocks: &[NewTimeBlock<'_>],
) -> Result<(u64, Vec<TimeBlock>)> {
    let deleted = delete_time_blocks(&mut *conn, student_id).await?;

    let mut inserted = Vec::with_capacity(blocks.len());
    for block in blocks {
        inserted.push(insert_time_block(&mut *conn, student_id, block).await?);
    }

    Ok((deleted, inserted))
}
