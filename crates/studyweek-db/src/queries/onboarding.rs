//! Database query functions for the `onboarding_drafts` table.
//!
//! A draft is visible only while `expires_at` lies in the future. Expired
//! rows are ignored by reads and removed by [`purge_expired`].

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::OnboardingDraft;

/// Insert or overwrite the draft for a student.
pub async fn save_draft<'e, E>(
    executor: E,
    student_id: Uuid,
    answers: &serde_json::Value,
    expires_at: DateTime<Utc>,
) -> Result<OnboardingDraft>
where
    E: PgExecutor<'e>,
{
    let draft = sqlx::query_as::<_, OnboardingDraft>(
        "INSERT INTO onboarding_drafts (student_id, answers, expires_at) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (student_id) DO UPDATE \
         SET answers = EXCLUDED.answers, expires_at = EXCLUDED.expires_at, updated_at = now() \
         RETURNING *",
    )
    .bind(student_id)
    .bind(answers)
    .bind(expires_at)
    .fetch_one(executor)
    .await
    .context("failed to save onboarding draft")?;

    Ok(draft)
}

/// The draft for a student if it has not expired at `now`.
pub async fn get_active_draft<'e, E>(
    executor: E,
    student_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<OnboardingDraft>>
where
    E: PgExecutor<'e>,
{
    let draft = sqlx::query_as::<_, OnboardingDraft>(
        "SELECT * FROM onboarding_drafts WHERE student_id = $1 AND expires_at > $2",
    )
    .bind(student_id)
    .bind(now)
    .fetch_optional(executor)
    .await
    .context("failed to fetch onboarding draft")?;

    Ok(draft)
}

/// Remove the draft and return it if it was still active.
pub async fn take_draft<'e, E>(
    executor: E,
    student_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<OnboardingDraft>>
where
    E: PgExecutor<'e>,
{
    let draft = sqlx::query_as::<_, OnboardingDraft>(
        "DELETE FROM onboarding_drafts WHERE student_id = $1 RETURNING *",
    )
    .bind(student_id)
    .fetch_optional(executor)
    .await
    .context("failed to delete onboarding draft")?;

    Ok(draft.filter(|d| d.expires_at > now))
}

/// Delete all drafts that expired at or before `now`.
pub async fn purge_expired<'e, E>(executor: E, now: DateTime<Utc>) -> Result<u64>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM onboarding_drafts WHERE expires_at <= $1")
        .bind(now)
        .execute(executor)
        .await
        .context("failed to purge expired onboarding drafts")?;

    Ok(result.rows_affected())
}
