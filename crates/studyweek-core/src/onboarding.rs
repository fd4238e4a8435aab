//! Short-lived onboarding answers.
//!
//! Multi-step onboarding collects answers across several requests. They are
//! kept in `onboarding_drafts` with an expiry rather than in process memory,
//! so any server instance can continue a student's onboarding.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use studyweek_db::queries::onboarding as draft_queries;

use crate::error::EngineError;
use crate::plan::load_student;

/// Default lifetime of a draft after its latest update, in minutes.
pub const DEFAULT_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy)]
pub struct OnboardingDrafts {
    ttl: TimeDelta,
}

impl Default for OnboardingDrafts {
    fn default() -> Self {
        Self {
            ttl: TimeDelta::minutes(DEFAULT_TTL_MINUTES),
        }
    }
}

impl OnboardingDrafts {
    pub fn new(ttl: TimeDelta) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Merge `answers` into the student's active draft (later keys win) and
    /// push its expiry to `now + ttl`. An expired draft is discarded first.
    pub async fn record_step(
        &self,
        pool: &PgPool,
        student_id: Uuid,
        answers: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<Value, EngineError> {
        load_student(pool, student_id).await?;

        let mut merged = match draft_queries::get_active_draft(pool, student_id, now).await? {
            Some(draft) => match draft.answers {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            None => Map::new(),
        };
        merged.extend(answers);

        let merged = Value::Object(merged);
        let draft = draft_queries::save_draft(pool, student_id, &merged, now + self.ttl).await?;
        debug!(%student_id, expires_at = %draft.expires_at, "onboarding step recorded");
        Ok(draft.answers)
    }

    /// Answers collected so far, if the draft has not expired.
    pub async fn current(
        &self,
        pool: &PgPool,
        student_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Value>, EngineError> {
        let draft = draft_queries::get_active_draft(pool, student_id, now).await?;
        Ok(draft.map(|d| d.answers))
    }

    /// Remove the draft and return its answers if it was still active.
    pub async fn finish(
        &self,
        pool: &PgPool,
        student_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Value>, EngineError> {
        let draft = draft_queries::take_draft(pool, student_id, now).await?;
        Ok(draft.map(|d| d.answers))
    }

    /// Delete every expired draft. Returns how many were removed.
    pub async fn purge_expired(
        &self,
        pool: &PgPool,
        now: DateTime<Utc>,
    ) -> Result<u64, EngineError> {
        let removed = draft_queries::purge_expired(pool, now).await?;
        if removed > 0 {
            info!(removed, "purged expired onboarding drafts");
        }
        Ok(removed)
    }
}
