//! Engine-level error type shared by the plan service and the regeneration
//! coordinator.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::proposer::ProposerError;
use crate::routine::RoutineError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed time or overlapping blocks. Nothing was persisted.
    #[error("invalid routine: {0}")]
    Routine(#[from] RoutineError),

    /// The proposer failed or returned an unusable plan during initial
    /// generation. Regeneration records these per day instead.
    #[error(transparent)]
    Proposer(#[from] ProposerError),

    #[error("student {0} not found")]
    StudentNotFound(Uuid),

    #[error("student {0} has no time blocks; submit a routine first")]
    NoRoutine(Uuid),

    #[error("a day plan already exists for {date}")]
    PlanAlreadyExists { date: NaiveDate },

    #[error("task {0} not found")]
    TaskNotFound(Uuid),

    /// A query or commit failed. The surrounding transaction was rolled back.
    #[error("persistence failure: {0:#}")]
    Persistence(anyhow::Error),
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(err)
    }
}

impl EngineError {
    /// True for rejections caused by the submitted input rather than by the
    /// system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Routine(_)
                | Self::StudentNotFound(_)
                | Self::NoRoutine(_)
                | Self::PlanAlreadyExists { .. }
                | Self::TaskNotFound(_)
        )
    }
}
