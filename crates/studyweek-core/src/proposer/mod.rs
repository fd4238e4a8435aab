//! Plan proposer port.
//!
//! The engine never writes task content itself. It asks a [`PlanProposer`]
//! for a [`ProposedPlan`], checks the proposal's structure, and persists it.
//!
//! ```text
//! service / coordinator
//!     |
//!     v
//! request_plan(proposer, request, timeout)
//!     |-- tokio::time::timeout(proposer.propose(request))
//!     |-- validate_week / validate_single_day
//!     v
//! ProposedPlan (structurally valid)
//! ```

pub mod http;
pub mod prompt;
pub mod trait_def;
pub mod types;
pub mod validate;

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

pub use http::{HttpProposer, HttpProposerConfig};
pub use trait_def::PlanProposer;
pub use types::{
    AvailabilityScope, ProposalRequest, ProposedDay, ProposedPlan, ProposedTask, StudentContext,
};
pub use validate::{ProposalError, validate_day, validate_single_day, validate_week};

/// Default bound on a single proposer call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Failure to obtain a usable proposal.
#[derive(Debug, Error)]
pub enum ProposerError {
    #[error("proposer did not answer within {0:?}")]
    Timeout(Duration),

    #[error("proposer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("proposer rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("proposer reply could not be read: {0}")]
    Malformed(String),

    #[error("invalid proposal: {0}")]
    InvalidProposal(#[from] ProposalError),

    #[error("proposer unavailable: {0}")]
    Unavailable(String),
}

/// Ask `proposer` for a plan covering `request.scope`, bounded by `timeout`,
/// and check the result's structure for that scope.
pub async fn request_plan(
    proposer: &dyn PlanProposer,
    request: &ProposalRequest<'_>,
    timeout: Duration,
) -> Result<ProposedPlan, ProposerError> {
    let plan = match tokio::time::timeout(timeout, proposer.propose(request)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(
                proposer = proposer.name(),
                first_date = %request.scope.first_date(),
                timeout_secs = timeout.as_secs_f64(),
                "plan proposer timed out"
            );
            return Err(ProposerError::Timeout(timeout));
        }
    };

    match request.scope {
        AvailabilityScope::Week { .. } => validate_week(&plan)?,
        AvailabilityScope::Day { .. } => validate_single_day(&plan)?,
    }

    debug!(
        proposer = proposer.name(),
        days = plan.days.len(),
        tasks = plan.days.iter().map(|d| d.tasks.len()).sum::<usize>(),
        "proposal accepted"
    );
    Ok(plan)
}
