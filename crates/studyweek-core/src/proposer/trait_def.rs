//! The `PlanProposer` trait, the port through which the engine obtains task
//! content for a week or a single day.

use async_trait::async_trait;

use super::ProposerError;
use super::types::{ProposalRequest, ProposedPlan};

/// Source of proposed study tasks.
///
/// Implementations turn student context plus availability into a
/// [`ProposedPlan`]. They need not validate the result; the engine checks
/// every proposal (see [`super::validate`]) and bounds every call with a
/// timeout.
///
/// # Object Safety
///
/// The trait is object-safe so services can hold an
/// `Arc<dyn PlanProposer>` chosen at startup.
#[async_trait]
pub trait PlanProposer: Send + Sync {
    /// Short name for logs (e.g. "http", "scripted").
    fn name(&self) -> &str;

    /// Propose tasks for `request.scope`: seven days for a week, one for a
    /// day.
    async fn propose(&self, request: &ProposalRequest<'_>) -> Result<ProposedPlan, ProposerError>;
}

// Compile-time assertion: PlanProposer must be usable as `dyn PlanProposer`.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanProposer) {}
};
