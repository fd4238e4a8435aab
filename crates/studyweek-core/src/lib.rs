//! Scheduling engine for weekly study plans.
//!
//! - [`routine`] validates submitted time blocks and aggregates them into
//!   weekly availability.
//! - [`proposer`] is the port through which task content is obtained.
//! - [`plan`] generates and materializes seven-day plans and serves the read
//!   path.
//! - [`regenerate`] replaces a routine and rewrites affected upcoming days.
//! - [`onboarding`] keeps short-lived onboarding answers.

pub mod error;
pub mod onboarding;
pub mod plan;
pub mod proposer;
pub mod regenerate;
pub mod routine;

pub use error::EngineError;
