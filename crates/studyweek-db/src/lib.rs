//! Persistence layer for the studyweek scheduling engine.
//!
//! Row models, embedded migrations, pool helpers and query functions for
//! students, weekly time blocks, day plans, tasks and onboarding drafts.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
