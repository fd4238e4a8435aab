//! Query functions, one module per table.
//!
//! Single-statement queries accept any [`sqlx::PgExecutor`] so they run
//! equally against a pool or inside a caller's transaction. Queries that
//! issue several statements take `&mut PgConnection`; pass `&mut *tx`.

pub mod day_plans;
pub mod onboarding;
pub mod students;
pub mod tasks;
pub mod time_blocks;
