//! Pure decisions of the regeneration pass: which weekdays a routine update
//! affects and what to do with each upcoming day plan.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use studyweek_db::models::{TimeBlock, Weekday};

use crate::routine::{TimeBlockSpec, WeeklyAvailability};

/// Message recorded when an affected weekday has no blocks left.
pub const NO_ROUTINE_MESSAGE: &str = "no routine for this weekday";

/// Weekdays present in the new submission, plus weekdays that had blocks in
/// the routine being replaced. A weekday dropped from the routine is
/// affected and ends up with no blocks.
pub fn affected_weekdays(previous: &[TimeBlock], submitted: &[TimeBlockSpec]) -> BTreeSet<Weekday> {
    previous
        .iter()
        .map(|b| b.weekday)
        .chain(submitted.iter().map(|b| b.weekday))
        .collect()
}

/// What the coordinator does with one upcoming, incomplete day plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayDecision<'a> {
    /// Weekday not affected: leave the plan alone, no proposer call.
    Unchanged,
    /// Affected, but the new routine has no blocks that day: fail the day
    /// and keep its tasks.
    MissingRoutine,
    /// Affected with blocks: ask the proposer for this date.
    Regenerate { blocks: &'a [TimeBlockSpec] },
}

pub fn classify<'a>(
    plan_date: NaiveDate,
    affected: &BTreeSet<Weekday>,
    availability: &'a WeeklyAvailability,
) -> DayDecision<'a> {
    let weekday = Weekday::of(plan_date);
    if !affected.contains(&weekday) {
        return DayDecision::Unchanged;
    }
    match availability.blocks_for(weekday) {
        [] => DayDecision::MissingRoutine,
        blocks => DayDecision::Regenerate { blocks },
    }
}
