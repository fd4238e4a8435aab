//! Structural checks applied to every proposal before it is persisted.

use thiserror::Error;

use super::types::{ProposedDay, ProposedPlan};

/// Upper bound for any single minute figure in a proposal: one full day.
pub const MAX_DAY_MINUTES: i32 = 24 * 60;

/// Why a proposal was rejected. `day` is the zero-based day index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalError {
    #[error("expected {expected} day(s), proposal has {actual}")]
    WrongDayCount { expected: usize, actual: usize },

    #[error("day {day}: no tasks proposed")]
    NoTasks { day: usize },

    #[error("day {day}: sequence {sequence} is not positive")]
    NonPositiveSequence { day: usize, sequence: i32 },

    #[error("day {day}: sequence {sequence} appears more than once")]
    DuplicateSequence { day: usize, sequence: i32 },

    #[error("day {day}: sequences skip {missing} (expected 1..={count})")]
    SequenceGap {
        day: usize,
        missing: i32,
        count: usize,
    },

    #[error("day {day}: task {sequence} has non-positive assigned minutes ({minutes})")]
    NonPositiveMinutes {
        day: usize,
        sequence: i32,
        minutes: i32,
    },

    #[error("day {day}: task {sequence} has negative rest ({minutes})")]
    NegativeRest {
        day: usize,
        sequence: i32,
        minutes: i32,
    },

    #[error("day {day}: negative planned total ({minutes})")]
    NegativeTotal { day: usize, minutes: i32 },

    #[error("day {day}: {field} of {minutes} minutes exceeds {MAX_DAY_MINUTES}")]
    TooManyMinutes {
        day: usize,
        field: &'static str,
        minutes: i32,
    },

    #[error("day {day}: {field} contains a NUL character")]
    NulCharacter { day: usize, field: &'static str },
}

/// Check one day: sequences are exactly `1..=k`, minutes positive, rest and
/// planned total non-negative, no minute figure above a full day, and no
/// text the database would refuse to store.
pub fn validate_day(index: usize, day: &ProposedDay) -> Result<(), ProposalError> {
    if day.total_planned_minutes < 0 {
        return Err(ProposalError::NegativeTotal {
            day: index,
            minutes: day.total_planned_minutes,
        });
    }
    check_minutes(index, "planned total", day.total_planned_minutes)?;
    check_text(index, "focus", &day.focus)?;

    for task in &day.tasks {
        if task.sequence <= 0 {
            return Err(ProposalError::NonPositiveSequence {
                day: index,
                sequence: task.sequence,
            });
        }
        if task.assigned_minutes <= 0 {
            return Err(ProposalError::NonPositiveMinutes {
                day: index,
                sequence: task.sequence,
                minutes: task.assigned_minutes,
            });
        }
        if task.rest_after_minutes < 0 {
            return Err(ProposalError::NegativeRest {
                day: index,
                sequence: task.sequence,
                minutes: task.rest_after_minutes,
            });
        }
        check_minutes(index, "assigned minutes", task.assigned_minutes)?;
        check_minutes(index, "rest", task.rest_after_minutes)?;
        check_text(index, "category", &task.category)?;
        check_text(index, "title", &task.title)?;
        for (field, value) in [
            ("time slot", &task.time_slot),
            ("instruction", &task.instruction),
        ] {
            if let Some(value) = value {
                check_text(index, field, value)?;
            }
        }
    }

    let mut sequences: Vec<i32> = day.tasks.iter().map(|t| t.sequence).collect();
    sequences.sort_unstable();
    if let Some(pair) = sequences.windows(2).find(|w| w[0] == w[1]) {
        return Err(ProposalError::DuplicateSequence {
            day: index,
            sequence: pair[0],
        });
    }
    // Sorted, unique and positive: 1..=k holds iff each value equals its rank.
    if let Some(missing) = (1..).zip(&sequences).find(|(want, got)| *want != **got) {
        return Err(ProposalError::SequenceGap {
            day: index,
            missing: missing.0,
            count: sequences.len(),
        });
    }

    Ok(())
}

/// A full-week proposal: exactly seven valid days.
pub fn validate_week(plan: &ProposedPlan) -> Result<(), ProposalError> {
    check_day_count(plan, 7)?;
    plan.days
        .iter()
        .enumerate()
        .try_for_each(|(i, day)| validate_day(i, day))
}

/// A single-day proposal: exactly one valid day with at least one task.
pub fn validate_single_day(plan: &ProposedPlan) -> Result<(), ProposalError> {
    check_day_count(plan, 1)?;
    let day = &plan.days[0];
    if day.tasks.is_empty() {
        return Err(ProposalError::NoTasks { day: 0 });
    }
    validate_day(0, day)
}

fn check_minutes(day: usize, field: &'static str, minutes: i32) -> Result<(), ProposalError> {
    if minutes > MAX_DAY_MINUTES {
        return Err(ProposalError::TooManyMinutes {
            day,
            field,
            minutes,
        });
    }
    Ok(())
}

// PostgreSQL text columns cannot hold NUL.
fn check_text(day: usize, field: &'static str, value: &str) -> Result<(), ProposalError> {
    if value.contains('\0') {
        return Err(ProposalError::NulCharacter { day, field });
    }
    Ok(())
}

fn check_day_count(plan: &ProposedPlan, expected: usize) -> Result<(), ProposalError> {
    if plan.days.len() == expected {
        Ok(())
    } else {
        Err(ProposalError::WrongDayCount {
            expected,
            actual: plan.days.len(),
        })
    }
}
