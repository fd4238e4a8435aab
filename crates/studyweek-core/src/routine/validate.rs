//! Parsing and conflict checking for submitted weekly routines.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use studyweek_db::models::{TimeBlock, Weekday};
use studyweek_db::queries::time_blocks::NewTimeBlock;

/// A time block as submitted by a client, before validation.
///
/// Times are `HH:MM` strings (`HH:MM:SS` is also accepted). The duration is
/// optional; when given it must agree with the interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlockInput {
    #[serde(alias = "day_of_week")]
    pub weekday: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default, alias = "total_minutes", skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl TimeBlockInput {
    pub fn new(weekday: &str, start_time: &str, end_time: &str) -> Self {
        Self {
            weekday: weekday.to_owned(),
            start_time: start_time.to_owned(),
            end_time: end_time.to_owned(),
            duration_minutes: None,
            label: None,
            category: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_owned());
        self
    }
}

/// A validated block: parsed weekday and times, duration derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlockSpec {
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub minutes: i32,
    pub label: Option<String>,
    pub category: Option<String>,
}

impl TimeBlockSpec {
    /// Closed-open intervals: touching blocks (`9-10`, `10-11`) do not overlap.
    pub fn overlaps(&self, other: &TimeBlockSpec) -> bool {
        self.weekday == other.weekday && self.start < other.end && other.start < self.end
    }

    /// `"09:00-10:30"`.
    pub fn span(&self) -> String {
        format!("{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }

    pub fn as_new_block(&self) -> NewTimeBlock<'_> {
        NewTimeBlock {
            weekday: self.weekday,
            start_time: self.start,
            end_time: self.end,
            total_minutes: self.minutes,
            label: self.label.as_deref(),
            category: self.category.as_deref(),
        }
    }
}

impl From<&TimeBlock> for TimeBlockSpec {
    fn from(row: &TimeBlock) -> Self {
        Self {
            weekday: row.weekday,
            start: row.start_time,
            end: row.end_time,
            minutes: row.total_minutes,
            label: row.label.clone(),
            category: row.category.clone(),
        }
    }
}

impl fmt::Display for TimeBlockSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.weekday, self.span())?;
        if let Some(label) = &self.label {
            write!(f, " ({label})")?;
        }
        Ok(())
    }
}

/// Reasons a submitted routine is rejected before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutineError {
    #[error("routine must contain at least one time block")]
    EmptyRoutine,

    #[error("block {index}: unknown weekday {value:?}")]
    UnknownWeekday { index: usize, value: String },

    #[error("block {index}: {reason}")]
    MalformedTime { index: usize, reason: String },

    #[error("overlapping blocks on {weekday}: {first} and {second}")]
    ScheduleConflict {
        weekday: Weekday,
        first: String,
        second: String,
    },
}

/// Parse `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

fn parse_block(index: usize, input: &TimeBlockInput) -> Result<TimeBlockSpec, RoutineError> {
    let weekday = input
        .weekday
        .parse::<Weekday>()
        .map_err(|_| RoutineError::UnknownWeekday {
            index,
            value: input.weekday.clone(),
        })?;

    let malformed = |reason: String| RoutineError::MalformedTime { index, reason };

    let start = parse_clock(&input.start_time)
        .ok_or_else(|| malformed(format!("unparsable start time {:?}", input.start_time)))?;
    let end = parse_clock(&input.end_time)
        .ok_or_else(|| malformed(format!("unparsable end time {:?}", input.end_time)))?;

    if start >= end {
        return Err(malformed(format!(
            "start {} is not before end {}",
            input.start_time.trim(),
            input.end_time.trim()
        )));
    }

    let minutes = (end - start).num_minutes() as i32;
    if minutes == 0 {
        return Err(malformed("block is shorter than one minute".to_owned()));
    }
    if let Some(declared) = input.duration_minutes.filter(|d| *d != minutes) {
        return Err(malformed(format!(
            "declared duration {declared} min does not match interval length {minutes} min"
        )));
    }

    let clean = |s: &Option<String>| {
        s.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    Ok(TimeBlockSpec {
        weekday,
        start,
        end,
        minutes,
        label: clean(&input.label),
        category: clean(&input.category),
    })
}

/// Validate a full routine submission.
///
/// Returns the parsed blocks in submission order. Blocks are checked per
/// weekday in week order after sorting by start time, so the reported
/// conflict is the earliest overlapping pair on the first weekday that has
/// one.
pub fn validate_routine(blocks: &[TimeBlockInput]) -> Result<Vec<TimeBlockSpec>, RoutineError> {
    if blocks.is_empty() {
        return Err(RoutineError::EmptyRoutine);
    }

    let specs = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| parse_block(i, b))
        .collect::<Result<Vec<_>, _>>()?;

    for weekday in Weekday::ALL {
        let mut day: Vec<&TimeBlockSpec> = specs.iter().filter(|s| s.weekday == weekday).collect();
        day.sort_by_key(|s| (s.start, s.end));
        if let Some(pair) = day.windows(2).find(|w| w[0].overlaps(w[1])) {
            return Err(RoutineError::ScheduleConflict {
                weekday,
                first: pair[0].to_string(),
                second: pair[1].to_string(),
            });
        }
    }

    Ok(specs)
}
