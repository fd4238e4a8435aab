//! Weekly availability: validated blocks grouped by weekday.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use studyweek_db::models::{TimeBlock, Weekday};

use super::validate::TimeBlockSpec;

/// Total minutes available on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    pub weekday: Weekday,
    pub total_minutes: i32,
}

/// A student's blocks grouped by weekday, each day ordered by start time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyAvailability {
    days: BTreeMap<Weekday, Vec<TimeBlockSpec>>,
}

impl WeeklyAvailability {
    pub fn from_blocks(blocks: impl IntoIterator<Item = TimeBlockSpec>) -> Self {
        let mut days: BTreeMap<Weekday, Vec<TimeBlockSpec>> = BTreeMap::new();
        for block in blocks {
            days.entry(block.weekday).or_default().push(block);
        }
        for blocks in days.values_mut() {
            blocks.sort_by_key(|b| (b.start, b.end));
        }
        Self { days }
    }

    pub fn from_rows(rows: &[TimeBlock]) -> Self {
        Self::from_blocks(rows.iter().map(TimeBlockSpec::from))
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Blocks on one weekday; empty when the student has none.
    pub fn blocks_for(&self, weekday: Weekday) -> &[TimeBlockSpec] {
        self.days.get(&weekday).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_minutes(&self, weekday: Weekday) -> i32 {
        self.blocks_for(weekday).iter().map(|b| b.minutes).sum()
    }

    /// All seven weekdays in week order, zero for days without blocks.
    pub fn daily_totals(&self) -> Vec<DailyTotal> {
        Weekday::ALL
            .into_iter()
            .map(|weekday| DailyTotal {
                weekday,
                total_minutes: self.total_minutes(weekday),
            })
            .collect()
    }

    pub fn total_week_minutes(&self) -> i32 {
        self.days.values().flatten().map(|b| b.minutes).sum()
    }

    /// Weekdays that have at least one block, in week order.
    pub fn weekdays(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.days.keys().copied()
    }

    /// Plain-text availability listing handed to the plan proposer.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "No study time is available this week.\n".to_owned();
        }
        let mut out = String::new();
        for (weekday, blocks) in &self.days {
            describe_day(&mut out, *weekday, blocks);
        }
        out
    }
}

/// Text for a single weekday's blocks, in the same layout as
/// [`WeeklyAvailability::describe`].
pub fn describe_day_blocks(weekday: Weekday, blocks: &[TimeBlockSpec]) -> String {
    let mut out = String::new();
    describe_day(&mut out, weekday, blocks);
    out
}

fn describe_day(out: &mut String, weekday: Weekday, blocks: &[TimeBlockSpec]) {
    let total: i32 = blocks.iter().map(|b| b.minutes).sum();
    let _ = writeln!(out, "{}: {total} minutes total", weekday.name());
    for (i, block) in blocks.iter().enumerate() {
        let _ = write!(
            out,
            "  - block {}: {} ({} min)",
            i + 1,
            block.span(),
            block.minutes
        );
        if let Some(label) = &block.label {
            let _ = write!(out, " - {label}");
        }
        out.push('\n');
    }
}
