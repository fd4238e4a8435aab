//! Cross-day summary of a weekly proposal.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::proposer::ProposedPlan;

/// Maximum number of focus labels reported.
pub const MAX_FOCUS_AREAS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySummary {
    /// Sum of assigned minutes over every task of the week.
    pub total_minutes: i64,
    /// Minutes per task category.
    pub category_minutes: BTreeMap<String, i64>,
    /// First distinct non-blank day focuses, in order of first appearance.
    pub focus_areas: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn summarize_week(plan: &ProposedPlan, start_date: NaiveDate) -> WeeklySummary {
    let mut category_minutes: BTreeMap<String, i64> = BTreeMap::new();
    let mut focus_areas: Vec<String> = Vec::new();

    for day in &plan.days {
        let focus = day.focus.trim();
        if !focus.is_empty()
            && focus_areas.len() < MAX_FOCUS_AREAS
            && !focus_areas.iter().any(|f| f == focus)
        {
            focus_areas.push(focus.to_owned());
        }
        for task in &day.tasks {
            *category_minutes.entry(task.category.clone()).or_default() +=
                i64::from(task.assigned_minutes);
        }
    }

    WeeklySummary {
        total_minutes: category_minutes.values().sum(),
        category_minutes,
        focus_areas,
        start_date,
        end_date: start_date + Days::new(6),
    }
}
