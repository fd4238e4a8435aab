//! Per-day outcomes and the report returned by a routine update.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use studyweek_db::models::{DayPlan, Weekday};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Regenerated,
    Unchanged,
    Failed,
}

/// Task count and minutes before and after a successful regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanChanges {
    pub old_tasks_count: i64,
    pub new_tasks_count: i64,
    pub old_minutes: i64,
    pub new_minutes: i64,
}

/// What happened to one future, incomplete day plan.
///
/// `tasks_count` and `total_minutes` describe the plan as it stands after
/// the update: the new tasks when regenerated, the untouched ones otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenerationOutcome {
    pub plan_id: Uuid,
    pub plan_date: NaiveDate,
    pub weekday: Weekday,
    pub affected: bool,
    pub status: OutcomeStatus,
    pub tasks_count: i64,
    pub total_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<PlanChanges>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RegenerationOutcome {
    pub fn unchanged(plan: &DayPlan, tasks_count: i64, total_minutes: i64) -> Self {
        Self {
            plan_id: plan.id,
            plan_date: plan.plan_date,
            weekday: plan.weekday(),
            affected: false,
            status: OutcomeStatus::Unchanged,
            tasks_count,
            total_minutes,
            changes: None,
            error_message: None,
        }
    }

    pub fn failed(
        plan: &DayPlan,
        tasks_count: i64,
        total_minutes: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            plan_id: plan.id,
            plan_date: plan.plan_date,
            weekday: plan.weekday(),
            affected: true,
            status: OutcomeStatus::Failed,
            tasks_count,
            total_minutes,
            changes: None,
            error_message: Some(message.into()),
        }
    }

    pub fn regenerated(plan: &DayPlan, changes: PlanChanges) -> Self {
        Self {
            plan_id: plan.id,
            plan_date: plan.plan_date,
            weekday: plan.weekday(),
            affected: true,
            status: OutcomeStatus::Regenerated,
            tasks_count: changes.new_tasks_count,
            total_minutes: changes.new_minutes,
            changes: Some(changes),
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenerationSummary {
    pub total_plans: usize,
    pub regenerated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl RegenerationSummary {
    pub fn tally(outcomes: &[RegenerationOutcome]) -> Self {
        outcomes.iter().fold(
            Self {
                total_plans: outcomes.len(),
                ..Self::default()
            },
            |mut acc, o| {
                match o.status {
                    OutcomeStatus::Regenerated => acc.regenerated += 1,
                    OutcomeStatus::Unchanged => acc.unchanged += 1,
                    OutcomeStatus::Failed => acc.failed += 1,
                }
                acc
            },
        )
    }
}

/// Result of a routine update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenerationReport {
    /// Ids of the inserted time blocks, in submission order.
    pub updated_block_ids: Vec<Uuid>,
    /// Number of time blocks the update replaced.
    pub deleted_count: u64,
    pub outcomes: Vec<RegenerationOutcome>,
    pub summary: RegenerationSummary,
}

impl RegenerationReport {
    pub fn new(
        updated_block_ids: Vec<Uuid>,
        deleted_count: u64,
        outcomes: Vec<RegenerationOutcome>,
    ) -> Self {
        let summary = RegenerationSummary::tally(&outcomes);
        Self {
            updated_block_ids,
            deleted_count,
            outcomes,
            summary,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    pub fn outcome_for(&self, date: NaiveDate) -> Option<&RegenerationOutcome> {
        self.outcomes.iter().find(|o| o.plan_date == date)
    }
}
