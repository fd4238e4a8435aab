//! Deterministic [`PlanProposer`] for engine tests.
//!
//! Every block becomes one task covering the whole block, so the expected
//! task count and minutes of any day follow directly from its routine.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use uuid::Uuid;

use studyweek_core::proposer::{
    AvailabilityScope, PlanProposer, ProposalRequest, ProposedDay, ProposedPlan, ProposedTask,
    ProposerError,
};
use studyweek_core::routine::TimeBlockSpec;
use studyweek_db::models::{Difficulty, Weekday};

/// One recorded `propose` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposerCall {
    pub student_id: Uuid,
    pub first_date: NaiveDate,
    pub days: usize,
}

#[derive(Debug, Default)]
pub struct ScriptedProposer {
    failing: HashSet<NaiveDate>,
    invalid: HashSet<NaiveDate>,
    nul_text: HashSet<NaiveDate>,
    oversized: HashSet<NaiveDate>,
    delay: Option<Duration>,
    calls: Mutex<Vec<ProposerCall>>,
}

impl ScriptedProposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls whose first date is `date` fail with `Unavailable`.
    pub fn failing_on(mut self, date: NaiveDate) -> Self {
        self.failing.insert(date);
        self
    }

    /// Calls whose first date is `date` return a day with a sequence gap.
    pub fn invalid_on(mut self, date: NaiveDate) -> Self {
        self.invalid.insert(date);
        self
    }

    /// Calls whose first date is `date` return a task title containing NUL.
    pub fn nul_text_on(mut self, date: NaiveDate) -> Self {
        self.nul_text.insert(date);
        self
    }

    /// Calls whose first date is `date` return a task of `i32::MAX` minutes.
    pub fn oversized_on(mut self, date: NaiveDate) -> Self {
        self.oversized.insert(date);
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<ProposerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn day(&self, date: NaiveDate, blocks: &[TimeBlockSpec]) -> ProposedDay {
        let mut tasks: Vec<ProposedTask> = blocks
            .iter()
            .zip(1..)
            .map(|(block, sequence)| ProposedTask {
                sequence,
                category: block.category.clone().unwrap_or_else(|| "study".into()),
                title: format!("{} session {sequence}", Weekday::of(date).name()),
                assigned_minutes: block.minutes,
                time_slot: Some(block.span()),
                difficulty: Some(Difficulty::Medium),
                instruction: block.label.clone(),
                rest_after_minutes: 0,
            })
            .collect();

        if let Some(last) = tasks.last_mut() {
            if self.invalid.contains(&date) {
                last.sequence += 5;
            }
            if self.nul_text.contains(&date) {
                last.title.push('\0');
            }
            if self.oversized.contains(&date) {
                last.assigned_minutes = i32::MAX;
            }
        }

        let total = tasks
            .iter()
            .map(|t| t.assigned_minutes)
            .fold(0, i32::saturating_add);
        ProposedDay {
            date: Some(date),
            focus: if tasks.is_empty() {
                String::new()
            } else {
                format!("Scripted plan for {date}")
            },
            total_planned_minutes: total,
            tasks,
        }
    }
}

#[async_trait]
impl PlanProposer for ScriptedProposer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn propose(&self, request: &ProposalRequest<'_>) -> Result<ProposedPlan, ProposerError> {
        let first_date = request.scope.first_date();
        self.calls.lock().unwrap().push(ProposerCall {
            student_id: request.student.student_id,
            first_date,
            days: request.scope.expected_days(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&first_date) {
            return Err(ProposerError::Unavailable(format!(
                "scripted failure for {first_date}"
            )));
        }

        let days = match request.scope {
            AvailabilityScope::Week {
                start_date,
                availability,
            } => (0..7)
                .map(|i| {
                    let date = start_date + Days::new(i);
                    self.day(date, availability.blocks_for(Weekday::of(date)))
                })
                .collect(),
            AvailabilityScope::Day { date, blocks, .. } => vec![self.day(date, blocks)],
        };
        Ok(ProposedPlan { days })
    }
}
