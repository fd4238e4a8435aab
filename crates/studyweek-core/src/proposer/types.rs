//! Request and response types exchanged with a [`super::PlanProposer`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use studyweek_db::models::{CognitiveType, Difficulty, Student, Weekday};
use studyweek_db::queries::tasks::NewTask;

use crate::routine::{TimeBlockSpec, WeeklyAvailability, describe_day_blocks};

/// Profile fields the proposer tailors a plan to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentContext {
    pub student_id: Uuid,
    pub name: String,
    pub school_grade: i32,
    pub semester: i32,
    pub subjects: Vec<String>,
    pub cognitive_type: CognitiveType,
}

impl From<&Student> for StudentContext {
    fn from(student: &Student) -> Self {
        Self {
            student_id: student.id,
            name: student.name.clone(),
            school_grade: student.school_grade,
            semester: student.semester,
            subjects: student.subjects.clone(),
            cognitive_type: student.cognitive_type,
        }
    }
}

/// How much of the week a proposal covers.
#[derive(Debug, Clone, Copy)]
pub enum AvailabilityScope<'a> {
    /// Initial generation: seven days starting at `start_date`.
    Week {
        start_date: NaiveDate,
        availability: &'a WeeklyAvailability,
    },
    /// Regeneration of one date using that weekday's blocks.
    Day {
        date: NaiveDate,
        weekday: Weekday,
        blocks: &'a [TimeBlockSpec],
    },
}

impl AvailabilityScope<'_> {
    /// Number of days a valid proposal for this scope contains.
    pub fn expected_days(&self) -> usize {
        match self {
            Self::Week { .. } => 7,
            Self::Day { .. } => 1,
        }
    }

    pub fn first_date(&self) -> NaiveDate {
        match self {
            Self::Week { start_date, .. } => *start_date,
            Self::Day { date, .. } => *date,
        }
    }

    /// Availability text for the prompt.
    pub fn describe(&self) -> String {
        match self {
            Self::Week { availability, .. } => availability.describe(),
            Self::Day {
                weekday, blocks, ..
            } => describe_day_blocks(*weekday, blocks),
        }
    }
}

/// Everything a proposer needs for one call.
#[derive(Debug, Clone, Copy)]
pub struct ProposalRequest<'a> {
    pub student: &'a StudentContext,
    pub habit_summary: &'a str,
    pub scope: AvailabilityScope<'a>,
}

/// A proposed schedule: seven days for a week request, one for a day request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedPlan {
    pub days: Vec<ProposedDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedDay {
    /// Date the proposer had in mind. Materialization positions days by
    /// index, so this is informational.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub total_planned_minutes: i32,
    #[serde(default)]
    pub tasks: Vec<ProposedTask>,
}

impl ProposedDay {
    /// Day-plan title: the stated focus, or a dated fallback when blank.
    pub fn title_for(&self, date: NaiveDate) -> String {
        let focus = self.focus.trim();
        if focus.is_empty() {
            format!("{date} study plan")
        } else {
            focus.to_owned()
        }
    }

    pub fn task_minutes(&self) -> i64 {
        self.tasks.iter().map(|t| i64::from(t.assigned_minutes)).sum()
    }

    pub fn new_tasks(&self) -> Vec<NewTask<'_>> {
        self.tasks.iter().map(ProposedTask::as_new_task).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedTask {
    pub sequence: i32,
    pub category: String,
    pub title: String,
    pub assigned_minutes: i32,
    #[serde(default)]
    pub time_slot: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub instruction: Option<String>,
    #[serde(default)]
    pub rest_after_minutes: i32,
}

impl ProposedTask {
    pub fn as_new_task(&self) -> NewTask<'_> {
        NewTask {
            sequence: self.sequence,
            category: &self.category,
            title: &self.title,
            assigned_minutes: self.assigned_minutes,
            time_slot: self.time_slot.as_deref(),
            difficulty: self.difficulty,
            instruction: self.instruction.as_deref(),
            rest_after_minutes: self.rest_after_minutes,
        }
    }
}
