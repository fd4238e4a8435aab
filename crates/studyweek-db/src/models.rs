use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a stored or submitted enum string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Day of the week, stored as its three-letter code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    /// All weekdays in calendar-week order, Monday first.
    pub const ALL: [Weekday; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    /// The weekday a calendar date falls on.
    pub fn of(date: NaiveDate) -> Self {
        Self::ALL[date.weekday().num_days_from_monday() as usize]
    }

    /// Three-letter code, e.g. `"MON"`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Mon => "MON",
            Self::Tue => "TUE",
            Self::Wed => "WED",
            Self::Thu => "THU",
            Self::Fri => "FRI",
            Self::Sat => "SAT",
            Self::Sun => "SUN",
        }
    }

    /// Full English name, e.g. `"Monday"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Mon => "Monday",
            Self::Tue => "Tuesday",
            Self::Wed => "Wednesday",
            Self::Thu => "Thursday",
            Self::Fri => "Friday",
            Self::Sat => "Saturday",
            Self::Sun => "Sunday",
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Weekday {
    type Err = ParseEnumError;

    /// Accepts the three-letter code or the full name, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|d| upper == d.code() || upper == d.name().to_ascii_uppercase())
            .ok_or_else(|| ParseEnumError::new("weekday", s))
    }
}

// ---------------------------------------------------------------------------

/// How a student prefers to pace study sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CognitiveType {
    SpeedFirst,
    PrecisionFirst,
    BurstStudy,
}

impl CognitiveType {
    /// Session pacing rule handed to the plan proposer.
    pub fn strategy(self) -> &'static str {
        match self {
            Self::SpeedFirst => {
                "short varied sessions: 25 minutes of study then a 5 minute break, \
                 5-10 minutes per problem, at most 2-3 problems of one type in a row"
            }
            Self::PrecisionFirst => {
                "deep repetition: 50 minutes of study then a 10 minute break, \
                 15-20 minutes per problem, 4-6 problems of the same type"
            }
            Self::BurstStudy => {
                "intense blocks: 90 minutes of focus then a 30 minute full rest, \
                 one subject per block, at most 2-3 blocks per day"
            }
        }
    }
}

impl fmt::Display for CognitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SpeedFirst => "speed_first",
            Self::PrecisionFirst => "precision_first",
            Self::BurstStudy => "burst_study",
        };
        f.write_str(s)
    }
}

impl FromStr for CognitiveType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "speed_first" => Ok(Self::SpeedFirst),
            "precision_first" => Ok(Self::PrecisionFirst),
            "burst_study" => Ok(Self::BurstStudy),
            _ => Err(ParseEnumError::new("cognitive type", s)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Difficulty of a single study task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    High,
    Medium,
    Low,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(ParseEnumError::new("difficulty", s)),
        }
    }
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub school_grade: i32,
    pub semester: i32,
    pub subjects: Vec<String>,
    pub cognitive_type: CognitiveType,
    pub created_at: DateTime<Utc>,
}

/// Per-subject summary of a student's problem-solving habits.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HabitLog {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// One available study interval on a weekday.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimeBlock {
    pub id: Uuid,
    pub student_id: Uuid,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub total_minutes: i32,
    pub label: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The materialized plan for one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DayPlan {
    pub id: Uuid,
    pub student_id: Uuid,
    pub plan_date: NaiveDate,
    pub title: String,
    pub target_minutes: i32,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DayPlan {
    pub fn weekday(&self) -> Weekday {
        Weekday::of(self.plan_date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub day_plan_id: Uuid,
    pub sequence: i32,
    pub category: String,
    pub title: String,
    pub assigned_minutes: i32,
    pub time_slot: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub instruction: Option<String>,
    pub rest_after_minutes: i32,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Onboarding answers kept between steps until `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OnboardingDraft {
    pub student_id: Uuid,
    pub answers: serde_json::Value,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
