//! Prompt text for chat-completion proposers.

use std::fmt::Write as _;

use studyweek_db::models::Weekday;

use super::types::{AvailabilityScope, ProposalRequest};

pub const SYSTEM_PROMPT: &str = "You are a tutor who builds study schedules tailored to one \
student's learning style. Reply with a single JSON object and nothing else.";

/// Build the user message for one proposal request.
pub fn build_user_prompt(request: &ProposalRequest<'_>) -> String {
    let student = request.student;
    let mut out = String::new();

    let _ = writeln!(out, "# Student");
    let _ = writeln!(out, "- id: {}", student.student_id);
    let _ = writeln!(out, "- name: {}", student.name);
    let _ = writeln!(out, "- school grade: {}", student.school_grade);
    let _ = writeln!(out, "- semester: {}", student.semester);
    let _ = writeln!(out, "- subjects: {}", student.subjects.join(", "));
    let _ = writeln!(out);

    let _ = writeln!(out, "# Learning style");
    let _ = writeln!(out, "type: {}", student.cognitive_type);
    let _ = writeln!(out, "pacing: {}", student.cognitive_type.strategy());
    let _ = writeln!(out);

    let _ = writeln!(out, "# Problem-solving habits");
    let _ = writeln!(out, "{}", request.habit_summary.trim());
    let _ = writeln!(out);

    let _ = writeln!(out, "# Available time");
    out.push_str(&request.scope.describe());
    let _ = writeln!(out);

    let _ = writeln!(out, "# Task");
    match request.scope {
        AvailabilityScope::Week { start_date, .. } => {
            let _ = writeln!(
                out,
                "Plan 7 consecutive days starting {start_date} (a {}). \
                 Days without available time get an empty task list.",
                Weekday::of(start_date).name()
            );
        }
        AvailabilityScope::Day { date, weekday, .. } => {
            let _ = writeln!(
                out,
                "Plan the single day {date} ({}) using only the blocks listed above.",
                weekday.name()
            );
        }
    }
    out.push_str(RULES);
    out.push_str(OUTPUT_FORMAT);
    out
}

const RULES: &str = "
Rules:
- Use 90-95% of each day's available time, in blocks of at least 15 minutes.
- Insert rest according to the pacing above (rest_after_minutes).
- Hard material in the morning, review and memorisation in the evening.
- Avoid the same subject twice in a row.
- Titles name the unit or page range; instructions say what to do, how long and how.
- Number tasks of each day 1, 2, 3, ... without gaps; assigned_minutes must be positive.
";

const OUTPUT_FORMAT: &str = r#"
Output format:
{
  "weekly_plan": [
    {
      "date": "YYYY-MM-DD",
      "daily_focus": "short focus of the day",
      "total_planned_minutes": 115,
      "tasks": [
        {
          "sequence": 1,
          "category": "math",
          "title": "Quadratic equations, textbook p.42-45",
          "assigned_minutes": 25,
          "time_slot": "18:00-18:25",
          "difficulty": "high | medium | low",
          "instruction": "Write every intermediate step for each of the 5 problems.",
          "rest_after_minutes": 5
        }
      ]
    }
  ]
}
"#;
