//! Weekly plans: generation, materialization, summaries and the read path.

pub mod materialize;
pub mod service;
pub mod summary;

pub use materialize::{MaterializedWeek, materialize_week, week_dates};
pub use service::{
    AvailabilityReport, DayPlanWithTasks, NO_HABIT_DATA, create_weekly_plan,
    get_weekly_availability, habit_summary, list_day_plans_with_tasks, load_student, next_monday,
    set_task_completed,
};
pub use summary::{WeeklySummary, summarize_week};
