//! Row fixtures for integration tests. All helpers panic on failure.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use studyweek_core::routine::{TimeBlockInput, validate_routine};
use studyweek_db::models::{CognitiveType, DayPlan, Student, Task, TimeBlock};
use studyweek_db::queries::students::{self, NewStudent};
use studyweek_db::queries::tasks::{self, NewTask};
use studyweek_db::queries::{day_plans, time_blocks};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn block(weekday: &str, start: &str, end: &str) -> TimeBlockInput {
    TimeBlockInput::new(weekday, start, end)
}

pub async fn insert_student(pool: &PgPool, name: &str) -> Student {
    let subjects = vec!["math".to_owned(), "english".to_owned()];
    students::insert_student(
        pool,
        &NewStudent {
            name,
            school_grade: 2,
            semester: 1,
            subjects: &subjects,
            cognitive_type: CognitiveType::PrecisionFirst,
        },
    )
    .await
    .expect("insert student")
}

/// Validate and store a routine as the student's only time blocks.
pub async fn set_routine(
    pool: &PgPool,
    student_id: Uuid,
    blocks: &[TimeBlockInput],
) -> Vec<TimeBlock> {
    let specs = validate_routine(blocks).expect("fixture routine should be valid");
    let rows: Vec<_> = specs.iter().map(|s| s.as_new_block()).collect();
    let mut conn = pool.acquire().await.expect("acquire connection");
    let (_, inserted) = time_blocks::replace_time_blocks(&mut *conn, student_id, &rows)
        .await
        .expect("replace time blocks");
    inserted
}

/// A day plan on `date` with `task_count` tasks of `minutes` each.
pub async fn insert_plan_with_tasks(
    pool: &PgPool,
    student_id: Uuid,
    date: NaiveDate,
    task_count: i32,
    minutes: i32,
) -> DayPlan {
    let plan = day_plans::insert_day_plan(
        pool,
        student_id,
        date,
        &format!("fixture plan {date}"),
        task_count * minutes,
    )
    .await
    .expect("insert day plan");

    for sequence in 1..=task_count {
        let title = format!("fixture task {sequence}");
        tasks::insert_task(
            pool,
            plan.id,
            &NewTask {
                sequence,
                category: "review",
                title: &title,
                assigned_minutes: minutes,
                time_slot: None,
                difficulty: None,
                instruction: None,
                rest_after_minutes: 5,
            },
        )
        .await
        .expect("insert task");
    }
    plan
}

pub async fn tasks_of(pool: &PgPool, day_plan_id: Uuid) -> Vec<Task> {
    tasks::list_tasks_for_plan(pool, day_plan_id)
        .await
        .expect("list tasks")
}
