//! Database query functions for the `students` and `habit_logs` tables.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{CognitiveType, HabitLog, Student};

/// Parameters for inserting a new student row.
#[derive(Debug, Clone)]
pub struct NewStudent<'a> {
    pub name: &'a str,
    pub school_grade: i32,
    pub semester: i32,
    pub subjects: &'a [String],
    pub cognitive_type: CognitiveType,
}

pub async fn insert_student<'e, E>(executor: E, new: &NewStudent<'_>) -> Result<Student>
where
    E: PgExecutor<'e>,
{
    let student = sqlx::query_as::<_, Student>(
        "INSERT INTO students (name, school_grade, semester, subjects, cognitive_type) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.school_grade)
    .bind(new.semester)
    .bind(new.subjects)
    .bind(new.cognitive_type)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert student {:?}", new.name))?;

    Ok(student)
}

pub async fn get_student<'e, E>(executor: E, id: Uuid) -> Result<Option<Student>>
where
    E: PgExecutor<'e>,
{
    let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch student")?;

    Ok(student)
}

/// Record a habit summary for one subject.
pub async fn insert_habit_log<'e, E>(
    executor: E,
    student_id: Uuid,
    subject: &str,
    summary: &str,
    tags: &[String],
) -> Result<HabitLog>
where
    E: PgExecutor<'e>,
{
    let log = sqlx::query_as::<_, HabitLog>(
        "INSERT INTO habit_logs (student_id, subject, summary, tags) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(student_id)
    .bind(subject)
    .bind(summary)
    .bind(tags)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert habit log for subject {subject:?}"))?;

    Ok(log)
}

/// All habit logs of a student, oldest first.
pub async fn list_habit_logs<'e, E>(executor: E, student_id: Uuid) -> Result<Vec<HabitLog>>
where
    E: PgExecutor<'e>,
{
    let logs = sqlx::query_as::<_, HabitLog>(
        "SELECT * FROM habit_logs WHERE student_id = $1 ORDER BY created_at ASC, subject ASC",
    )
    .bind(student_id)
    .fetch_all(executor)
    .await
    .context("failed to list habit logs")?;

    Ok(logs)
}
