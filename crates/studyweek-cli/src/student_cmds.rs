//! Handlers for `studyweek student` subcommands.
//!
//! - `studyweek student add`    -- register a student profile
//! - `studyweek student habit`  -- record a per-subject habit summary

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use studyweek_core::plan::load_student;
use studyweek_db::queries::students::{self, NewStudent};

use crate::StudentCommands;

pub async fn run_student_command(command: StudentCommands, pool: &PgPool) -> Result<()> {
    match command {
        StudentCommands::Add {
            name,
            grade,
            semester,
            subjects,
            style,
        } => {
            let student = students::insert_student(
                pool,
                &NewStudent {
                    name: &name,
                    school_grade: grade,
                    semester,
                    subjects: &subjects,
                    cognitive_type: style,
                },
            )
            .await?;

            println!("Student created.");
            println!();
            println!("  ID:        {}", student.id);
            println!("  Name:      {}", student.name);
            println!("  Grade:     {} (semester {})", student.school_grade, student.semester);
            println!("  Subjects:  {}", student.subjects.join(", "));
            println!("  Style:     {}", student.cognitive_type);
            println!();
            println!("Next: `studyweek routine update {} <routine.toml>`", student.id);
            Ok(())
        }
        StudentCommands::Habit {
            student_id,
            subject,
            summary,
            tags,
        } => cmd_habit(pool, student_id, &subject, &summary, &tags).await,
    }
}

async fn cmd_habit(
    pool: &PgPool,
    student_id: Uuid,
    subject: &str,
    summary: &str,
    tags: &[String],
) -> Result<()> {
    load_student(pool, student_id).await?;
    let log = students::insert_habit_log(pool, student_id, subject, summary, tags).await?;
    println!("Habit log {} recorded for {subject}.", log.id);
    Ok(())
}
