//! Integration tests for weekly availability, initial weekly generation and
//! task completion.

use std::time::Duration;

use uuid::Uuid;

use studyweek_core::EngineError;
use studyweek_core::plan::{
    create_weekly_plan, get_weekly_availability, list_day_plans_with_tasks, materialize_week,
    set_task_completed,
};
use studyweek_core::proposer::{
    DEFAULT_TIMEOUT, ProposalError, ProposedDay, ProposedPlan, ProposedTask, ProposerError,
};
use studyweek_db::models::Weekday;
use studyweek_db::queries::day_plans;
use studyweek_test_utils::fixtures::{
    block, date, insert_plan_with_tasks, insert_student, set_routine, tasks_of,
};
use studyweek_test_utils::{ScriptedProposer, TestDb};

async fn student_with_routine(pool: &sqlx::PgPool) -> Uuid {
    let student = insert_student(pool, "Mina").await;
    set_routine(
        pool,
        student.id,
        &[
            block("MON", "18:00", "20:00"),
            block("WED", "18:00", "19:30"),
            block("SAT", "14:00", "15:00"),
            block("SAT", "10:00", "11:00"),
        ],
    )
    .await;
    student.id
}

/// Seven days of one `minutes`-long task each.
fn proposed_week(minutes: i32) -> ProposedPlan {
    let days = (1..=7)
        .map(|i| ProposedDay {
            date: None,
            focus: format!("Day {i}"),
            total_planned_minutes: minutes,
            tasks: vec![ProposedTask {
                sequence: 1,
                category: "math".into(),
                title: format!("Drill {i}"),
                assigned_minutes: minutes,
                time_slot: None,
                difficulty: None,
                instruction: None,
                rest_after_minutes: 0,
            }],
        })
        .collect();
    ProposedPlan { days }
}

async fn stored_task_count(pool: &sqlx::PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn availability_reports_every_weekday() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student_id = student_with_routine(&pool).await;

    let report = get_weekly_availability(&pool, student_id).await.unwrap();
    assert_eq!(report.total_week_minutes, 330);
    assert_eq!(report.daily_totals.len(), 7);
    let minutes: Vec<i32> = report.daily_totals.iter().map(|d| d.total_minutes).collect();
    assert_eq!(minutes, vec![120, 0, 90, 0, 0, 120, 0]);
    assert_eq!(report.blocks.len(), 4);
    assert_eq!(report.blocks[2].weekday, Weekday::Sat);
    assert!(report.blocks[2].start_time < report.blocks[3].start_time);

    let missing = get_weekly_availability(&pool, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(EngineError::StudentNotFound(_))));

    db.teardown().await;
}

#[tokio::test]
async fn creates_seven_plans_from_next_monday() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student_id = student_with_routine(&pool).await;
    let proposer = ScriptedProposer::new();

    // 2026-10-16 is a Friday; the default start is the following Monday.
    let week = create_weekly_plan(
        &pool,
        &proposer,
        student_id,
        None,
        date(2026, 10, 16),
        DEFAULT_TIMEOUT,
    )
    .await
    .unwrap();

    assert_eq!(week.start_date, date(2026, 10, 19));
    assert_eq!(week.end_date, date(2026, 10, 25));
    assert_eq!(week.day_plan_ids.len(), 7);
    assert_eq!(week.summary.total_minutes, 330);
    assert_eq!(week.summary.category_minutes.get("study"), Some(&330));
    assert_eq!(week.summary.focus_areas.len(), 3);
    assert_eq!(proposer.call_count(), 1);
    assert_eq!(proposer.calls()[0].days, 7);

    let plans = list_day_plans_with_tasks(&pool, student_id, None, None)
        .await
        .unwrap();
    assert_eq!(plans.len(), 7);
    for (i, plan) in plans.iter().enumerate() {
        assert_eq!(plan.plan.id, week.day_plan_ids[i]);
        let sequences: Vec<i32> = plan.tasks.iter().map(|t| t.sequence).collect();
        let expected: Vec<i32> = (1..=plan.tasks.len() as i32).collect();
        assert_eq!(sequences, expected);
    }

    let saturday = &plans[5];
    assert_eq!(saturday.plan.plan_date, date(2026, 10, 24));
    assert_eq!(saturday.tasks.len(), 2);
    assert_eq!(saturday.total_minutes(), 120);
    assert_eq!(saturday.plan.target_minutes, 120);

    // A day without blocks still gets a plan, titled by date.
    let tuesday = &plans[1];
    assert!(tuesday.tasks.is_empty());
    assert_eq!(tuesday.plan.title, "2026-10-20 study plan");

    db.teardown().await;
}

#[tokio::test]
async fn existing_plan_in_the_week_is_a_conflict() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student_id = student_with_routine(&pool).await;
    let existing = insert_plan_with_tasks(&pool, student_id, date(2026, 10, 21), 2, 30).await;
    let proposer = ScriptedProposer::new();

    let result = create_weekly_plan(
        &pool,
        &proposer,
        student_id,
        Some(date(2026, 10, 19)),
        date(2026, 10, 16),
        DEFAULT_TIMEOUT,
    )
    .await;

    match result {
        Err(EngineError::PlanAlreadyExists { date: d }) => assert_eq!(d, date(2026, 10, 21)),
        other => panic!("expected PlanAlreadyExists, got {other:?}"),
    }
    assert_eq!(proposer.call_count(), 0);

    let plans = day_plans::list_day_plans(&pool, student_id, None, None)
        .await
        .unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(tasks_of(&pool, existing.id).await.len(), 2);

    db.teardown().await;
}

#[tokio::test]
async fn materializing_over_an_existing_day_keeps_nothing() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student_id = student_with_routine(&pool).await;
    let start = date(2026, 10, 19);
    let existing = insert_plan_with_tasks(&pool, student_id, date(2026, 10, 22), 3, 20).await;

    let result = materialize_week(&pool, student_id, start, &proposed_week(30)).await;
    match result {
        Err(EngineError::PlanAlreadyExists { date: d }) => assert_eq!(d, date(2026, 10, 22)),
        other => panic!("expected PlanAlreadyExists, got {other:?}"),
    }

    let plans = day_plans::list_day_plans(&pool, student_id, None, None)
        .await
        .unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].id, existing.id);
    assert_eq!(stored_task_count(&pool).await, 3);

    db.teardown().await;
}

#[tokio::test]
async fn failed_insert_rolls_back_the_whole_week() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student_id = student_with_routine(&pool).await;
    let start = date(2026, 10, 19);

    // Fail the fifth day's insert after four days and their tasks went in.
    sqlx::query(
        "CREATE FUNCTION reject_friday_plan() RETURNS trigger AS $$ \
         BEGIN \
             IF NEW.plan_date = DATE '2026-10-23' THEN \
                 RAISE EXCEPTION 'day plan rejected for %', NEW.plan_date; \
             END IF; \
             RETURN NEW; \
         END \
         $$ LANGUAGE plpgsql",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_friday_plan BEFORE INSERT ON day_plans \
         FOR EACH ROW EXECUTE FUNCTION reject_friday_plan()",
    )
    .execute(&pool)
    .await
    .unwrap();

    let result = materialize_week(&pool, student_id, start, &proposed_week(30)).await;
    match result {
        Err(EngineError::Persistence(e)) => {
            assert!(format!("{e:#}").contains("day plan rejected"));
        }
        other => panic!("expected Persistence, got {other:?}"),
    }

    let plans = day_plans::list_day_plans(&pool, student_id, None, None)
        .await
        .unwrap();
    assert!(plans.is_empty());
    assert_eq!(stored_task_count(&pool).await, 0);

    db.teardown().await;
}

#[tokio::test]
async fn oversized_week_is_rejected_before_storing() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student_id = student_with_routine(&pool).await;

    let result =
        materialize_week(&pool, student_id, date(2026, 10, 19), &proposed_week(i32::MAX)).await;
    assert!(matches!(
        result,
        Err(EngineError::Proposer(ProposerError::InvalidProposal(
            ProposalError::TooManyMinutes { day: 0, .. }
        )))
    ));

    let plans = day_plans::list_day_plans(&pool, student_id, None, None)
        .await
        .unwrap();
    assert!(plans.is_empty());

    db.teardown().await;
}

#[tokio::test]
async fn proposer_failure_stores_nothing() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student_id = student_with_routine(&pool).await;
    let start = date(2026, 10, 19);

    let failing = ScriptedProposer::new().failing_on(start);
    let result = create_weekly_plan(
        &pool,
        &failing,
        student_id,
        Some(start),
        date(2026, 10, 16),
        DEFAULT_TIMEOUT,
    )
    .await;
    assert!(matches!(
        result,
        Err(EngineError::Proposer(ProposerError::Unavailable(_)))
    ));

    let invalid = ScriptedProposer::new().invalid_on(start);
    let result = create_weekly_plan(
        &pool,
        &invalid,
        student_id,
        Some(start),
        date(2026, 10, 16),
        DEFAULT_TIMEOUT,
    )
    .await;
    assert!(matches!(
        result,
        Err(EngineError::Proposer(ProposerError::InvalidProposal(
            ProposalError::SequenceGap { day: 0, .. }
        )))
    ));

    let plans = day_plans::list_day_plans(&pool, student_id, None, None)
        .await
        .unwrap();
    assert!(plans.is_empty());

    db.teardown().await;
}

#[tokio::test]
async fn slow_proposer_times_out() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student_id = student_with_routine(&pool).await;
    let proposer = ScriptedProposer::new().with_delay(Duration::from_secs(30));

    let result = create_weekly_plan(
        &pool,
        &proposer,
        student_id,
        Some(date(2026, 10, 19)),
        date(2026, 10, 16),
        Duration::from_millis(50),
    )
    .await;
    assert!(matches!(
        result,
        Err(EngineError::Proposer(ProposerError::Timeout(_)))
    ));

    db.teardown().await;
}

#[tokio::test]
async fn student_without_routine_cannot_plan() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student = insert_student(&pool, "Joon").await;
    let proposer = ScriptedProposer::new();

    let result = create_weekly_plan(
        &pool,
        &proposer,
        student.id,
        None,
        date(2026, 10, 16),
        DEFAULT_TIMEOUT,
    )
    .await;
    assert!(matches!(result, Err(EngineError::NoRoutine(id)) if id == student.id));
    assert_eq!(proposer.call_count(), 0);

    db.teardown().await;
}

#[tokio::test]
async fn completing_every_task_completes_the_plan() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student = insert_student(&pool, "Mina").await;
    let plan = insert_plan_with_tasks(&pool, student.id, date(2026, 10, 24), 2, 30).await;
    let tasks = tasks_of(&pool, plan.id).await;

    let after_first = set_task_completed(&pool, tasks[0].id, true).await.unwrap();
    assert!(!after_first.plan.is_completed);
    assert!(after_first.tasks[0].is_completed);

    let after_second = set_task_completed(&pool, tasks[1].id, true).await.unwrap();
    assert!(after_second.plan.is_completed);

    let reopened = set_task_completed(&pool, tasks[1].id, false).await.unwrap();
    assert!(!reopened.plan.is_completed);
    assert!(reopened.tasks[1].completed_at.is_none());

    let missing = set_task_completed(&pool, Uuid::new_v4(), true).await;
    assert!(matches!(missing, Err(EngineError::TaskNotFound(_))));

    db.teardown().await;
}
