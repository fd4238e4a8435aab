//! Integration tests for time-block queries.

use chrono::NaiveTime;

use studyweek_db::models::Weekday;
use studyweek_db::queries::time_blocks::{self, NewTimeBlock};
use studyweek_test_utils::fixtures::insert_student;
use studyweek_test_utils::TestDb;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn new_block(weekday: Weekday, start: NaiveTime, end: NaiveTime) -> NewTimeBlock<'static> {
    NewTimeBlock {
        weekday,
        start_time: start,
        end_time: end,
        total_minutes: ((end - start).num_minutes()) as i32,
        label: None,
        category: None,
    }
}

#[tokio::test]
async fn list_orders_monday_first_then_by_start() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student = insert_student(&pool, "Mina").await;

    for block in [
        new_block(Weekday::Sun, t(9, 0), t(10, 0)),
        new_block(Weekday::Mon, t(18, 0), t(20, 0)),
        new_block(Weekday::Wed, t(7, 0), t(8, 0)),
        new_block(Weekday::Mon, t(7, 0), t(7, 30)),
    ] {
        time_blocks::insert_time_block(&pool, student.id, &block)
            .await
            .unwrap();
    }

    let rows = time_blocks::list_time_blocks(&pool, student.id).await.unwrap();
    let order: Vec<(Weekday, NaiveTime)> = rows.iter().map(|b| (b.weekday, b.start_time)).collect();
    assert_eq!(
        order,
        vec![
            (Weekday::Mon, t(7, 0)),
            (Weekday::Mon, t(18, 0)),
            (Weekday::Wed, t(7, 0)),
            (Weekday::Sun, t(9, 0)),
        ]
    );

    let monday = time_blocks::list_time_blocks_for_weekday(&pool, student.id, Weekday::Mon)
        .await
        .unwrap();
    assert_eq!(monday.len(), 2);
    assert_eq!(monday[0].total_minutes, 30);

    db.teardown().await;
}

#[tokio::test]
async fn replace_swaps_the_whole_routine() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student = insert_student(&pool, "Mina").await;
    let other = insert_student(&pool, "Joon").await;

    time_blocks::insert_time_block(&pool, student.id, &new_block(Weekday::Mon, t(18, 0), t(20, 0)))
        .await
        .unwrap();
    time_blocks::insert_time_block(&pool, student.id, &new_block(Weekday::Wed, t(18, 0), t(20, 0)))
        .await
        .unwrap();
    time_blocks::insert_time_block(&pool, other.id, &new_block(Weekday::Mon, t(9, 0), t(10, 0)))
        .await
        .unwrap();

    let mut tx = pool.begin().await.unwrap();
    let (deleted, inserted) = time_blocks::replace_time_blocks(
        &mut *tx,
        student.id,
        &[new_block(Weekday::Tue, t(17, 0), t(18, 30))],
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].total_minutes, 90);

    let rows = time_blocks::list_time_blocks(&pool, student.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].weekday, Weekday::Tue);

    // Other students keep their routine.
    assert_eq!(
        time_blocks::list_time_blocks(&pool, other.id).await.unwrap().len(),
        1
    );

    db.teardown().await;
}

#[tokio::test]
async fn rolled_back_replace_keeps_old_routine() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student = insert_student(&pool, "Mina").await;
    time_blocks::insert_time_block(&pool, student.id, &new_block(Weekday::Mon, t(18, 0), t(20, 0)))
        .await
        .unwrap();

    {
        let mut tx = pool.begin().await.unwrap();
        time_blocks::replace_time_blocks(&mut *tx, student.id, &[])
            .await
            .unwrap();
        // Dropped without commit.
    }

    let rows = time_blocks::list_time_blocks(&pool, student.id).await.unwrap();
    assert_eq!(rows.len(), 1);

    db.teardown().await;
}
