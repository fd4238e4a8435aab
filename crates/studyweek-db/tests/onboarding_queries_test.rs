//! Integration tests for onboarding drafts and their expiry.

use chrono::{TimeDelta, Utc};
use serde_json::json;

use studyweek_db::queries::onboarding;
use studyweek_test_utils::fixtures::insert_student;
use studyweek_test_utils::TestDb;

#[tokio::test]
async fn draft_is_visible_until_expiry() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student = insert_student(&pool, "Mina").await;
    let now = Utc::now();

    onboarding::save_draft(&pool, student.id, &json!({"grade": 2}), now + TimeDelta::minutes(30))
        .await
        .unwrap();

    let active = onboarding::get_active_draft(&pool, student.id, now)
        .await
        .unwrap()
        .expect("draft should be active");
    assert_eq!(active.answers["grade"], 2);

    let later = now + TimeDelta::minutes(31);
    assert!(
        onboarding::get_active_draft(&pool, student.id, later)
            .await
            .unwrap()
            .is_none()
    );

    db.teardown().await;
}

#[tokio::test]
async fn save_overwrites_and_take_removes() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let student = insert_student(&pool, "Mina").await;
    let now = Utc::now();
    let expiry = now + TimeDelta::minutes(30);

    onboarding::save_draft(&pool, student.id, &json!({"grade": 2}), expiry)
        .await
        .unwrap();
    onboarding::save_draft(&pool, student.id, &json!({"grade": 3}), expiry)
        .await
        .unwrap();

    let taken = onboarding::take_draft(&pool, student.id, now)
        .await
        .unwrap()
        .expect("draft should be returned");
    assert_eq!(taken.answers["grade"], 3);

    assert!(
        onboarding::take_draft(&pool, student.id, now)
            .await
            .unwrap()
            .is_none()
    );

    db.teardown().await;
}

#[tokio::test]
async fn purge_removes_only_expired() {
    let db = TestDb::create().await;
    let pool = db.pool().clone();
    let fresh = insert_student(&pool, "Mina").await;
    let stale = insert_student(&pool, "Joon").await;
    let now = Utc::now();

    onboarding::save_draft(&pool, fresh.id, &json!({}), now + TimeDelta::minutes(10))
        .await
        .unwrap();
    onboarding::save_draft(&pool, stale.id, &json!({}), now - TimeDelta::minutes(10))
        .await
        .unwrap();

    assert_eq!(onboarding::purge_expired(&pool, now).await.unwrap(), 1);
    assert!(
        onboarding::get_active_draft(&pool, fresh.id, now)
            .await
            .unwrap()
            .is_some()
    );

    db.teardown().await;
}
