use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Local, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use studyweek_core::EngineError;
use studyweek_core::onboarding::OnboardingDrafts;
use studyweek_core::plan::{
    create_weekly_plan, get_weekly_availability, list_day_plans_with_tasks, load_student,
    set_task_completed,
};
use studyweek_core::proposer::PlanProposer;
use studyweek_core::regenerate::{RegenerationConfig, regenerate_on_routine_change};
use studyweek_core::routine::TimeBlockInput;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub proposer: Arc<dyn PlanProposer>,
    pub proposer_timeout: Duration,
    pub drafts: OnboardingDrafts,
}

impl AppState {
    pub fn new(pool: PgPool, proposer: Arc<dyn PlanProposer>, proposer_timeout: Duration) -> Self {
        Self {
            pool,
            proposer,
            proposer_timeout,
            drafts: OnboardingDrafts::default(),
        }
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::Routine(_) | EngineError::NoRoutine(_) => StatusCode::BAD_REQUEST,
            EngineError::StudentNotFound(_) | EngineError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            EngineError::PlanAlreadyExists { .. } => StatusCode::CONFLICT,
            EngineError::Proposer(_) => StatusCode::BAD_GATEWAY,
            EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateWeekRequest {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RoutineRequest {
    pub blocks: Vec<TimeBlockInput>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    #[serde(default = "default_completed")]
    pub completed: bool,
}

fn default_completed() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/students/{id}/availability", get(availability))
        .route("/api/students/{id}/weekly-plans", post(create_week))
        .route("/api/students/{id}/routine", put(update_routine))
        .route("/api/students/{id}/day-plans", get(day_plans))
        .route(
            "/api/students/{id}/onboarding",
            get(onboarding_current).post(onboarding_step),
        )
        .route("/api/tasks/{id}/completion", put(task_completion))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("studyweek serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("studyweek serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl+C; shutting down");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let report = get_weekly_availability(&state.pool, id).await?;
    Ok(Json(report).into_response())
}

async fn create_week(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateWeekRequest>,
) -> Result<axum::response::Response, AppError> {
    let week = create_weekly_plan(
        &state.pool,
        state.proposer.as_ref(),
        id,
        request.start_date,
        state.today(),
        state.proposer_timeout,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(week)).into_response())
}

async fn update_routine(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RoutineRequest>,
) -> Result<axum::response::Response, AppError> {
    let config = RegenerationConfig {
        proposer_timeout: state.proposer_timeout,
    };
    let report = regenerate_on_routine_change(
        &state.pool,
        state.proposer.as_ref(),
        id,
        &request.blocks,
        state.today(),
        &config,
    )
    .await?;
    Ok(Json(report).into_response())
}

async fn day_plans(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(range): Query<DateRange>,
) -> Result<axum::response::Response, AppError> {
    let plans = list_day_plans_with_tasks(&state.pool, id, range.from, range.to).await?;
    Ok(Json(plans).into_response())
}

async fn task_completion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompletionRequest>,
) -> Result<axum::response::Response, AppError> {
    let day = set_task_completed(&state.pool, id, request.completed).await?;
    Ok(Json(day).into_response())
}

async fn onboarding_current(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    load_student(&state.pool, id).await?;
    let answers = state
        .drafts
        .current(&state.pool, id, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found(format!("no onboarding in progress for {id}")))?;
    Ok(Json(answers).into_response())
}

async fn onboarding_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(answers): Json<Map<String, Value>>,
) -> Result<axum::response::Response, AppError> {
    let merged = state
        .drafts
        .record_step(&state.pool, id, answers, Utc::now())
        .await?;
    Ok(Json(merged).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use studyweek_core::plan::next_monday as next_monday_after;
    use studyweek_core::proposer::DEFAULT_TIMEOUT;
    use studyweek_test_utils::fixtures::{
        block, insert_plan_with_tasks, insert_student, set_routine, tasks_of,
    };
    use studyweek_test_utils::{ScriptedProposer, TestDb};

    use super::*;

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn state(pool: PgPool, proposer: ScriptedProposer) -> AppState {
        AppState::new(pool, Arc::new(proposer), DEFAULT_TIMEOUT)
    }

    async fn send(
        state: AppState,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> axum::response::Response {
        let app = build_router(state);
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn next_monday() -> NaiveDate {
        next_monday_after(Local::now().date_naive())
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_availability() {
        let db = TestDb::create().await;
        let pool = db.pool().clone();
        let student = insert_student(&pool, "Mina").await;
        set_routine(&pool, student.id, &[block("MON", "18:00", "20:00")]).await;

        let uri = format!("/api/students/{}/availability", student.id);
        let app_state = state(pool.clone(), ScriptedProposer::new());
        let resp = send(app_state, Method::GET, &uri, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["total_week_minutes"], 120);
        assert_eq!(json["daily_totals"].as_array().unwrap().len(), 7);
        assert_eq!(json["daily_totals"][0]["weekday"], "MON");
        assert_eq!(json["blocks"].as_array().unwrap().len(), 1);

        db.teardown().await;
    }

    #[tokio::test]
    async fn test_unknown_student_is_404() {
        let db = TestDb::create().await;
        let pool = db.pool().clone();

        let uri = format!("/api/students/{}/availability", Uuid::new_v4());
        let app_state = state(pool.clone(), ScriptedProposer::new());
        let resp = send(app_state, Method::GET, &uri, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("not found"));

        db.teardown().await;
    }

    #[tokio::test]
    async fn test_create_week_then_conflict() {
        let db = TestDb::create().await;
        let pool = db.pool().clone();
        let student = insert_student(&pool, "Mina").await;
        set_routine(&pool, student.id, &[block("WED", "18:00", "19:00")]).await;
        let app_state = state(pool.clone(), ScriptedProposer::new());

        let uri = format!("/api/students/{}/weekly-plans", student.id);
        let resp = send(app_state.clone(), Method::POST, &uri, Some(json!({}))).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json = body_json(resp).await;
        assert_eq!(json["start_date"], next_monday().to_string());
        assert_eq!(json["day_plan_ids"].as_array().unwrap().len(), 7);
        assert_eq!(json["summary"]["total_minutes"], 60);

        let resp = send(app_state.clone(), Method::POST, &uri, Some(json!({}))).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let list_uri = format!("/api/students/{}/day-plans", student.id);
        let resp = send(app_state, Method::GET, &list_uri, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json.as_array().unwrap().len(), 7);
        assert!(json[0].get("tasks").is_some());
        assert!(json[0].get("plan_date").is_some());

        db.teardown().await;
    }

    #[tokio::test]
    async fn test_create_week_without_routine_is_400() {
        let db = TestDb::create().await;
        let pool = db.pool().clone();
        let student = insert_student(&pool, "Mina").await;

        let uri = format!("/api/students/{}/weekly-plans", student.id);
        let resp = send(
            state(pool.clone(), ScriptedProposer::new()),
            Method::POST,
            &uri,
            Some(json!({})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        db.teardown().await;
    }

    #[tokio::test]
    async fn test_proposer_failure_is_502() {
        let db = TestDb::create().await;
        let pool = db.pool().clone();
        let student = insert_student(&pool, "Mina").await;
        set_routine(&pool, student.id, &[block("MON", "18:00", "20:00")]).await;
        let start = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();

        let uri = format!("/api/students/{}/weekly-plans", student.id);
        let resp = send(
            state(pool.clone(), ScriptedProposer::new().failing_on(start)),
            Method::POST,
            &uri,
            Some(json!({ "start_date": "2030-01-07" })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        db.teardown().await;
    }

    #[tokio::test]
    async fn test_routine_conflict_is_400() {
        let db = TestDb::create().await;
        let pool = db.pool().clone();
        let student = insert_student(&pool, "Mina").await;

        let uri = format!("/api/students/{}/routine", student.id);
        let body = json!({
            "blocks": [
                { "weekday": "TUE", "start_time": "09:00", "end_time": "10:00" },
                { "weekday": "TUE", "start_time": "09:30", "end_time": "10:30" },
            ]
        });
        let app_state = state(pool.clone(), ScriptedProposer::new());
        let resp = send(app_state, Method::PUT, &uri, Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("overlapping"));

        db.teardown().await;
    }

    #[tokio::test]
    async fn test_routine_update_reports_outcomes() {
        let db = TestDb::create().await;
        let pool = db.pool().clone();
        let student = insert_student(&pool, "Mina").await;
        set_routine(&pool, student.id, &[block("MON", "18:00", "20:00")]).await;
        let monday = next_monday();
        let plan = insert_plan_with_tasks(&pool, student.id, monday, 3, 20).await;

        let uri = format!("/api/students/{}/routine", student.id);
        let body = json!({
            "blocks": [
                { "day_of_week": "MON", "start_time": "17:00", "end_time": "18:00" },
            ]
        });
        let resp = send(
            state(pool.clone(), ScriptedProposer::new().failing_on(monday)),
            Method::PUT,
            &uri,
            Some(body),
        )
        .await;
        // Per-day failures still answer 200.
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["deleted_count"], 1);
        assert_eq!(json["summary"]["failed"], 1);
        assert_eq!(json["outcomes"][0]["status"], "failed");
        assert_eq!(json["outcomes"][0]["tasks_count"], 3);
        assert_eq!(tasks_of(&pool, plan.id).await.len(), 3);

        db.teardown().await;
    }

    #[tokio::test]
    async fn test_task_completion() {
        let db = TestDb::create().await;
        let pool = db.pool().clone();
        let student = insert_student(&pool, "Mina").await;
        let plan = insert_plan_with_tasks(&pool, student.id, next_monday(), 1, 30).await;
        let task = tasks_of(&pool, plan.id).await.remove(0);

        let uri = format!("/api/tasks/{}/completion", task.id);
        let resp = send(
            state(pool.clone(), ScriptedProposer::new()),
            Method::PUT,
            &uri,
            Some(json!({ "completed": true })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["is_completed"], true);
        assert_eq!(json["tasks"][0]["is_completed"], true);

        let missing = format!("/api/tasks/{}/completion", Uuid::new_v4());
        let resp = send(
            state(pool.clone(), ScriptedProposer::new()),
            Method::PUT,
            &missing,
            Some(json!({})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        db.teardown().await;
    }

    #[tokio::test]
    async fn test_onboarding_steps() {
        let db = TestDb::create().await;
        let pool = db.pool().clone();
        let student = insert_student(&pool, "Mina").await;
        let app_state = state(pool.clone(), ScriptedProposer::new());
        let uri = format!("/api/students/{}/onboarding", student.id);

        let resp = send(app_state.clone(), Method::GET, &uri, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(app_state.clone(), Method::POST, &uri, Some(json!({ "grade": 2 }))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json!({ "semester": 1 });
        let resp = send(app_state.clone(), Method::POST, &uri, Some(body)).await;
        assert_eq!(body_json(resp).await, json!({ "grade": 2, "semester": 1 }));

        let resp = send(app_state, Method::GET, &uri, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["grade"], 2);

        db.teardown().await;
    }
}
