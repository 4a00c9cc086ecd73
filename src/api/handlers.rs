use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::contracts::{Assignment, DeskError, Store};
use crate::service::{
    AssignmentService, AssignmentUpdate, CounterPolicy, DueDateInput, NewAssignment, UserService,
};

/// Server metrics for monitoring.
#[derive(Default)]
pub struct Metrics {
    pub registrations_total: AtomicU64,
    pub logins_total: AtomicU64,
    pub login_failures_total: AtomicU64,
    pub assignments_created_total: AtomicU64,
    pub assignments_read_total: AtomicU64,
    pub assignments_updated_total: AtomicU64,
    pub assignments_deleted_total: AtomicU64,
    pub errors_total: AtomicU64,
    pub start_time: std::sync::OnceLock<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        let m = Self::default();
        let _ = m.start_time.set(Instant::now());
        m
    }

    #[inline]
    fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        Self::incr(&self.errors_total);
    }

    fn uptime_secs(&self) -> f64 {
        self.start_time
            .get()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Application state shared across handlers.
pub struct AppState<S: Store> {
    pub assignments: Arc<AssignmentService<S>>,
    pub users: Arc<UserService<S>>,
    pub metrics: Arc<Metrics>,
}

impl<S: Store + 'static> AppState<S> {
    /// Creates state over one store with the default bcrypt cost.
    pub fn new(store: Arc<S>, policy: CounterPolicy, metrics: Arc<Metrics>) -> Self {
        Self::with_users(
            Arc::clone(&store),
            policy,
            metrics,
            UserService::new(store),
        )
    }

    /// Creates state with a preconfigured user service.
    pub fn with_users(
        store: Arc<S>,
        policy: CounterPolicy,
        metrics: Arc<Metrics>,
        users: UserService<S>,
    ) -> Self {
        Self {
            assignments: Arc::new(AssignmentService::new(store, policy)),
            users: Arc::new(users),
            metrics,
        }
    }
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for creating an assignment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<DueDateInput>,
    pub unique_no: Option<i64>,
}

/// Request body for updating an assignment. Absent fields are left as is.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DueDateInput>,
}

/// API error type. Rendered as a short plain-text message.
pub enum ApiError {
    Desk(DeskError),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Desk(e) if e.is_internal() => {
                tracing::error!(error = %e, "Request failed");
                (e.status(), "Internal Server Error").into_response()
            }
            ApiError::Desk(e) => {
                tracing::debug!(error = %e, "Request rejected");
                (e.status(), e.to_string()).into_response()
            }
            ApiError::BadRequest(msg) => {
                tracing::debug!(error = %msg, "Malformed request");
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
        }
    }
}

impl From<DeskError> for ApiError {
    fn from(e: DeskError) -> Self {
        ApiError::Desk(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Counts the error and converts it for the response.
fn track<T>(metrics: &Metrics, result: Result<T, DeskError>) -> Result<T, ApiError> {
    result.map_err(|e| {
        metrics.record_error();
        ApiError::from(e)
    })
}

fn parse_unique_no(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid unique number: {}", raw)))
}

/// Runs CPU-bound work (bcrypt) off the async workers.
async fn run_blocking<T, F>(f: F) -> Result<T, DeskError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DeskError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DeskError::Internal(e.to_string()))?
}

/// POST /register
pub async fn register<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<&'static str, ApiError> {
    let Json(req) = payload.inspect_err(|_| state.metrics.record_error())?;

    let users = Arc::clone(&state.users);
    let result = run_blocking(move || users.register(&req.name, &req.email, &req.password)).await;
    track(&state.metrics, result)?;

    Metrics::incr(&state.metrics.registrations_total);
    Ok("Registered Successfully")
}

/// POST /login
pub async fn login<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<&'static str, ApiError> {
    let Json(req) = payload.inspect_err(|_| state.metrics.record_error())?;
    Metrics::incr(&state.metrics.logins_total);

    let users = Arc::clone(&state.users);
    let result = run_blocking(move || users.verify(&req.email, &req.password)).await;
    let matched = result.and_then(|ok| {
        if ok {
            Ok(())
        } else {
            Err(DeskError::InvalidCredentials)
        }
    });

    if matched.is_err() {
        Metrics::incr(&state.metrics.login_failures_total);
    }
    track(&state.metrics, matched)?;

    Ok("Login Successful")
}

/// POST /assignments
pub async fn create_assignment<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateAssignmentRequest>, JsonRejection>,
) -> Result<&'static str, ApiError> {
    let Json(req) = payload.inspect_err(|_| state.metrics.record_error())?;

    let result = state.assignments.create(NewAssignment {
        title: req.title,
        description: req.description,
        due_date: req.due_date,
        unique_no: req.unique_no,
    });
    track(&state.metrics, result)?;

    Metrics::incr(&state.metrics.assignments_created_total);
    Ok("Assignment Created Successfully")
}

/// GET /assignments/{uniqueNo}
pub async fn get_assignment<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(raw): Path<String>,
) -> Result<Json<Assignment>, ApiError> {
    let unique_no = parse_unique_no(&raw)?;

    let found = track(&state.metrics, state.assignments.find(unique_no))?;
    let assignment = track(
        &state.metrics,
        found.ok_or(DeskError::NotFound("Assignment")),
    )?;

    Metrics::incr(&state.metrics.assignments_read_total);
    Ok(Json(assignment))
}

/// PUT /assignments/{uniqueNo}
pub async fn update_assignment<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(raw): Path<String>,
    payload: Result<Json<UpdateAssignmentRequest>, JsonRejection>,
) -> Result<Json<Assignment>, ApiError> {
    let unique_no = parse_unique_no(&raw)?;
    let Json(req) = payload.inspect_err(|_| state.metrics.record_error())?;

    let result = state.assignments.update(
        unique_no,
        AssignmentUpdate {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
        },
    );
    let updated = track(&state.metrics, result)?;

    Metrics::incr(&state.metrics.assignments_updated_total);
    Ok(Json(updated))
}

/// DELETE /assignments/{uniqueNo}
pub async fn delete_assignment<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(raw): Path<String>,
) -> Result<&'static str, ApiError> {
    let unique_no = parse_unique_no(&raw)?;

    track(&state.metrics, state.assignments.delete(unique_no))?;

    Metrics::incr(&state.metrics.assignments_deleted_total);
    Ok("Assignment Deleted Successfully")
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Response for the stats endpoint.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_secs: f64,
    pub registrations_total: u64,
    pub logins_total: u64,
    pub login_failures_total: u64,
    pub assignments_created_total: u64,
    pub assignments_read_total: u64,
    pub assignments_updated_total: u64,
    pub assignments_deleted_total: u64,
    pub errors_total: u64,
    /// Last value handed out (or reconciled to) by the assignment counter.
    pub assignment_counter: Option<i64>,
}

/// GET /stats
pub async fn get_stats<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let m = &state.metrics;
    let assignment_counter = state.assignments.allocator().current()?;

    Ok(Json(StatsResponse {
        uptime_secs: m.uptime_secs(),
        registrations_total: m.registrations_total.load(Ordering::Relaxed),
        logins_total: m.logins_total.load(Ordering::Relaxed),
        login_failures_total: m.login_failures_total.load(Ordering::Relaxed),
        assignments_created_total: m.assignments_created_total.load(Ordering::Relaxed),
        assignments_read_total: m.assignments_read_total.load(Ordering::Relaxed),
        assignments_updated_total: m.assignments_updated_total.load(Ordering::Relaxed),
        assignments_deleted_total: m.assignments_deleted_total.load(Ordering::Relaxed),
        errors_total: m.errors_total.load(Ordering::Relaxed),
        assignment_counter,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_no_parses_integers_only() {
        assert_eq!(parse_unique_no("42").ok(), Some(42));
        assert_eq!(parse_unique_no("-7").ok(), Some(-7));
        assert!(parse_unique_no("abc").is_err());
        assert!(parse_unique_no("1.5").is_err());
    }

    #[test]
    fn metrics_start_with_uptime() {
        let metrics = Metrics::new();
        assert!(metrics.start_time.get().is_some());
        metrics.record_error();
        assert_eq!(metrics.errors_total.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn create_request_accepts_camel_case() {
        let req: CreateAssignmentRequest = serde_json::from_value(serde_json::json!({
            "title": "Essay",
            "dueDate": "2024-05-01",
            "uniqueNo": 9
        }))
        .unwrap();
        assert_eq!(req.title, "Essay");
        assert_eq!(req.description, "");
        assert_eq!(req.unique_no, Some(9));
        assert_eq!(req.due_date, Some(DueDateInput::Text("2024-05-01".into())));
    }
}
