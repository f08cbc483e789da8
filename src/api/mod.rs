//! HTTP API layer - axum routes over the core budget workflow operations.
//!
//! This layer stays thin: handlers translate requests into core calls and
//! core errors into status codes. All business rules live in `core` and
//! `workflow`.

/// Budget process endpoints (list, detail, create, transition, CSV export)
pub mod budget;
/// Budget step endpoints (detail, file redirect)
pub mod steps;

use crate::{
    config::settings::UserDirectory,
    core::ActingUser,
    errors::Error,
    notify::Notifier,
    storage::FileStore,
    workflow::Workflow,
};
use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::error;

/// Shared state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection for all database operations
    pub db: DatabaseConnection,
    /// The validated workflow graph, loaded once at startup
    pub workflow: Arc<Workflow>,
    /// Known users and their team memberships
    pub users: Arc<UserDirectory>,
    /// Store for uploaded step files
    pub store: FileStore,
    /// Best-effort transition observer
    pub notifier: Arc<dyn Notifier>,
}

/// Builds the full application router, including the `/media/` file mount.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/budget/", get(budget::list).post(budget::create))
        .route("/api/budget/export_csv/", get(budget::export_csv))
        .route("/api/budget/transition_to/", post(budget::transition_to))
        .route("/api/budget/:id/", get(budget::retrieve).delete(budget::destroy))
        .route("/api/budgetsteps/:id/", get(steps::retrieve))
        .route(
            "/api/budgetsteps/:id/files/:file_id/",
            get(steps::file_redirect),
        )
        .nest_service("/media", ServeDir::new(state.store.root()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves the acting user from the `X-User-Id` header via the configured
/// directory. Absent or unparseable ids act as user 0 with no teams.
#[must_use]
pub fn acting_user(users: &UserDirectory, headers: &HeaderMap) -> ActingUser {
    let id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0);
    users.resolve(id)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::TransitionNotFound { .. } => (StatusCode::BAD_REQUEST, "transition_not_found"),
            Self::TransitionNotAllowed { .. } => {
                (StatusCode::BAD_REQUEST, "transition_not_allowed")
            }
            Self::Validation { .. } | Self::RoundAlreadyAssigned { .. } => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            Self::StaleState { .. } => (StatusCode::CONFLICT, "stale_state"),
            Self::ProcessNotFound { .. }
            | Self::StepNotFound { .. }
            | Self::StepFileNotFound { .. }
            | Self::RoundNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            Self::Config { .. } | Self::WorkflowConfig { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            Self::Database(_) | Self::Io(_) => {
                error!(error = %self, "request failed on persistence");
                // Do not leak backend details to clients.
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({"error": "internal_error"})),
                )
                    .into_response();
            }
        };

        let mut body = json!({"error": code, "message": self.to_string()});
        if let Self::TransitionNotAllowed { reason, .. } = &self {
            body["reason_not_allowed"] = json!(reason);
        }
        (status, axum::Json(body)).into_response()
    }
}
