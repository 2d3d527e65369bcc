/// HTTP API Layer
///
/// This module provides the HTTP surface of the service:
/// - Liveness at `/`
/// - Database health at `/health` and its alias `/status`

use crate::project::Database;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

// Liveness and health check endpoints
pub mod health;

pub use health::create_health_routes;

/// Application state containing shared resources
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection pool owned by the composition root
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Errors surfaced to HTTP clients
///
/// Rendered as `{"detail": "..."}`. Underlying causes are logged by the
/// handler, never sent to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Session acquisition or round-trip query failed
    DatabaseUnavailable,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::DatabaseUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> &'static str {
        match self {
            Self::DatabaseUnavailable => "Database connection failed",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
