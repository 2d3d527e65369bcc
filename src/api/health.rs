/// Liveness and database health endpoints
///
/// `/` never touches the database. `/health` and `/status` are aliases served
/// by the same handler: they open a session and run a round-trip query.

use crate::api::{ApiError, AppState};
use axum::{extract::State, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};

/// Liveness message returned by `GET /`
pub const LIVENESS_MESSAGE: &str = "Project Management API is running!";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

impl HealthResponse {
    fn connected() -> Self {
        Self {
            status: "ok".to_string(),
            database: "connected".to_string(),
        }
    }
}

/// Create liveness and health check routes
pub fn create_health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/status", get(health_check))
}

/// GET /
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: LIVENESS_MESSAGE.to_string(),
    })
}

/// GET /health, GET /status
///
/// Returns: { "status": "ok", "database": "connected" }
async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let mut session = state.db.acquire_session().await.map_err(|e| {
        tracing::error!("Database error: {}", e);
        ApiError::DatabaseUnavailable
    })?;

    if let Err(e) = session.ping().await {
        tracing::error!("Database error: {}", e);
        return Err(ApiError::DatabaseUnavailable);
    }

    Ok(Json(HealthResponse::connected()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::Database;

    #[tokio::test]
    async fn root_reports_liveness() {
        let Json(body) = root().await;
        assert_eq!(body.message, LIVENESS_MESSAGE);
    }

    #[tokio::test]
    async fn health_check_reports_connected_database() {
        let db = Database::connect_lazy("sqlite::memory:", 1).unwrap();

        let Json(body) = health_check(State(AppState::new(db))).await.unwrap();
        assert_eq!(body, HealthResponse::connected());
    }

    #[tokio::test]
    async fn health_check_maps_closed_pool_to_unavailable() {
        let db = Database::connect_lazy("sqlite::memory:", 1).unwrap();
        db.close().await;

        let err = health_check(State(AppState::new(db))).await.unwrap_err();
        assert!(matches!(err, ApiError::DatabaseUnavailable));
    }
}
