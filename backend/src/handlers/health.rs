//! Liveness and readiness handler

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub service: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub database: DatabaseStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Up,
    Down,
}

/// Readiness probe: 200 while the embedded store answers, 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => DatabaseStatus::Up,
        Err(e) => {
            tracing::error!("health check cannot reach the database: {}", e);
            DatabaseStatus::Down
        }
    };

    let status = match database {
        DatabaseStatus::Up => StatusCode::OK,
        DatabaseStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        status,
        Json(HealthStatus {
            service: "cafe-admin-backend",
            version: env!("CARGO_PKG_VERSION"),
            environment: state.config.environment.clone(),
            database,
        }),
    )
}
