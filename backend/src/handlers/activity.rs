//! Activity log HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::services::activity::ActivityService;
use crate::AppState;

const DEFAULT_ACTIVITY_LIMIT: i64 = 20;

#[derive(Debug, Default, Deserialize)]
pub struct ListActivitiesQuery {
    pub limit: Option<i64>,
}

/// List the most recent activities, newest first
pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ListActivitiesQuery>,
) -> impl IntoResponse {
    let service = ActivityService::new(state.db.clone());
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT).clamp(1, 100);

    match service.list(limit).await {
        Ok(activities) => (
            StatusCode::OK,
            Json(serde_json::json!({ "activities": activities })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
