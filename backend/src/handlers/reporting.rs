//! Sales reporting HTTP handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use shared::types::SortOrder;

use crate::services::reporting::ReportingService;
use crate::AppState;

const DEFAULT_SELLER_LIMIT: i64 = 10;

#[derive(Debug, Default, Deserialize)]
pub struct SellersQuery {
    pub limit: Option<i64>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    #[serde(default)]
    pub order: SortOrder,
}

/// Sales totals per recipe category
pub async fn sales_by_category(State(state): State<AppState>) -> impl IntoResponse {
    let service = ReportingService::new(state.db.clone());

    match service.sales_by_category().await {
        Ok(rows) => (
            StatusCode::OK,
            Json(serde_json::json!({ "categories": rows })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Order totals grouped by hour of day
pub async fn sales_by_hour(State(state): State<AppState>) -> impl IntoResponse {
    let service = ReportingService::new(state.db.clone());

    match service.sales_by_hour().await {
        Ok(rows) => (StatusCode::OK, Json(serde_json::json!({ "hours": rows }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Recipes ranked by quantity sold, best or worst first
pub async fn sellers(
    State(state): State<AppState>,
    Query(query): Query<SellersQuery>,
) -> impl IntoResponse {
    let service = ReportingService::new(state.db.clone());
    let limit = query.limit.unwrap_or(DEFAULT_SELLER_LIMIT).clamp(1, 100);

    match service
        .sellers(limit, query.year, query.month, query.order)
        .await
    {
        Ok(rows) => (StatusCode::OK, Json(serde_json::json!({ "sellers": rows }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Headline numbers for the dashboard
pub async fn dashboard_stats(State(state): State<AppState>) -> impl IntoResponse {
    let service = ReportingService::new(state.db.clone());

    match service.dashboard_stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => e.into_response(),
    }
}
