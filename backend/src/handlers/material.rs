//! Material management HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::services::material::{
    AdjustStockInput, CreateMaterialInput, MaterialService, UpdateMaterialInput,
};
use crate::AppState;

/// List all materials
pub async fn list_materials(State(state): State<AppState>) -> impl IntoResponse {
    let service = MaterialService::new(state.db.clone());

    match service.list().await {
        Ok(materials) => (
            StatusCode::OK,
            Json(serde_json::json!({ "materials": materials })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific material
pub async fn get_material(
    State(state): State<AppState>,
    Path(material_id): Path<i64>,
) -> impl IntoResponse {
    let service = MaterialService::new(state.db.clone());

    match service.get(material_id).await {
        Ok(material) => (StatusCode::OK, Json(material)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a new material
pub async fn create_material(
    State(state): State<AppState>,
    Json(input): Json<CreateMaterialInput>,
) -> impl IntoResponse {
    let service = MaterialService::new(state.db.clone());

    match service.create(input).await {
        Ok(material) => (StatusCode::CREATED, Json(material)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a material; a price change cascades into recipe prices
pub async fn update_material(
    State(state): State<AppState>,
    Path(material_id): Path<i64>,
    Json(input): Json<UpdateMaterialInput>,
) -> impl IntoResponse {
    let service = MaterialService::new(state.db.clone());
    let await_cascade = state.config.pricing.await_cascade;

    match service.update(material_id, input, await_cascade).await {
        Ok(material) => (StatusCode::OK, Json(material)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a material (refused while recipes still use it)
pub async fn delete_material(
    State(state): State<AppState>,
    Path(material_id): Path<i64>,
) -> impl IntoResponse {
    let service = MaterialService::new(state.db.clone());

    match service.delete(material_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a material's current stock level
pub async fn get_material_stock(
    State(state): State<AppState>,
    Path(material_id): Path<i64>,
) -> impl IntoResponse {
    let service = MaterialService::new(state.db.clone());

    match service.get_stock(material_id).await {
        Ok(stock) => (StatusCode::OK, Json(serde_json::json!({ "stock": stock }))).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Apply a relative stock adjustment
pub async fn adjust_material_stock(
    State(state): State<AppState>,
    Path(material_id): Path<i64>,
    Json(input): Json<AdjustStockInput>,
) -> impl IntoResponse {
    let service = MaterialService::new(state.db.clone());

    match service.adjust_stock(material_id, input.delta).await {
        Ok(material) => (StatusCode::OK, Json(material)).into_response(),
        Err(e) => e.into_response(),
    }
}
