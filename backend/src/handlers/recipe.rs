//! Recipe management HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use shared::types::IngredientEntry;

use crate::services::pricing::PricingService;
use crate::services::recipe::{CreateRecipeInput, RecipeService, UpdateRecipeInput};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListRecipesQuery {
    /// Set `include=ingredients` to embed each recipe's ingredient list
    pub include: Option<String>,
}

/// List all recipes
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<ListRecipesQuery>,
) -> impl IntoResponse {
    let service = RecipeService::new(state.db.clone());
    let include_ingredients = query.include.as_deref() == Some("ingredients");

    match service.list(include_ingredients).await {
        Ok(recipes) => (
            StatusCode::OK,
            Json(serde_json::json!({ "recipes": recipes })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a specific recipe with its ingredient list
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> impl IntoResponse {
    let service = RecipeService::new(state.db.clone());

    match service.get(recipe_id).await {
        Ok(recipe) => (StatusCode::OK, Json(recipe)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a new recipe (ingredients are added separately)
pub async fn create_recipe(
    State(state): State<AppState>,
    Json(input): Json<CreateRecipeInput>,
) -> impl IntoResponse {
    let service = RecipeService::new(state.db.clone());

    match service.create(input).await {
        Ok(recipe) => (StatusCode::CREATED, Json(recipe)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a recipe's own fields
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Json(input): Json<UpdateRecipeInput>,
) -> impl IntoResponse {
    let service = RecipeService::new(state.db.clone());

    match service.update(recipe_id, input).await {
        Ok(recipe) => (StatusCode::OK, Json(recipe)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a recipe and its ingredient links
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> impl IntoResponse {
    let service = RecipeService::new(state.db.clone());

    match service.delete(recipe_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Get a recipe's ingredient list
pub async fn get_recipe_ingredients(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> impl IntoResponse {
    let service = PricingService::new(state.db.clone());

    match service.ingredients_with_materials(recipe_id).await {
        Ok(ingredients) => (
            StatusCode::OK,
            Json(serde_json::json!({ "ingredients": ingredients })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Replace a recipe's entire ingredient list atomically
pub async fn replace_recipe_ingredients(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
    Json(entries): Json<Vec<IngredientEntry>>,
) -> impl IntoResponse {
    let service = PricingService::new(state.db.clone());

    match service.replace_ingredients(recipe_id, &entries).await {
        Ok(ingredients) => (
            StatusCode::OK,
            Json(serde_json::json!({ "ingredients": ingredients })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Compute a recipe's derived prices without persisting them
pub async fn get_recipe_prices(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> impl IntoResponse {
    let service = PricingService::new(state.db.clone());

    match service.compute_derived_prices(recipe_id).await {
        Ok(prices) => (StatusCode::OK, Json(prices)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Recompute and persist a recipe's derived prices
pub async fn recalculate_recipe_prices(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> impl IntoResponse {
    let service = PricingService::new(state.db.clone());

    match service.recompute_recipe(recipe_id).await {
        Ok(prices) => (StatusCode::OK, Json(prices)).into_response(),
        Err(e) => e.into_response(),
    }
}
