//! Route definitions for the cafe admin API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/materials", material_routes())
        .nest("/recipes", recipe_routes())
        .nest("/activities", activity_routes())
        .nest("/reports", report_routes())
}

/// Material management routes
fn material_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_materials).post(handlers::create_material),
        )
        .route(
            "/:material_id",
            get(handlers::get_material)
                .put(handlers::update_material)
                .delete(handlers::delete_material),
        )
        .route(
            "/:material_id/stock",
            get(handlers::get_material_stock).put(handlers::adjust_material_stock),
        )
}

/// Recipe management routes
fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_recipes).post(handlers::create_recipe),
        )
        .route(
            "/:recipe_id",
            get(handlers::get_recipe)
                .put(handlers::update_recipe)
                .delete(handlers::delete_recipe),
        )
        .route(
            "/:recipe_id/ingredients",
            get(handlers::get_recipe_ingredients).put(handlers::replace_recipe_ingredients),
        )
        .route("/:recipe_id/prices", get(handlers::get_recipe_prices))
        .route(
            "/:recipe_id/prices/recalculate",
            post(handlers::recalculate_recipe_prices),
        )
}

/// Activity log routes
fn activity_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_activities))
}

/// Sales report routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(handlers::dashboard_stats))
        .route("/sales/by-category", get(handlers::sales_by_category))
        .route("/sales/by-hour", get(handlers::sales_by_hour))
        .route("/sales/best-sellers", get(handlers::sellers))
}
