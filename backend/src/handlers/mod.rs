//! HTTP handlers for the cafe admin API

pub mod activity;
pub mod health;
pub mod material;
pub mod recipe;
pub mod reporting;

pub use activity::list_activities;
pub use health::health_check;
pub use material::{
    adjust_material_stock, create_material, delete_material, get_material, get_material_stock,
    list_materials, update_material,
};
pub use recipe::{
    create_recipe, delete_recipe, get_recipe, get_recipe_ingredients, get_recipe_prices,
    list_recipes, recalculate_recipe_prices, replace_recipe_ingredients, update_recipe,
};
pub use reporting::{dashboard_stats, sales_by_category, sales_by_hour, sellers};
