//! Recipe management
//!
//! CRUD over recipes. Derived prices are never accepted from the client; they
//! come out of the pricing engine, and reads report prices computed from the
//! current material prices so a pending cascade never shows stale numbers.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

use shared::pricing::derive_from_raw;
use shared::validation::{validate_category, validate_name, validate_price_coefficient};

use crate::error::{AppError, AppResult};
use crate::services::activity::{ActivityKind, ActivityService};
use crate::services::pricing::{to_decimal, IngredientWithMaterial, PricingService};

/// Recipe service
#[derive(Clone)]
pub struct RecipeService {
    db: SqlitePool,
}

/// A menu recipe with its cached derived prices
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[sqlx(try_from = "f64")]
    pub price_coefficient: Decimal,
    pub cost_price: i64,
    pub base_price: i64,
    pub sell_price: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recipe as returned to the UI, optionally carrying its ingredient list
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<IngredientWithMaterial>>,
}

/// Request body for creating a recipe
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeInput {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "category must not be empty"))]
    pub category: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_coefficient: Option<f64>,
}

/// Request body for updating a recipe; absent fields keep their value.
/// `description` and `imageUrl` accept an explicit `null` to clear them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipeInput {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "shared::types::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "shared::types::double_option")]
    pub image_url: Option<Option<String>>,
    pub price_coefficient: Option<f64>,
}

impl RecipeService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List all recipes ordered by name, with prices computed from current
    /// material prices. Ingredient lists are embedded on request.
    pub async fn list(&self, include_ingredients: bool) -> AppResult<Vec<RecipeDetails>> {
        let mut recipes = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes ORDER BY name")
            .fetch_all(&self.db)
            .await?;

        // Raw costs for every recipe in one aggregate query.
        let sums = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT ri.recipe_id, SUM(m.price * ri.amount)
            FROM recipe_ingredients ri
            JOIN materials m ON m.id = ri.material_id
            GROUP BY ri.recipe_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        let raw_by_recipe: HashMap<i64, i64> = sums.into_iter().collect();

        for recipe in &mut recipes {
            let raw = raw_by_recipe.get(&recipe.id).copied().unwrap_or(0);
            let prices = derive_from_raw(raw, recipe.price_coefficient);
            recipe.cost_price = prices.raw_price;
            recipe.base_price = prices.base_price;
            recipe.sell_price = prices.sell_price;
        }

        let mut ingredients_by_recipe: HashMap<i64, Vec<IngredientWithMaterial>> = HashMap::new();
        if include_ingredients {
            let all = sqlx::query_as::<_, IngredientWithMaterial>(
                r#"
                SELECT ri.id, ri.recipe_id, ri.material_id, ri.amount,
                       m.name AS material_name, m.unit AS material_unit, m.price AS material_price
                FROM recipe_ingredients ri
                JOIN materials m ON m.id = ri.material_id
                ORDER BY ri.recipe_id, m.name
                "#,
            )
            .fetch_all(&self.db)
            .await?;

            for ingredient in all {
                ingredients_by_recipe
                    .entry(ingredient.recipe_id)
                    .or_default()
                    .push(ingredient);
            }
        }

        Ok(recipes
            .into_iter()
            .map(|recipe| {
                let ingredients = include_ingredients
                    .then(|| ingredients_by_recipe.remove(&recipe.id).unwrap_or_default());
                RecipeDetails {
                    recipe,
                    ingredients,
                }
            })
            .collect())
    }

    /// Fetch one recipe with its ingredient list and freshly computed prices.
    pub async fn get(&self, id: i64) -> AppResult<RecipeDetails> {
        let mut recipe = self.fetch(id).await?;

        let pricing = PricingService::new(self.db.clone());
        let prices = pricing.compute_derived_prices(id).await?;
        recipe.cost_price = prices.raw_price;
        recipe.base_price = prices.base_price;
        recipe.sell_price = prices.sell_price;

        let ingredients = pricing.ingredients_with_materials(id).await?;

        Ok(RecipeDetails {
            recipe,
            ingredients: Some(ingredients),
        })
    }

    /// Create a recipe with an empty ingredient list. Names are unique.
    pub async fn create(&self, input: CreateRecipeInput) -> AppResult<Recipe> {
        input.validate()?;

        let name = input.name.trim();
        validate_name(name).map_err(|message| AppError::Validation {
            field: "name".to_string(),
            message: message.to_string(),
            message_fa: "نام رسپی نامعتبر است".to_string(),
        })?;
        let category = input.category.trim();
        validate_category(category).map_err(|message| AppError::Validation {
            field: "category".to_string(),
            message: message.to_string(),
            message_fa: "دسته‌بندی نامعتبر است".to_string(),
        })?;

        let coefficient = match input.price_coefficient {
            Some(raw) => {
                let coefficient = to_decimal(raw)?;
                validate_price_coefficient(coefficient).map_err(|message| {
                    AppError::Validation {
                        field: "priceCoefficient".to_string(),
                        message: message.to_string(),
                        message_fa: "ضریب قیمت باید حداقل ۰٫۱ باشد".to_string(),
                    }
                })?;
                raw
            }
            None => 3.3,
        };

        self.ensure_name_free(name, None).await?;

        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recipes (name, category, description, image_url, price_coefficient,
                                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(category)
        .bind(&input.description)
        .bind(&input.image_url)
        .bind(coefficient)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        let recipe = self.fetch(id).await?;

        ActivityService::new(self.db.clone())
            .record_or_warn(
                ActivityKind::Create,
                "recipe",
                Some(recipe.id),
                Some(&recipe.name),
                "افزودن رسپی جدید",
            )
            .await;

        Ok(recipe)
    }

    /// Update a recipe's own fields. A coefficient change recomputes and
    /// persists the derived prices before returning.
    pub async fn update(&self, id: i64, input: UpdateRecipeInput) -> AppResult<Recipe> {
        if let Some(name) = &input.name {
            validate_name(name).map_err(|message| AppError::Validation {
                field: "name".to_string(),
                message: message.to_string(),
                message_fa: "نام رسپی نامعتبر است".to_string(),
            })?;
        }
        if let Some(category) = &input.category {
            validate_category(category).map_err(|message| AppError::Validation {
                field: "category".to_string(),
                message: message.to_string(),
                message_fa: "دسته‌بندی نامعتبر است".to_string(),
            })?;
        }
        let new_coefficient = match input.price_coefficient {
            Some(raw) => {
                let coefficient = to_decimal(raw)?;
                validate_price_coefficient(coefficient).map_err(|message| {
                    AppError::Validation {
                        field: "priceCoefficient".to_string(),
                        message: message.to_string(),
                        message_fa: "ضریب قیمت باید حداقل ۰٫۱ باشد".to_string(),
                    }
                })?;
                Some(coefficient)
            }
            None => None,
        };

        // Read, merge and write in one transaction, like the material update
        // path, so a concurrent edit cannot resurrect stale fields.
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;

        if let Some(name) = &input.name {
            let name = name.trim();
            if name != existing.name {
                let taken = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM recipes WHERE name = ? AND id != ?)",
                )
                .bind(name)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
                if taken {
                    return Err(AppError::DuplicateName(name.to_string()));
                }
            }
        }

        let coefficient = new_coefficient.unwrap_or(existing.price_coefficient);
        let coefficient_changed = coefficient != existing.price_coefficient;

        let description = match input.description {
            Some(value) => value,
            None => existing.description.clone(),
        };
        let image_url = match input.image_url {
            Some(value) => value,
            None => existing.image_url.clone(),
        };

        sqlx::query(
            r#"
            UPDATE recipes
            SET name = ?, category = ?, description = ?, image_url = ?,
                price_coefficient = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(input.name.as_deref().map(str::trim).unwrap_or(&existing.name))
        .bind(
            input
                .category
                .as_deref()
                .map(str::trim)
                .unwrap_or(&existing.category),
        )
        .bind(&description)
        .bind(&image_url)
        .bind(input.price_coefficient.unwrap_or_else(|| {
            // keep the stored REAL untouched when the field was absent
            use rust_decimal::prelude::ToPrimitive;
            existing.price_coefficient.to_f64().unwrap_or(3.3)
        }))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if coefficient_changed {
            PricingService::new(self.db.clone())
                .recompute_recipe(id)
                .await?;
        }

        let updated = self.fetch(id).await?;

        ActivityService::new(self.db.clone())
            .record_or_warn(
                if coefficient_changed {
                    ActivityKind::Calculate
                } else {
                    ActivityKind::Edit
                },
                "recipe",
                Some(updated.id),
                Some(&updated.name),
                if coefficient_changed {
                    "تغییر ضریب قیمت و محاسبه مجدد"
                } else {
                    "ویرایش رسپی"
                },
            )
            .await;

        Ok(updated)
    }

    /// Delete a recipe and its ingredient links in one transaction.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let recipe = self.fetch(id).await?;

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM recipes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        ActivityService::new(self.db.clone())
            .record_or_warn(
                ActivityKind::Delete,
                "recipe",
                Some(id),
                Some(&recipe.name),
                "حذف رسپی",
            )
            .await;

        Ok(())
    }

    async fn fetch(&self, id: i64) -> AppResult<Recipe> {
        sqlx::query_as::<_, Recipe>("SELECT * FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipe".to_string()))
    }

    async fn ensure_name_free(&self, name: &str, exclude_id: Option<i64>) -> AppResult<()> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM recipes WHERE name = ? AND id != ?)",
        )
        .bind(name)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_one(&self.db)
        .await?;

        if taken {
            return Err(AppError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}
