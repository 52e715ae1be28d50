//! Cost propagation engine
//!
//! Keeps each recipe's derived prices (raw, base, sell) consistent with its
//! ingredient list and the current material prices. Ingredient lists are
//! replaced as a whole set inside one transaction; material price changes
//! cascade into every recipe that references the material.

use anyhow::anyhow;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

use shared::pricing::{derive_prices, DerivedPrices, IngredientCost};
use shared::types::IngredientEntry;
use shared::validation::{validate_ingredient_entries, IngredientEntryError};

use crate::error::{AppError, AppResult};
use crate::services::activity::{ActivityKind, ActivityService};

/// Cost propagation service
#[derive(Clone)]
pub struct PricingService {
    db: SqlitePool,
}

/// One ingredient link enriched with the referenced material's current
/// name, unit and price, as returned to the UI.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IngredientWithMaterial {
    pub id: i64,
    pub recipe_id: i64,
    pub material_id: i64,
    pub amount: i64,
    pub material_name: String,
    pub material_unit: String,
    pub material_price: i64,
}

impl PricingService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Compute a recipe's derived prices from current state without
    /// persisting anything. Fails with `NotFound` if the recipe is absent.
    pub async fn compute_derived_prices(&self, recipe_id: i64) -> AppResult<DerivedPrices> {
        let coefficient = sqlx::query_scalar::<_, f64>(
            "SELECT price_coefficient FROM recipes WHERE id = ?",
        )
        .bind(recipe_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;

        let costs = self.ingredient_costs(recipe_id).await?;
        Ok(derive_prices(&costs, to_decimal(coefficient)?))
    }

    /// Atomically replace a recipe's entire ingredient set and recompute its
    /// derived prices. On any failure the recipe's ingredients and prices are
    /// left exactly as they were. Returns the persisted list enriched with
    /// material info.
    pub async fn replace_ingredients(
        &self,
        recipe_id: i64,
        entries: &[IngredientEntry],
    ) -> AppResult<Vec<IngredientWithMaterial>> {
        let recipe = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM recipes WHERE id = ?")
            .bind(recipe_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;

        // Shape validation: positive ids and amounts, no duplicate material
        // within one call. The whole call fails on the first bad entry.
        validate_ingredient_entries(entries).map_err(|(index, reason)| {
            AppError::InvalidIngredient {
                index,
                message: reason.to_string(),
                message_fa: match reason {
                    IngredientEntryError::InvalidMaterialId => {
                        "شناسه ماده اولیه نامعتبر است".to_string()
                    }
                    IngredientEntryError::InvalidAmount => {
                        "مقدار ماده اولیه باید عدد مثبت باشد".to_string()
                    }
                    IngredientEntryError::DuplicateMaterial => {
                        "ماده اولیه تکراری در لیست وجود دارد".to_string()
                    }
                },
            }
        })?;

        // Every referenced material must exist.
        for (index, entry) in entries.iter().enumerate() {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM materials WHERE id = ?)",
            )
            .bind(entry.material_id)
            .fetch_one(&self.db)
            .await?;

            if !exists {
                return Err(AppError::InvalidIngredient {
                    index,
                    message: format!("material {} does not exist", entry.material_id),
                    message_fa: "ماده اولیه یافت نشد".to_string(),
                });
            }
        }

        // Delete, bulk-insert and recompute inside one transaction; dropping
        // the transaction on an error path rolls everything back.
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;

        for entry in entries {
            sqlx::query(
                "INSERT INTO recipe_ingredients (recipe_id, material_id, amount) VALUES (?, ?, ?)",
            )
            .bind(recipe_id)
            .bind(entry.material_id)
            .bind(entry.amount)
            .execute(&mut *tx)
            .await?;
        }

        Self::recompute_in_tx(&mut tx, recipe_id).await?;

        tx.commit().await?;

        ActivityService::new(self.db.clone())
            .record_or_warn(
                ActivityKind::Edit,
                "recipe",
                Some(recipe_id),
                Some(&recipe.1),
                "ویرایش مواد اولیه رسپی",
            )
            .await;

        self.ingredients_with_materials(recipe_id).await
    }

    /// Recompute and persist one recipe's derived prices from current state.
    pub async fn recompute_recipe(&self, recipe_id: i64) -> AppResult<DerivedPrices> {
        let mut tx = self.db.begin().await?;
        let prices = Self::recompute_in_tx(&mut tx, recipe_id).await?;
        tx.commit().await?;
        Ok(prices)
    }

    /// Cascade a material price change into every recipe that references the
    /// material. Best-effort per recipe: one recipe's failure is logged and
    /// does not abort the rest. Returns the number of recipes updated.
    pub async fn recompute_for_material(&self, material_id: i64) -> AppResult<u64> {
        let affected = sqlx::query_as::<_, (i64, String)>(
            r#"
            SELECT DISTINCT r.id, r.name
            FROM recipes r
            JOIN recipe_ingredients ri ON ri.recipe_id = r.id
            WHERE ri.material_id = ?
            "#,
        )
        .bind(material_id)
        .fetch_all(&self.db)
        .await?;

        let mut updated = 0u64;
        for (recipe_id, name) in affected {
            match self.recompute_recipe(recipe_id).await {
                Ok(prices) => {
                    updated += 1;
                    tracing::debug!(
                        recipe_id,
                        name = %name,
                        raw_price = prices.raw_price,
                        sell_price = prices.sell_price,
                        "recipe prices recomputed"
                    );
                }
                Err(e) => {
                    tracing::warn!(recipe_id, name = %name, "failed to recompute recipe prices: {}", e);
                }
            }
        }

        Ok(updated)
    }

    /// The ingredient list of a recipe, enriched with material info.
    pub async fn ingredients_with_materials(
        &self,
        recipe_id: i64,
    ) -> AppResult<Vec<IngredientWithMaterial>> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM recipes WHERE id = ?)")
            .bind(recipe_id)
            .fetch_one(&self.db)
            .await?;

        if !exists {
            return Err(AppError::NotFound("Recipe".to_string()));
        }

        let ingredients = sqlx::query_as::<_, IngredientWithMaterial>(
            r#"
            SELECT ri.id, ri.recipe_id, ri.material_id, ri.amount,
                   m.name AS material_name, m.unit AS material_unit, m.price AS material_price
            FROM recipe_ingredients ri
            JOIN materials m ON m.id = ri.material_id
            WHERE ri.recipe_id = ?
            ORDER BY m.name
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ingredients)
    }

    /// Recompute one recipe's prices and persist them, inside the caller's
    /// transaction.
    async fn recompute_in_tx(
        tx: &mut Transaction<'_, Sqlite>,
        recipe_id: i64,
    ) -> AppResult<DerivedPrices> {
        let coefficient = sqlx::query_scalar::<_, f64>(
            "SELECT price_coefficient FROM recipes WHERE id = ?",
        )
        .bind(recipe_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;

        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT m.price, ri.amount
            FROM recipe_ingredients ri
            JOIN materials m ON m.id = ri.material_id
            WHERE ri.recipe_id = ?
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&mut **tx)
        .await?;

        let costs: Vec<IngredientCost> = rows
            .into_iter()
            .map(|(material_price, amount)| IngredientCost {
                material_price,
                amount,
            })
            .collect();

        let prices = derive_prices(&costs, to_decimal(coefficient)?);

        sqlx::query(
            r#"
            UPDATE recipes
            SET cost_price = ?, base_price = ?, sell_price = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(prices.raw_price)
        .bind(prices.base_price)
        .bind(prices.sell_price)
        .bind(chrono::Utc::now())
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

        Ok(prices)
    }

    /// Current ingredient costs for a recipe, outside any transaction.
    async fn ingredient_costs(&self, recipe_id: i64) -> AppResult<Vec<IngredientCost>> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT m.price, ri.amount
            FROM recipe_ingredients ri
            JOIN materials m ON m.id = ri.material_id
            WHERE ri.recipe_id = ?
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(material_price, amount)| IngredientCost {
                material_price,
                amount,
            })
            .collect())
    }
}

/// The coefficient is stored as REAL; convert back to the exact decimal the
/// admin entered (shortest representation).
pub(crate) fn to_decimal(coefficient: f64) -> AppResult<Decimal> {
    Decimal::try_from(coefficient)
        .map_err(|e| AppError::Internal(anyhow!("invalid price coefficient: {e}")))
}
