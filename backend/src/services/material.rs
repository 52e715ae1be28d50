//! Raw material management
//!
//! CRUD over the materials table plus stock tracking. A price change here is
//! what sets the cost propagation cascade in motion: every recipe using the
//! material gets its cached prices recomputed after the update commits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use validator::Validate;

use shared::validation::{validate_name, validate_price, validate_stock};

use crate::error::{AppError, AppResult};
use crate::services::activity::{ActivityKind, ActivityService};
use crate::services::pricing::PricingService;

/// Material service
#[derive(Clone)]
pub struct MaterialService {
    db: SqlitePool,
}

/// A raw material (ingredient stock item)
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Price per unit, in the smallest currency denomination
    pub price: i64,
    pub unit: String,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a material
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialInput {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub category: Option<String>,
    #[validate(range(min = 0, message = "price must be non-negative"))]
    pub price: i64,
    pub unit: Option<String>,
    #[validate(range(min = 0, message = "stock must be non-negative"))]
    pub stock: Option<i64>,
}

/// Request body for updating a material; absent fields keep their value
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaterialInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<i64>,
    pub unit: Option<String>,
    pub stock: Option<i64>,
}

/// Request body for a relative stock adjustment
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockInput {
    /// Positive to receive stock, negative to consume it
    pub delta: i64,
}

impl MaterialService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// List all materials ordered by name.
    pub async fn list(&self) -> AppResult<Vec<Material>> {
        let materials = sqlx::query_as::<_, Material>(
            "SELECT * FROM materials ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(materials)
    }

    /// Fetch one material by id.
    pub async fn get(&self, id: i64) -> AppResult<Material> {
        sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Material".to_string()))
    }

    /// Create a material. Category and unit fall back to the house defaults.
    pub async fn create(&self, input: CreateMaterialInput) -> AppResult<Material> {
        input.validate()?;

        let name = input.name.trim();
        validate_name(name).map_err(|message| AppError::Validation {
            field: "name".to_string(),
            message: message.to_string(),
            message_fa: "نام ماده اولیه نامعتبر است".to_string(),
        })?;

        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO materials (name, category, price, unit, stock, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(input.category.as_deref().unwrap_or("عمومی"))
        .bind(input.price)
        .bind(input.unit.as_deref().unwrap_or("گرم"))
        .bind(input.stock.unwrap_or(0))
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;

        let material = self.get(id).await?;

        ActivityService::new(self.db.clone())
            .record_or_warn(
                ActivityKind::Create,
                "material",
                Some(material.id),
                Some(&material.name),
                "افزودن ماده اولیه جدید",
            )
            .await;

        Ok(material)
    }

    /// Update a material. If the price changed, the recipe-price cascade runs
    /// after the update commits; `await_cascade` decides whether this call
    /// waits for it or lets it run in the background.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateMaterialInput,
        await_cascade: bool,
    ) -> AppResult<Material> {
        if let Some(name) = &input.name {
            validate_name(name).map_err(|message| AppError::Validation {
                field: "name".to_string(),
                message: message.to_string(),
                message_fa: "نام ماده اولیه نامعتبر است".to_string(),
            })?;
        }
        if let Some(price) = input.price {
            validate_price(price).map_err(|message| AppError::Validation {
                field: "price".to_string(),
                message: message.to_string(),
                message_fa: "قیمت نامعتبر است".to_string(),
            })?;
        }
        if let Some(stock) = input.stock {
            validate_stock(stock).map_err(|message| AppError::Validation {
                field: "stock".to_string(),
                message: message.to_string(),
                message_fa: "موجودی نامعتبر است".to_string(),
            })?;
        }

        // Read, merge and write in one transaction; a concurrent update
        // cannot slip between the read and the write and resurrect a stale
        // price, which would also suppress the cascade.
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Material".to_string()))?;

        sqlx::query(
            r#"
            UPDATE materials
            SET name = ?, category = ?, price = ?, unit = ?, stock = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(input.name.as_deref().map(str::trim).unwrap_or(&existing.name))
        .bind(input.category.as_deref().unwrap_or(&existing.category))
        .bind(input.price.unwrap_or(existing.price))
        .bind(input.unit.as_deref().unwrap_or(&existing.unit))
        .bind(input.stock.unwrap_or(existing.stock))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        ActivityService::new(self.db.clone())
            .record_or_warn(
                ActivityKind::Edit,
                "material",
                Some(updated.id),
                Some(&updated.name),
                "ویرایش ماده اولیه",
            )
            .await;

        if updated.price != existing.price {
            let pricing = PricingService::new(self.db.clone());
            if await_cascade {
                let recipes = pricing.recompute_for_material(id).await?;
                tracing::info!(
                    material_id = id,
                    recipes,
                    "material price changed, recipe prices recomputed"
                );
            } else {
                tokio::spawn(async move {
                    match pricing.recompute_for_material(id).await {
                        Ok(recipes) => tracing::info!(
                            material_id = id,
                            recipes,
                            "material price changed, recipe prices recomputed"
                        ),
                        Err(e) => tracing::warn!(
                            material_id = id,
                            "background price cascade failed: {}",
                            e
                        ),
                    }
                });
            }
        }

        Ok(updated)
    }

    /// Delete a material. Refused while any recipe still references it.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let material = self.get(id).await?;

        let recipe_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT recipe_id) FROM recipe_ingredients WHERE material_id = ?",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if recipe_count > 0 {
            return Err(AppError::MaterialInUse {
                name: material.name,
                recipe_count,
            });
        }

        sqlx::query("DELETE FROM materials WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        ActivityService::new(self.db.clone())
            .record_or_warn(
                ActivityKind::Delete,
                "material",
                Some(id),
                Some(&material.name),
                "حذف ماده اولیه",
            )
            .await;

        Ok(())
    }

    /// Current stock level of one material.
    pub async fn get_stock(&self, id: i64) -> AppResult<i64> {
        sqlx::query_scalar("SELECT stock FROM materials WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Material".to_string()))
    }

    /// Apply a relative stock adjustment. The resulting level must not go
    /// below zero.
    pub async fn adjust_stock(&self, id: i64, delta: i64) -> AppResult<Material> {
        let existing = self.get(id).await?;

        let new_stock = existing.stock + delta;
        if new_stock < 0 {
            return Err(AppError::Validation {
                field: "delta".to_string(),
                message: format!(
                    "stock cannot go below zero (current {}, delta {})",
                    existing.stock, delta
                ),
                message_fa: "موجودی نمی‌تواند منفی شود".to_string(),
            });
        }

        sqlx::query("UPDATE materials SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(new_stock)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.db)
            .await?;

        ActivityService::new(self.db.clone())
            .record_or_warn(
                ActivityKind::Stock,
                "material",
                Some(id),
                Some(&existing.name),
                if delta >= 0 {
                    "افزایش موجودی"
                } else {
                    "کاهش موجودی"
                },
            )
            .await;

        self.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{insert_material, insert_recipe, test_pool};
    use shared::types::IngredientEntry;

    fn create_input(name: &str, price: i64) -> CreateMaterialInput {
        CreateMaterialInput {
            name: name.to_string(),
            category: None,
            price,
            unit: None,
            stock: None,
        }
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let pool = test_pool().await;
        let service = MaterialService::new(pool);

        let material = service.create(create_input("شیر", 15_000)).await.unwrap();

        assert_eq!(material.name, "شیر");
        assert_eq!(material.category, "عمومی");
        assert_eq!(material.unit, "گرم");
        assert_eq!(material.stock, 0);
        assert_eq!(material.price, 15_000);
    }

    #[tokio::test]
    async fn create_rejects_empty_name_and_negative_price() {
        let pool = test_pool().await;
        let service = MaterialService::new(pool);

        let err = service.create(create_input("", 100)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = service.create(create_input("شیر", -1)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn create_rejects_whitespace_only_name() {
        let pool = test_pool().await;
        let service = MaterialService::new(pool.clone());

        let err = service.create(create_input("   ", 100)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "name"));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM materials")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let pool = test_pool().await;
        insert_material(&pool, "وانیل", 80_000).await;
        insert_material(&pool, "شیر", 15_000).await;

        let service = MaterialService::new(pool);
        let materials = service.list().await.unwrap();
        let names: Vec<&str> = materials.iter().map(|m| m.name.as_str()).collect();

        assert_eq!(names, vec!["شیر", "وانیل"]);
    }

    #[tokio::test]
    async fn get_unknown_material_is_not_found() {
        let pool = test_pool().await;
        let service = MaterialService::new(pool);

        let err = service.get(42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn price_update_cascades_into_recipes() {
        let pool = test_pool().await;
        let milk = insert_material(&pool, "شیر", 15_000).await;
        let latte = insert_recipe(&pool, "لاته", 3.3).await;

        PricingService::new(pool.clone())
            .replace_ingredients(
                latte,
                &[IngredientEntry {
                    material_id: milk,
                    amount: 200,
                }],
            )
            .await
            .unwrap();

        let service = MaterialService::new(pool.clone());
        let input = UpdateMaterialInput {
            price: Some(20_000),
            ..Default::default()
        };
        service.update(milk, input, true).await.unwrap();

        let (cost, _, sell): (i64, i64, i64) =
            sqlx::query_as("SELECT cost_price, base_price, sell_price FROM recipes WHERE id = ?")
                .bind(latte)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(cost, 20_000 * 200);
        assert_eq!(sell, 14_388_000);
    }

    #[tokio::test]
    async fn update_without_price_change_leaves_recipes_alone() {
        let pool = test_pool().await;
        let milk = insert_material(&pool, "شیر", 15_000).await;
        let latte = insert_recipe(&pool, "لاته", 3.3).await;

        PricingService::new(pool.clone())
            .replace_ingredients(
                latte,
                &[IngredientEntry {
                    material_id: milk,
                    amount: 200,
                }],
            )
            .await
            .unwrap();
        let before: (i64,) = sqlx::query_as("SELECT cost_price FROM recipes WHERE id = ?")
            .bind(latte)
            .fetch_one(&pool)
            .await
            .unwrap();

        let service = MaterialService::new(pool.clone());
        let input = UpdateMaterialInput {
            name: Some("شیر کم‌چرب".to_string()),
            ..Default::default()
        };
        let updated = service.update(milk, input, true).await.unwrap();

        assert_eq!(updated.name, "شیر کم‌چرب");
        assert_eq!(updated.price, 15_000);

        let after: (i64,) = sqlx::query_as("SELECT cost_price FROM recipes WHERE id = ?")
            .bind(latte)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(after.0, before.0);
    }

    #[tokio::test]
    async fn concurrent_updates_do_not_lose_the_price_change() {
        let pool = test_pool().await;
        let milk = insert_material(&pool, "شیر", 1_000).await;
        let latte = insert_recipe(&pool, "لاته", 1.0).await;

        PricingService::new(pool.clone())
            .replace_ingredients(
                latte,
                &[IngredientEntry {
                    material_id: milk,
                    amount: 200,
                }],
            )
            .await
            .unwrap();

        let service = MaterialService::new(pool.clone());
        let price_update = service.update(
            milk,
            UpdateMaterialInput {
                price: Some(1_200),
                ..Default::default()
            },
            true,
        );
        let name_update = service.update(
            milk,
            UpdateMaterialInput {
                name: Some("شیر پرچرب".to_string()),
                ..Default::default()
            },
            true,
        );
        let (a, b) = tokio::join!(price_update, name_update);
        a.unwrap();
        b.unwrap();

        // Neither update may clobber the other, and the cascade must have run
        // against the new price.
        let material = service.get(milk).await.unwrap();
        assert_eq!(material.price, 1_200);
        assert_eq!(material.name, "شیر پرچرب");

        let cost: i64 = sqlx::query_scalar("SELECT cost_price FROM recipes WHERE id = ?")
            .bind(latte)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(cost, 1_200 * 200);
    }

    #[tokio::test]
    async fn delete_refused_while_material_in_use() {
        let pool = test_pool().await;
        let milk = insert_material(&pool, "شیر", 15_000).await;
        let latte = insert_recipe(&pool, "لاته", 3.3).await;

        PricingService::new(pool.clone())
            .replace_ingredients(
                latte,
                &[IngredientEntry {
                    material_id: milk,
                    amount: 200,
                }],
            )
            .await
            .unwrap();

        let service = MaterialService::new(pool.clone());
        let err = service.delete(milk).await.unwrap_err();

        match err {
            AppError::MaterialInUse { name, recipe_count } => {
                assert_eq!(name, "شیر");
                assert_eq!(recipe_count, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Still there.
        assert!(service.get(milk).await.is_ok());
    }

    #[tokio::test]
    async fn delete_unreferenced_material_succeeds() {
        let pool = test_pool().await;
        let milk = insert_material(&pool, "شیر", 15_000).await;

        let service = MaterialService::new(pool.clone());
        service.delete(milk).await.unwrap();

        let err = service.get(milk).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn adjust_stock_rejects_going_below_zero() {
        let pool = test_pool().await;
        let milk = insert_material(&pool, "شیر", 15_000).await;

        let service = MaterialService::new(pool.clone());
        service.adjust_stock(milk, 500).await.unwrap();

        let err = service.adjust_stock(milk, -600).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        assert_eq!(service.get_stock(milk).await.unwrap(), 500);

        let material = service.adjust_stock(milk, -500).await.unwrap();
        assert_eq!(material.stock, 0);
    }
}
