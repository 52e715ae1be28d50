//! Sales reporting
//!
//! Read-only aggregations over the orders written by the order-taking flow.
//! Categories with no sales still show up with zeros so the dashboard can
//! render a complete breakdown.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use shared::types::SortOrder;

use crate::error::AppResult;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: SqlitePool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategorySales {
    pub category: String,
    pub total_sales: i64,
    pub items_sold: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HourlySales {
    /// Hour of day, 0-23
    pub hour: i64,
    pub total_sales: i64,
    pub order_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SellerRow {
    pub recipe_id: i64,
    pub recipe_name: String,
    pub quantity_sold: i64,
    pub total_sales: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub material_count: i64,
    pub recipe_count: i64,
    pub today_sales: i64,
    pub today_orders: i64,
}

impl ReportingService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Sales totals per recipe category. Every category that has a recipe
    /// appears, even with zero sales.
    pub async fn sales_by_category(&self) -> AppResult<Vec<CategorySales>> {
        let rows = sqlx::query_as::<_, CategorySales>(
            r#"
            SELECT r.category,
                   COALESCE(SUM(oi.total_price), 0) AS total_sales,
                   COALESCE(SUM(oi.quantity), 0) AS items_sold
            FROM recipes r
            LEFT JOIN order_items oi ON oi.recipe_id = r.id
            GROUP BY r.category
            ORDER BY total_sales DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Order totals grouped by hour of day. Hours with no orders are absent.
    pub async fn sales_by_hour(&self) -> AppResult<Vec<HourlySales>> {
        let rows = sqlx::query_as::<_, HourlySales>(
            r#"
            SELECT CAST(strftime('%H', created_at) AS INTEGER) AS hour,
                   SUM(total_amount) AS total_sales,
                   COUNT(*) AS order_count
            FROM orders
            GROUP BY hour
            ORDER BY hour
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Recipes ranked by quantity sold. Descending gives the best sellers,
    /// ascending the worst. Optionally restricted to one year and month.
    pub async fn sellers(
        &self,
        limit: i64,
        year: Option<i32>,
        month: Option<u32>,
        order: SortOrder,
    ) -> AppResult<Vec<SellerRow>> {
        let mut sql = String::from(
            "SELECT oi.recipe_id, oi.recipe_name, \
             SUM(oi.quantity) AS quantity_sold, SUM(oi.total_price) AS total_sales \
             FROM order_items oi",
        );

        let mut clauses = Vec::new();
        if year.is_some() {
            clauses.push("strftime('%Y', oi.created_at) = ?");
        }
        if month.is_some() {
            clauses.push("strftime('%m', oi.created_at) = ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        // Only the sort direction is interpolated, and it comes from an enum.
        sql.push_str(&format!(
            " GROUP BY oi.recipe_id, oi.recipe_name ORDER BY quantity_sold {} LIMIT ?",
            order.as_sql()
        ));

        let mut query = sqlx::query_as::<_, SellerRow>(&sql);
        if let Some(year) = year {
            query = query.bind(format!("{year:04}"));
        }
        if let Some(month) = month {
            query = query.bind(format!("{month:02}"));
        }
        let rows = query.bind(limit).fetch_all(&self.db).await?;

        Ok(rows)
    }

    /// Headline numbers for the dashboard.
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let material_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM materials")
            .fetch_one(&self.db)
            .await?;
        let recipe_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
            .fetch_one(&self.db)
            .await?;
        let (today_sales, today_orders): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_amount), 0), COUNT(*)
            FROM orders
            WHERE date(created_at) = date('now')
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardStats {
            material_count,
            recipe_count,
            today_sales,
            today_orders,
        })
    }
}
