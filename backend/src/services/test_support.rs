//! Shared fixtures for service tests: an in-memory database with the real
//! migrations applied, plus row insert helpers.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// A fresh in-memory database. One connection only, so every query in a test
/// sees the same database.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

pub async fn insert_material(pool: &SqlitePool, name: &str, price: i64) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO materials (name, price, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(price)
    .bind(chrono::Utc::now())
    .bind(chrono::Utc::now())
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_recipe(pool: &SqlitePool, name: &str, coefficient: f64) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO recipes (name, category, price_coefficient, created_at, updated_at)
        VALUES (?, 'نوشیدنی گرم', ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(coefficient)
    .bind(chrono::Utc::now())
    .bind(chrono::Utc::now())
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_order(
    pool: &SqlitePool,
    order_number: &str,
    total_amount: i64,
    created_at: &str,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO orders (order_number, total_amount, created_at)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(order_number)
    .bind(total_amount)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_order_item(
    pool: &SqlitePool,
    order_id: i64,
    recipe_id: i64,
    recipe_name: &str,
    price: i64,
    quantity: i64,
    created_at: &str,
) {
    sqlx::query(
        r#"
        INSERT INTO order_items (order_id, recipe_id, recipe_name, price, quantity, total_price, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(order_id)
    .bind(recipe_id)
    .bind(recipe_name)
    .bind(price)
    .bind(quantity)
    .bind(price * quantity)
    .bind(created_at)
    .execute(pool)
    .await
    .unwrap();
}
