//! Audit trail of admin mutations
//!
//! Every mutating call on materials and recipes appends an activity record
//! after its own transaction commits. Recording is best-effort: a failure
//! here is logged and must never roll back the business mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use crate::error::AppResult;

/// Activity service for the audit log
#[derive(Clone)]
pub struct ActivityService {
    db: SqlitePool,
}

/// What kind of mutation an activity records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Create,
    Edit,
    Delete,
    Stock,
    Calculate,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Create => "create",
            ActivityKind::Edit => "edit",
            ActivityKind::Delete => "delete",
            ActivityKind::Stock => "stock",
            ActivityKind::Calculate => "calculate",
        }
    }
}

/// One audit record
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub entity: String,
    pub entity_id: Option<i64>,
    pub entity_name: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append one audit record.
    pub async fn record(
        &self,
        kind: ActivityKind,
        entity: &str,
        entity_id: Option<i64>,
        entity_name: Option<&str>,
        description: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activities (type, entity, entity_id, entity_name, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(kind.as_str())
        .bind(entity)
        .bind(entity_id)
        .bind(entity_name)
        .bind(description)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Append one audit record, downgrading any failure to a warning.
    pub async fn record_or_warn(
        &self,
        kind: ActivityKind,
        entity: &str,
        entity_id: Option<i64>,
        entity_name: Option<&str>,
        description: &str,
    ) {
        if let Err(e) = self
            .record(kind, entity, entity_id, entity_name, description)
            .await
        {
            tracing::warn!(
                entity,
                entity_id,
                "failed to record activity ({}): {}",
                kind.as_str(),
                e
            );
        }
    }

    /// List the most recent activities, newest first.
    pub async fn list(&self, limit: i64) -> AppResult<Vec<Activity>> {
        let activities = sqlx::query_as::<_, Activity>(
            r#"
            SELECT id, type, entity, entity_id, entity_name, description, created_at
            FROM activities
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(activities)
    }
}
