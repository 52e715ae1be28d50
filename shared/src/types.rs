//! Common wire types used across the admin API

use serde::{Deserialize, Deserializer, Serialize};

/// One `{materialId, amount}` entry in an ingredient-list replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientEntry {
    pub material_id: i64,
    pub amount: i64,
}

/// Sort order for report queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Deserialize helper that distinguishes an absent field from an explicit
/// `null`. Use with `#[serde(default, deserialize_with = "double_option")]`
/// on an `Option<Option<T>>` field: `None` means the field was omitted,
/// `Some(None)` means it was sent as `null`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
