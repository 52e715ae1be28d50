//! Error handling for the cafe admin backend
//!
//! Provides consistent error responses in English and Persian

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fa: String,
    },

    /// One entry in an ingredient-list replacement is invalid; carries the
    /// offending index so the caller can fix the request.
    #[error("Invalid ingredient at index {index}: {message}")]
    InvalidIngredient {
        index: usize,
        message: String,
        message_fa: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Referential integrity: the material is still referenced by recipes.
    #[error("Material '{name}' is used by {recipe_count} recipe(s)")]
    MaterialInUse { name: String, recipe_count: i64 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fa: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation {
                field,
                message,
                message_fa,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_fa: message_fa.clone(),
                    field: Some(field.clone()),
                    index: None,
                },
            ),
            AppError::InvalidIngredient {
                index,
                message,
                message_fa,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_INGREDIENT".to_string(),
                    message_en: message.clone(),
                    message_fa: message_fa.clone(),
                    field: None,
                    index: Some(*index),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_fa: format!("{} یافت نشد", resource),
                    field: None,
                    index: None,
                },
            ),
            AppError::DuplicateName(name) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_NAME".to_string(),
                    message_en: format!("A recipe named '{}' already exists", name),
                    message_fa: format!("رسپی با نام «{}» از قبل وجود دارد", name),
                    field: Some("name".to_string()),
                    index: None,
                },
            ),
            AppError::MaterialInUse { name, recipe_count } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "MATERIAL_IN_USE".to_string(),
                    message_en: format!(
                        "Cannot delete material '{}': it is used by {} recipe(s). Remove it from those recipes first.",
                        name, recipe_count
                    ),
                    message_fa: format!(
                        "ماده اولیه «{}» در {} رسپی استفاده شده است و قابل حذف نیست",
                        name, recipe_count
                    ),
                    field: None,
                    index: None,
                },
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "STORAGE_ERROR".to_string(),
                    message_en: "A storage error occurred".to_string(),
                    message_fa: "خطا در ذخیره‌سازی داده‌ها رخ داد".to_string(),
                    field: None,
                    index: None,
                },
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_fa: "خطای داخلی سرور رخ داد".to_string(),
                    field: None,
                    index: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "invalid value".to_string());
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("body".to_string(), "invalid request body".to_string()));

        AppError::Validation {
            field,
            message,
            message_fa: "داده ورودی نامعتبر است".to_string(),
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
