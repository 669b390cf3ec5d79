use thiserror::Error;

use crate::contract::model::UniqueField;

/// Errors that are safe to expose to other modules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsersError {
    #[error("User not found with {key}")]
    NotFound { key: String },

    #[error("User with {field} '{value}' already exists")]
    AlreadyExists { field: UniqueField, value: String },

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Internal error")]
    Internal,
}

impl UsersError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn already_exists(field: UniqueField, value: impl Into<String>) -> Self {
        Self::AlreadyExists {
            field,
            value: value.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}
