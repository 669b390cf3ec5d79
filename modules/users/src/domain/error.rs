use std::fmt;

use task_pool::PoolError;
use thiserror::Error;

pub use crate::contract::model::UniqueField;

/// How a missing user was addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey {
    Id(i64),
    Username(String),
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserKey::Id(id) => write!(f, "id {id}"),
            UserKey::Username(username) => write!(f, "username '{username}'"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("User not found with {key}")]
    NotFound { key: UserKey },

    #[error("User with {field} '{value}' already exists")]
    AlreadyExists { field: UniqueField, value: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn not_found(id: i64) -> Self {
        Self::NotFound {
            key: UserKey::Id(id),
        }
    }

    pub fn username_not_found(username: impl Into<String>) -> Self {
        Self::NotFound {
            key: UserKey::Username(username.into()),
        }
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

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl From<PoolError> for DomainError {
    fn from(e: PoolError) -> Self {
        Self::unavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_key() {
        assert!(DomainError::not_found(999).to_string().contains("999"));
        assert!(DomainError::username_not_found("ghost")
            .to_string()
            .contains("ghost"));
    }

    #[test]
    fn already_exists_keeps_the_field() {
        let e = DomainError::already_exists(UniqueField::Email, "a@b.io");
        assert_eq!(e.to_string(), "User with email 'a@b.io' already exists");
        assert!(matches!(
            e,
            DomainError::AlreadyExists {
                field: UniqueField::Email,
                ..
            }
        ));
    }

    #[test]
    fn pool_rejection_maps_to_unavailable() {
        let e: DomainError = PoolError::Saturated {
            queue_capacity: 1,
            max_workers: 1,
        }
        .into();
        assert!(matches!(e, DomainError::Unavailable { .. }));
    }
}
