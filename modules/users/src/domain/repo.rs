use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::contract::model::{UniqueField, User};

/// A row to insert; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raised by adapters when the store rejects a write on a unique column.
/// Travels inside `anyhow::Error`; the service downcasts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unique constraint violated on {field}")]
pub struct UniqueViolation {
    pub field: UniqueField,
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn exists_by_username(&self, username: &str) -> anyhow::Result<bool>;
    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    /// Active users in ascending id order.
    async fn find_active(&self) -> anyhow::Result<Vec<User>>;
    /// Users whose full name contains `fragment`, case-sensitive, ascending id order.
    async fn find_by_full_name_containing(&self, fragment: &str) -> anyhow::Result<Vec<User>>;
    async fn count(&self) -> anyhow::Result<u64>;
    async fn count_active(&self) -> anyhow::Result<u64>;
    /// Insert and return the persisted row, id included.
    async fn insert(&self, record: NewUserRecord) -> anyhow::Result<User>;
    /// Overwrite the row with primary key `user.id` and return the persisted row.
    async fn update(&self, user: User) -> anyhow::Result<User>;
}
