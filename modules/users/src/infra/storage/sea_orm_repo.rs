//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over `C: ConnectionTrait`, so it can be built on a
//! `DatabaseConnection` or on a transaction.

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, SqlErr,
};
use tracing::debug;

use crate::contract::model::{UniqueField, User};
use crate::domain::repo::{NewUserRecord, UniqueViolation, UsersRepository};
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};
use crate::infra::storage::mapper::update_model;

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn exists_by_username(&self, username: &str) -> anyhow::Result<bool> {
        let count = UserEntity::find()
            .filter(Column::Username.eq(username))
            .count(&self.conn)
            .await
            .context("exists_by_username failed")?;
        Ok(count > 0)
    }

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool> {
        let count = UserEntity::find()
            .filter(Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("exists_by_email failed")?;
        Ok(count > 0)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let found = UserEntity::find()
            .filter(Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("find_by_username failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_active(&self) -> anyhow::Result<Vec<User>> {
        let rows = UserEntity::find()
            .filter(Column::IsActive.eq(true))
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("find_active failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_full_name_containing(&self, fragment: &str) -> anyhow::Result<Vec<User>> {
        // LIKE ignores ASCII case on some backends, so it only narrows the candidates.
        let rows = UserEntity::find()
            .filter(Column::FullName.contains(fragment))
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("find_by_full_name_containing failed")?;
        let candidates = rows.len();
        let users: Vec<User> = rows
            .into_iter()
            .filter(|m| m.full_name.contains(fragment))
            .map(Into::into)
            .collect();
        debug!(candidates, matched = users.len(), "name search");
        Ok(users)
    }

    async fn count(&self) -> anyhow::Result<u64> {
        UserEntity::find()
            .count(&self.conn)
            .await
            .context("count failed")
    }

    async fn count_active(&self) -> anyhow::Result<u64> {
        UserEntity::find()
            .filter(Column::IsActive.eq(true))
            .count(&self.conn)
            .await
            .context("count_active failed")
    }

    async fn insert(&self, record: NewUserRecord) -> anyhow::Result<User> {
        let m: UserAM = record.into();
        let saved = m
            .insert(&self.conn)
            .await
            .map_err(|e| write_failure(e, "insert failed"))?;
        Ok(saved.into())
    }

    async fn update(&self, u: User) -> anyhow::Result<User> {
        let saved = update_model(u)
            .update(&self.conn)
            .await
            .map_err(|e| write_failure(e, "update failed"))?;
        Ok(saved.into())
    }
}

/// Unique-key rejections become [`UniqueViolation`]; anything else keeps its context.
fn write_failure(err: DbErr, what: &'static str) -> anyhow::Error {
    if let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() {
        if let Some(field) = unique_field_from_message(&message) {
            return UniqueViolation { field }.into();
        }
    }
    anyhow::Error::new(err).context(what)
}

/// Backends name the violated column or index in the message,
/// e.g. SQLite's "UNIQUE constraint failed: users.email".
fn unique_field_from_message(message: &str) -> Option<UniqueField> {
    let lower = message.to_ascii_lowercase();
    if lower.contains("email") {
        Some(UniqueField::Email)
    } else if lower.contains("username") {
        Some(UniqueField::Username)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_unique_columns_in_backend_messages() {
        assert_eq!(
            unique_field_from_message("UNIQUE constraint failed: users.email"),
            Some(UniqueField::Email)
        );
        assert_eq!(
            unique_field_from_message(
                "duplicate key value violates unique constraint \"users_username_key\""
            ),
            Some(UniqueField::Username)
        );
        assert_eq!(unique_field_from_message("UNIQUE constraint failed: users.id"), None);
    }
}
