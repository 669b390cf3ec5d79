use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::UsersApi,
    error::UsersError,
    model::{NewUser, User, UserPatch},
};
use crate::domain::{error::DomainError, service::Service};

/// In-process implementation of [`UsersApi`] that delegates to the domain service.
pub struct UsersLocalClient {
    service: Arc<Service>,
}

impl UsersLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UsersApi for UsersLocalClient {
    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersError> {
        self.service.create_user(new_user).await.map_err(Into::into)
    }

    async fn get_user(&self, id: i64) -> Result<User, UsersError> {
        self.service.get_user(id).await.map_err(Into::into)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, UsersError> {
        self.service
            .get_user_by_username_async(username)
            .await
            .map_err(Into::into)
    }

    async fn list_active_users(&self) -> Result<Vec<User>, UsersError> {
        self.service.get_all_active_users().await.map_err(Into::into)
    }

    async fn search_users_by_name(&self, fragment: &str) -> Result<Vec<User>, UsersError> {
        self.service
            .search_users_by_name(fragment)
            .await
            .map_err(Into::into)
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, UsersError> {
        self.service.update_user(id, patch).await.map_err(Into::into)
    }

    async fn deactivate_user(&self, id: i64) -> Result<(), UsersError> {
        self.service.deactivate_user(id).await.map_err(Into::into)
    }
}

/// Database details stay inside the module.
impl From<DomainError> for UsersError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound { key } => UsersError::not_found(key.to_string()),
            DomainError::AlreadyExists { field, value } => UsersError::already_exists(field, value),
            DomainError::Validation { field, message } => UsersError::validation(field, message),
            DomainError::Unavailable { message } => UsersError::unavailable(message),
            DomainError::Database { message } => {
                tracing::error!(%message, "database error hidden from client");
                UsersError::internal()
            }
        }
    }
}
