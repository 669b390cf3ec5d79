#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use users::config::UsersConfig;
use users::contract::model::NewUser;
use users::UsersModule;

/// One connection keeps the in-memory database alive for the whole test.
pub async fn memory_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .idle_timeout(Duration::from_secs(3600))
        .sqlx_logging(false);
    Database::connect(opts).await.expect("in-memory sqlite")
}

pub async fn module_with(cfg: UsersConfig) -> UsersModule {
    UsersModule::init(cfg, memory_db().await)
        .await
        .expect("users module")
}

pub async fn module() -> UsersModule {
    module_with(UsersConfig::default()).await
}

pub fn router(module: &UsersModule) -> Router {
    module.register_rest(Router::new())
}

pub fn new_user(username: &str, email: &str, full_name: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: email.to_string(),
        full_name: full_name.to_string(),
    }
}

pub fn test_user() -> NewUser {
    new_user("testuser", "test@example.com", "Test User")
}
