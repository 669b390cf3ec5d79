use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use task_pool::TaskPool;
use tracing::info;

use crate::api::rest::{openapi, routes};
use crate::config::UsersConfig;
use crate::contract::client::UsersApi;
use crate::domain::cache::UserCache;
use crate::domain::repo::UsersRepository;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::UsersLocalClient;
use crate::infra::storage::{Migrator, SeaOrmUsersRepository};
use crate::metrics::UserMetrics;

/// The users module: storage, domain service, in-process client and REST surface.
pub struct UsersModule {
    service: Arc<Service>,
    config: UsersConfig,
}

impl UsersModule {
    /// Run the schema migrations on `db` and wire the service around it.
    pub async fn init(cfg: UsersConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        Migrator::up(&db, None)
            .await
            .context("users: schema migration failed")?;

        let repo: Arc<dyn UsersRepository> = Arc::new(SeaOrmUsersRepository::new(db));
        let metrics = UserMetrics::new(repo.clone()).context("users: metrics registry")?;
        let cache = if cfg.cache.enabled {
            UserCache::new(true, cfg.cache.max_entries)
        } else {
            UserCache::disabled()
        };
        let pool = TaskPool::new(cfg.executor.clone()).context("users: executor")?;

        let service = Service::new(
            repo,
            Arc::new(cache),
            Arc::new(metrics),
            pool,
            ServiceConfig {
                min_username_len: cfg.validation.min_username_len,
                max_username_len: cfg.validation.max_username_len,
                max_full_name_len: cfg.validation.max_full_name_len,
            },
        );

        info!(
            cache_enabled = cfg.cache.enabled,
            core_workers = cfg.executor.core_workers,
            max_workers = cfg.executor.max_workers,
            "users module initialized"
        );

        Ok(Self {
            service: Arc::new(service),
            config: cfg,
        })
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    /// In-process client for other modules.
    pub fn client(&self) -> Arc<dyn UsersApi> {
        Arc::new(UsersLocalClient::new(self.service.clone()))
    }

    pub fn register_rest(&self, router: Router) -> Router {
        routes::register_routes(router, self.service.clone())
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        openapi::openapi(&self.config.openapi.context_path)
    }

    pub async fn shutdown(&self) {
        self.service.shutdown().await;
        info!("users module stopped");
    }
}
