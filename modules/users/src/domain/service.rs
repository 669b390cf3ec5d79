use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use task_pool::{PoolStats, TaskPool};
use tracing::{debug, debug_span, info, instrument, Instrument};

use crate::contract::model::{NewUser, UniqueField, User, UserPatch};
use crate::domain::cache::{CacheStats, UserCache};
use crate::domain::error::DomainError;
use crate::domain::repo::{NewUserRecord, UniqueViolation, UsersRepository};
use crate::domain::validation;
use crate::metrics::{Operation, UserMetrics};

/// Domain service with business rules for user management.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    cache: Arc<UserCache>,
    metrics: Arc<UserMetrics>,
    pool: TaskPool,
    config: ServiceConfig,
}

/// Validation limits applied to incoming user data.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub min_username_len: usize,
    pub max_username_len: usize,
    pub max_full_name_len: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            min_username_len: 3,
            max_username_len: 50,
            max_full_name_len: 100,
        }
    }
}

impl Service {
    pub fn new(
        repo: Arc<dyn UsersRepository>,
        cache: Arc<UserCache>,
        metrics: Arc<UserMetrics>,
        pool: TaskPool,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repo,
            cache,
            metrics,
            pool,
            config,
        }
    }

    #[instrument(
        name = "users.service.create_user",
        skip(self, new_user),
        fields(username = %new_user.username, email = %new_user.email)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        self.metrics
            .observe(Operation::Create, self.create_user_inner(new_user))
            .await
    }

    async fn create_user_inner(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");
        validation::validate_new_user(&new_user, &self.config)?;

        if self
            .repo
            .exists_by_username(&new_user.username)
            .await
            .map_err(db_error)?
        {
            return Err(DomainError::already_exists(
                UniqueField::Username,
                new_user.username,
            ));
        }
        if self
            .repo
            .exists_by_email(&new_user.email)
            .await
            .map_err(db_error)?
        {
            return Err(DomainError::already_exists(
                UniqueField::Email,
                new_user.email,
            ));
        }

        let now = Utc::now();
        let record = NewUserRecord {
            username: new_user.username,
            email: new_user.email,
            full_name: new_user.full_name,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let (username, email) = (record.username.clone(), record.email.clone());

        let user = self
            .repo
            .insert(record)
            .await
            .map_err(|e| write_error(e, &username, &email))?;

        self.cache.refresh(&user);
        info!(user_id = user.id, "Successfully created user");
        Ok(user)
    }

    #[instrument(name = "users.service.get_user", skip(self), fields(user_id = id))]
    pub async fn get_user(&self, id: i64) -> Result<User, DomainError> {
        if let Some(user) = self.cache.get(id) {
            debug!("Cache hit");
            return Ok(user);
        }

        let user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| DomainError::not_found(id))?;
        self.cache.put(&user);
        debug!("Successfully retrieved user");
        Ok(user)
    }

    #[instrument(name = "users.service.get_user_by_username", skip(self))]
    pub async fn get_user_by_username(&self, username: &str) -> Result<User, DomainError> {
        lookup_username(self.repo.clone(), username.to_string()).await
    }

    /// Submit the lookup to the worker pool right away and return a future for its result.
    ///
    /// The future does not borrow the service; a saturated or stopped pool
    /// resolves it with [`DomainError::Unavailable`].
    pub fn get_user_by_username_async(
        &self,
        username: impl Into<String>,
    ) -> impl Future<Output = Result<User, DomainError>> + Send + 'static {
        let username = username.into();
        let span = debug_span!("users.service.get_user_by_username_async", username = %username);
        let submitted = self
            .pool
            .submit(lookup_username(self.repo.clone(), username).instrument(span));

        async move {
            let outcome: Result<User, DomainError> = match submitted {
                Ok(handle) => handle.await.unwrap_or_else(|e| Err(e.into())),
                Err(e) => Err(e.into()),
            };
            outcome
        }
    }

    #[instrument(name = "users.service.get_all_active_users", skip(self))]
    pub async fn get_all_active_users(&self) -> Result<Vec<User>, DomainError> {
        let users = self.repo.find_active().await.map_err(db_error)?;
        debug!(count = users.len(), "Listed active users");
        Ok(users)
    }

    #[instrument(name = "users.service.search_users_by_name", skip(self))]
    pub async fn search_users_by_name(&self, fragment: &str) -> Result<Vec<User>, DomainError> {
        let users = self
            .repo
            .find_by_full_name_containing(fragment)
            .await
            .map_err(db_error)?;
        debug!(count = users.len(), "Searched users by name");
        Ok(users)
    }

    #[instrument(name = "users.service.update_user", skip(self, patch), fields(user_id = id))]
    pub async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, DomainError> {
        self.metrics
            .observe(Operation::Update, self.update_user_inner(id, patch))
            .await
    }

    async fn update_user_inner(&self, id: i64, patch: UserPatch) -> Result<User, DomainError> {
        info!("Updating user");
        validation::validate_patch(&patch, &self.config)?;

        let mut current = self.load_for_write(id).await?;

        if let Some(username) = &patch.username {
            if username != &current.username
                && self
                    .repo
                    .exists_by_username(username)
                    .await
                    .map_err(db_error)?
            {
                return Err(DomainError::already_exists(
                    UniqueField::Username,
                    username.clone(),
                ));
            }
        }
        if let Some(email) = &patch.email {
            if email != &current.email
                && self.repo.exists_by_email(email).await.map_err(db_error)?
            {
                return Err(DomainError::already_exists(
                    UniqueField::Email,
                    email.clone(),
                ));
            }
        }

        if let Some(username) = patch.username {
            current.username = username;
        }
        if let Some(email) = patch.email {
            current.email = email;
        }
        if let Some(full_name) = patch.full_name {
            current.full_name = full_name;
        }
        if let Some(is_active) = patch.is_active {
            current.is_active = is_active;
        }
        current.updated_at = next_timestamp(current.updated_at);

        let user = self.persist(current).await?;
        info!("Successfully updated user");
        Ok(user)
    }

    #[instrument(name = "users.service.deactivate_user", skip(self), fields(user_id = id))]
    pub async fn deactivate_user(&self, id: i64) -> Result<(), DomainError> {
        self.metrics
            .observe(Operation::Deactivate, self.deactivate_user_inner(id))
            .await
    }

    async fn deactivate_user_inner(&self, id: i64) -> Result<(), DomainError> {
        info!("Deactivating user");
        let mut current = self.load_for_write(id).await?;
        current.is_active = false;
        current.updated_at = next_timestamp(current.updated_at);

        self.persist(current).await?;
        info!("Successfully deactivated user");
        Ok(())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn metrics(&self) -> &UserMetrics {
        &self.metrics
    }

    /// Stop the worker pool; pending asynchronous lookups resolve as unavailable.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }

    // Writes always start from the store, never from the cache.
    async fn load_for_write(&self, id: i64) -> Result<User, DomainError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(db_error)?
            .ok_or_else(|| DomainError::not_found(id))
    }

    async fn persist(&self, user: User) -> Result<User, DomainError> {
        let (id, username, email) = (user.id, user.username.clone(), user.email.clone());
        match self.repo.update(user).await {
            Ok(saved) => {
                self.cache.refresh(&saved);
                Ok(saved)
            }
            Err(e) => {
                // The row may or may not have changed; let the next read go to the store.
                self.cache.invalidate(id);
                Err(write_error(e, &username, &email))
            }
        }
    }
}

async fn lookup_username(
    repo: Arc<dyn UsersRepository>,
    username: String,
) -> Result<User, DomainError> {
    repo.find_by_username(&username)
        .await
        .map_err(db_error)?
        .ok_or_else(|| DomainError::username_not_found(username))
}

/// `updated_at` must move forward even when the clock has not.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn db_error(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

fn write_error(e: anyhow::Error, username: &str, email: &str) -> DomainError {
    match e.downcast_ref::<UniqueViolation>() {
        Some(UniqueViolation {
            field: UniqueField::Username,
        }) => DomainError::already_exists(UniqueField::Username, username),
        Some(UniqueViolation {
            field: UniqueField::Email,
        }) => DomainError::already_exists(UniqueField::Email, email),
        None => db_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_never_go_backwards() {
        let future = Utc::now() + Duration::seconds(60);
        assert!(next_timestamp(future) > future);

        let past = Utc::now() - Duration::seconds(60);
        assert!(next_timestamp(past) > past);
    }

    #[test]
    fn unique_violation_names_the_colliding_value() {
        let err = anyhow::Error::new(UniqueViolation {
            field: UniqueField::Email,
        });
        assert_eq!(
            write_error(err, "alice", "alice@example.com"),
            DomainError::already_exists(UniqueField::Email, "alice@example.com")
        );

        let other = anyhow::anyhow!("disk full");
        assert!(matches!(
            write_error(other, "alice", "alice@example.com"),
            DomainError::Database { .. }
        ));
    }
}
