use async_trait::async_trait;

use crate::contract::{
    error::UsersError,
    model::{NewUser, User, UserPatch},
};

/// Public API of the users module for other in-process modules.
#[async_trait]
pub trait UsersApi: Send + Sync {
    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersError>;

    async fn get_user(&self, id: i64) -> Result<User, UsersError>;

    /// Resolved on the module's worker pool.
    async fn get_user_by_username(&self, username: &str) -> Result<User, UsersError>;

    /// Active users in ascending id order.
    async fn list_active_users(&self) -> Result<Vec<User>, UsersError>;

    /// Case-sensitive substring match on the full name.
    async fn search_users_by_name(&self, fragment: &str) -> Result<Vec<User>, UsersError>;

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, UsersError>;

    /// Soft delete: the user stays readable with `is_active == false`.
    async fn deactivate_user(&self, id: i64) -> Result<(), UsersError>;
}
