use sea_orm::{ActiveValue::NotSet, Set};

use crate::contract::model::User;
use crate::domain::repo::NewUserRecord;
use crate::infra::storage::entity::{ActiveModel, Model};

impl From<Model> for User {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            full_name: m.full_name,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Insert form: the id is left to the store.
impl From<NewUserRecord> for ActiveModel {
    fn from(r: NewUserRecord) -> Self {
        Self {
            id: NotSet,
            username: Set(r.username),
            email: Set(r.email),
            full_name: Set(r.full_name),
            is_active: Set(r.is_active),
            created_at: Set(r.created_at),
            updated_at: Set(r.updated_at),
        }
    }
}

/// Full overwrite keyed by `id`; `created_at` is never rewritten.
pub fn update_model(u: User) -> ActiveModel {
    ActiveModel {
        id: Set(u.id),
        username: Set(u.username),
        email: Set(u.email),
        full_name: Set(u.full_name),
        is_active: Set(u.is_active),
        created_at: NotSet,
        updated_at: Set(u.updated_at),
    }
}
