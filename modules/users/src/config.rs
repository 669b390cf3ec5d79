use serde::{Deserialize, Serialize};
use task_pool::TaskPoolConfig;

/// Configuration of the users module (`modules.users` in the app config).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct UsersConfig {
    pub validation: ValidationConfig,
    pub cache: CacheConfig,
    /// Worker pool running the asynchronous lookups.
    pub executor: TaskPoolConfig,
    pub openapi: OpenApiConfig,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            validation: ValidationConfig::default(),
            cache: CacheConfig::default(),
            executor: TaskPoolConfig {
                thread_name_prefix: "users-async-".to_string(),
                ..TaskPoolConfig::default()
            },
            openapi: OpenApiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    pub min_username_len: usize,
    pub max_username_len: usize,
    pub max_full_name_len: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_username_len: 3,
            max_username_len: 50,
            max_full_name_len: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    /// New ids are not admitted once this many users are cached.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OpenApiConfig {
    /// Path prefix appended to every advertised server URL.
    pub context_path: String,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            context_path: "/".to_string(),
        }
    }
}
