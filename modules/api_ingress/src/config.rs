use serde::{Deserialize, Serialize};

/// HTTP host configuration (`modules.api_ingress` in the app config).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// Overrides `server.host:server.port` when set.
    pub bind_addr: Option<String>,
    pub enable_docs: bool,
    pub cors_enabled: bool,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            enable_docs: true,
            cors_enabled: false,
            request_timeout_secs: 30,
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}
