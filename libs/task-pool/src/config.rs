use serde::{Deserialize, Serialize};

use crate::error::PoolError;

/// Sizing of a [`TaskPool`](crate::TaskPool).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskPoolConfig {
    /// Workers started with the pool and kept alive until shutdown.
    pub core_workers: usize,
    /// Upper bound on live workers, core plus overflow.
    pub max_workers: usize,
    /// Number of tasks that may wait for a free worker.
    pub queue_capacity: usize,
    /// Prefix for worker names, used in tracing spans.
    pub thread_name_prefix: String,
}

impl Default for TaskPoolConfig {
    fn default() -> Self {
        Self {
            core_workers: 20,
            max_workers: 1000,
            queue_capacity: 500,
            thread_name_prefix: "pool-worker-".to_string(),
        }
    }
}

impl TaskPoolConfig {
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.core_workers == 0 {
            return Err(PoolError::InvalidConfig(
                "core_workers must be at least 1".to_string(),
            ));
        }
        if self.max_workers < self.core_workers {
            return Err(PoolError::InvalidConfig(format!(
                "max_workers ({}) must not be below core_workers ({})",
                self.max_workers, self.core_workers
            )));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = TaskPoolConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.core_workers, 20);
        assert_eq!(cfg.max_workers, 1000);
        assert_eq!(cfg.queue_capacity, 500);
    }

    #[test]
    fn rejects_degenerate_sizes() {
        let zero_core = TaskPoolConfig {
            core_workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_core.validate(),
            Err(PoolError::InvalidConfig(_))
        ));

        let max_below_core = TaskPoolConfig {
            core_workers: 4,
            max_workers: 2,
            ..Default::default()
        };
        assert!(matches!(
            max_below_core.validate(),
            Err(PoolError::InvalidConfig(msg)) if msg.contains("max_workers")
        ));

        let no_queue = TaskPoolConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(no_queue.validate().is_err());
    }

    #[test]
    fn partial_section_falls_back_to_defaults() {
        let cfg: TaskPoolConfig =
            serde_json::from_value(serde_json::json!({ "core_workers": 2 })).unwrap();
        assert_eq!(cfg.core_workers, 2);
        assert_eq!(cfg.queue_capacity, 500);
        assert_eq!(cfg.thread_name_prefix, "pool-worker-");
    }
}
