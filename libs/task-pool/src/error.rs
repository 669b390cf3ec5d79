use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    #[error("No Tokio runtime available to start pool workers")]
    NoRuntime,

    #[error("Task pool saturated (queue capacity {queue_capacity}, max workers {max_workers})")]
    Saturated {
        queue_capacity: usize,
        max_workers: usize,
    },

    #[error("Task pool is shut down")]
    Shutdown,

    #[error("Task was lost before producing a result")]
    TaskLost,
}
