//! Prometheus instrumentation of the user service.
//!
//! Mutations are wrapped explicitly with [`UserMetrics::observe`]; the user
//! count gauges are recomputed from the store whenever metrics are rendered.

use std::future::Future;
use std::sync::Arc;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};
use tracing::warn;

use crate::domain::repo::UsersRepository;

/// Instrumented service mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Deactivate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Deactivate => "deactivate",
        }
    }
}

pub struct UserMetrics {
    registry: Registry,
    created: IntCounter,
    updated: IntCounter,
    deleted: IntCounter,
    duration: HistogramVec,
    active: IntGauge,
    total: IntGauge,
    repo: Arc<dyn UsersRepository>,
}

impl UserMetrics {
    /// Collectors live in their own registry so several instances can coexist.
    pub fn new(repo: Arc<dyn UsersRepository>) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let created = IntCounter::new("users_created_total", "Total number of users created")?;
        let updated = IntCounter::new("users_updated_total", "Total number of users updated")?;
        let deleted = IntCounter::new(
            "users_deleted_total",
            "Total number of users deactivated",
        )?;
        let duration = HistogramVec::new(
            HistogramOpts::new(
                "users_operation_duration_seconds",
                "Duration of user service mutations",
            ),
            &["operation"],
        )?;
        let active = IntGauge::with_opts(Opts::new(
            "users_active_count",
            "Number of active users",
        ))?;
        let total = IntGauge::with_opts(Opts::new("users_total_count", "Total number of users"))?;

        registry.register(Box::new(created.clone()))?;
        registry.register(Box::new(updated.clone()))?;
        registry.register(Box::new(deleted.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(active.clone()))?;
        registry.register(Box::new(total.clone()))?;

        Ok(Self {
            registry,
            created,
            updated,
            deleted,
            duration,
            active,
            total,
            repo,
        })
    }

    /// Run `fut`, record its duration whatever the outcome and bump the
    /// operation counter only on success. The result is returned untouched.
    ///
    /// The duration is recorded by a drop guard, so a call that panics or is
    /// dropped before completion is still timed exactly once.
    pub async fn observe<T, E, F>(&self, op: Operation, fut: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let timer = self.duration.with_label_values(&[op.as_str()]).start_timer();
        let result = fut.await;
        timer.observe_duration();
        if result.is_ok() {
            self.counter(op).inc();
        }
        result
    }

    fn counter(&self, op: Operation) -> &IntCounter {
        match op {
            Operation::Create => &self.created,
            Operation::Update => &self.updated,
            Operation::Deactivate => &self.deleted,
        }
    }

    pub fn created_total(&self) -> u64 {
        self.created.get()
    }

    pub fn updated_total(&self) -> u64 {
        self.updated.get()
    }

    pub fn deleted_total(&self) -> u64 {
        self.deleted.get()
    }

    /// Number of recorded durations for `op`.
    pub fn duration_samples(&self, op: Operation) -> u64 {
        self.duration
            .with_label_values(&[op.as_str()])
            .get_sample_count()
    }

    /// Current number of active users; 0 if the store cannot answer.
    pub async fn active_users(&self) -> u64 {
        match self.repo.count_active().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "active user gauge unavailable, reporting 0");
                0
            }
        }
    }

    /// Current number of users; 0 if the store cannot answer.
    pub async fn total_users(&self) -> u64 {
        match self.repo.count().await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "total user gauge unavailable, reporting 0");
                0
            }
        }
    }

    /// Refresh the gauges and encode the registry in the text exposition format.
    pub async fn render(&self) -> Result<String, prometheus::Error> {
        let active = self.active_users().await;
        let total = self.total_users().await;
        self.active.set(i64::try_from(active).unwrap_or(i64::MAX));
        self.total.set(i64::try_from(total).unwrap_or(i64::MAX));

        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}
