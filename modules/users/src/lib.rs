// === PUBLIC CONTRACT ===
// Stable surface for in-process consumers.
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::UsersModule;

// === INTERNAL MODULES ===
// Exposed for tests and the server binary; other modules should go through `contract`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
#[doc(hidden)]
pub mod metrics;
