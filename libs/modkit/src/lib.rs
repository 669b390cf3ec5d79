//! # ModKit
//!
//! Small shared toolkit for the server's modules: RFC 9457 problem responses,
//! request id propagation types and process shutdown signals.

pub use anyhow::Result;

pub mod api;
pub mod runtime;

pub use api::problem::{
    bad_request, internal_error, not_found, ErrDef, Problem, ProblemResponse, ValidationError,
};
pub use api::request::XRequestId;
pub use runtime::wait_for_shutdown;
