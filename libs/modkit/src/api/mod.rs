//! HTTP-facing building blocks shared by the ingress host and module REST layers.

pub mod problem;
pub mod request;

pub use problem::{ErrDef, Problem, ProblemResponse, ValidationError, APPLICATION_PROBLEM_JSON};
pub use request::{request_id_header, XRequestId};
