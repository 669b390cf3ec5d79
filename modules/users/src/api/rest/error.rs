use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use modkit::api::problem::{ErrDef, ProblemResponse, ValidationError};
use modkit::XRequestId;

use crate::contract::model::UniqueField;
use crate::domain::error::DomainError;

pub const USERS_NOT_FOUND: ErrDef =
    ErrDef::new(StatusCode::NOT_FOUND, "User not found", "USERS_NOT_FOUND");
pub const USERS_USERNAME_CONFLICT: ErrDef = ErrDef::new(
    StatusCode::CONFLICT,
    "Username already exists",
    "USERS_USERNAME_CONFLICT",
);
pub const USERS_EMAIL_CONFLICT: ErrDef = ErrDef::new(
    StatusCode::CONFLICT,
    "Email already exists",
    "USERS_EMAIL_CONFLICT",
);
pub const USERS_VALIDATION: ErrDef =
    ErrDef::new(StatusCode::BAD_REQUEST, "Validation error", "USERS_VALIDATION");
pub const USERS_UNAVAILABLE: ErrDef = ErrDef::new(
    StatusCode::SERVICE_UNAVAILABLE,
    "Service unavailable",
    "USERS_UNAVAILABLE",
);
pub const INTERNAL_DB: ErrDef = ErrDef::new(
    StatusCode::INTERNAL_SERVER_ERROR,
    "Internal error",
    "INTERNAL_DB",
);

/// Map domain error to RFC 9457 ProblemResponse
pub fn map_domain_error(
    e: &DomainError,
    instance: &str,
    request_id: Option<XRequestId>,
) -> ProblemResponse {
    let problem = match e {
        DomainError::NotFound { .. } => USERS_NOT_FOUND.to_problem(e.to_string()),
        DomainError::AlreadyExists { field, .. } => {
            let def = match field {
                UniqueField::Username => USERS_USERNAME_CONFLICT,
                UniqueField::Email => USERS_EMAIL_CONFLICT,
            };
            def.to_problem(e.to_string())
        }
        DomainError::Validation { field, message } => USERS_VALIDATION
            .to_problem(e.to_string())
            .with_errors(vec![ValidationError {
                detail: message.clone(),
                pointer: format!("/{field}"),
            }]),
        DomainError::Unavailable { .. } => {
            tracing::warn!(error = %e, "request rejected by worker pool");
            USERS_UNAVAILABLE.to_problem("The service is temporarily overloaded, retry later")
        }
        DomainError::Database { .. } => {
            // Details are logged, never returned.
            tracing::error!(error = ?e, "Database error occurred");
            INTERNAL_DB.to_problem("An internal database error occurred")
        }
    };

    let problem = problem.with_instance(instance);
    let problem = match request_id {
        Some(rid) => problem.with_request_id(rid.0),
        None => problem,
    };
    ProblemResponse(problem)
}

/// Unreadable request bodies are reported like any other validation failure.
pub fn map_json_rejection(
    rejection: &JsonRejection,
    instance: &str,
    request_id: Option<XRequestId>,
) -> ProblemResponse {
    tracing::debug!(status = %rejection.status(), "rejected request body");
    let problem = USERS_VALIDATION
        .to_problem(rejection.body_text())
        .with_instance(instance);
    let problem = match request_id {
        Some(rid) => problem.with_request_id(rid.0),
        None => problem,
    };
    ProblemResponse(problem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_keep_the_field_in_the_code() {
        let p = map_domain_error(
            &DomainError::already_exists(UniqueField::Email, "a@b.io"),
            "/users",
            None,
        )
        .0;
        assert_eq!(p.status, 409);
        assert_eq!(p.code, "USERS_EMAIL_CONFLICT");

        let p = map_domain_error(
            &DomainError::already_exists(UniqueField::Username, "bob"),
            "/users",
            None,
        )
        .0;
        assert_eq!(p.code, "USERS_USERNAME_CONFLICT");
    }

    #[test]
    fn not_found_detail_contains_id_and_request_id_is_attached() {
        let p = map_domain_error(
            &DomainError::not_found(999),
            "/users/999",
            Some(XRequestId("rid-1".into())),
        )
        .0;
        assert_eq!(p.status, 404);
        assert!(p.detail.contains("999"));
        assert_eq!(p.instance, "/users/999");
        assert_eq!(p.request_id.as_deref(), Some("rid-1"));
    }

    #[test]
    fn database_details_are_redacted() {
        let p = map_domain_error(
            &DomainError::database("no such table: users"),
            "/users",
            None,
        )
        .0;
        assert_eq!(p.status, 500);
        assert!(!p.detail.contains("users"));
    }

    #[test]
    fn validation_points_at_the_field() {
        let p = map_domain_error(
            &DomainError::validation("fullName", "must not be blank"),
            "/users",
            None,
        )
        .0;
        assert_eq!(p.status, 400);
        assert_eq!(p.errors.unwrap()[0].pointer, "/fullName");
    }
}
