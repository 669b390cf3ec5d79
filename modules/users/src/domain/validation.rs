use once_cell::sync::Lazy;
use regex::Regex;

use crate::contract::model::{NewUser, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::service::ServiceConfig;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn validate_new_user(new_user: &NewUser, cfg: &ServiceConfig) -> Result<(), DomainError> {
    validate_username(&new_user.username, cfg)?;
    validate_email(&new_user.email)?;
    validate_full_name(&new_user.full_name, cfg)
}

/// Only supplied fields are checked.
pub fn validate_patch(patch: &UserPatch, cfg: &ServiceConfig) -> Result<(), DomainError> {
    if let Some(username) = &patch.username {
        validate_username(username, cfg)?;
    }
    if let Some(email) = &patch.email {
        validate_email(email)?;
    }
    if let Some(full_name) = &patch.full_name {
        validate_full_name(full_name, cfg)?;
    }
    Ok(())
}

fn validate_username(username: &str, cfg: &ServiceConfig) -> Result<(), DomainError> {
    let len = username.chars().count();
    if len < cfg.min_username_len || len > cfg.max_username_len {
        return Err(DomainError::validation(
            "username",
            format!(
                "must be between {} and {} characters",
                cfg.min_username_len, cfg.max_username_len
            ),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DomainError::validation(
            "username",
            "may only contain letters, digits and underscores",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    if !EMAIL_RE.is_match(email) {
        return Err(DomainError::validation(
            "email",
            format!("'{email}' is not a valid email address"),
        ));
    }
    Ok(())
}

fn validate_full_name(full_name: &str, cfg: &ServiceConfig) -> Result<(), DomainError> {
    if full_name.trim().is_empty() {
        return Err(DomainError::validation("fullName", "must not be blank"));
    }
    let len = full_name.chars().count();
    if len > cfg.max_full_name_len {
        return Err(DomainError::validation(
            "fullName",
            format!(
                "is {len} characters long (max: {})",
                cfg.max_full_name_len
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str, full_name: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            full_name: full_name.into(),
        }
    }

    fn failing_field(res: Result<(), DomainError>) -> String {
        match res {
            Err(DomainError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_well_formed_user() {
        let cfg = ServiceConfig::default();
        assert!(validate_new_user(&new_user("test_user1", "t@example.com", "Test"), &cfg).is_ok());
    }

    #[test]
    fn username_length_and_charset() {
        let cfg = ServiceConfig::default();
        let ok_mail = "t@example.com";
        assert_eq!(
            failing_field(validate_new_user(&new_user("ab", ok_mail, "T"), &cfg)),
            "username"
        );
        let long = "a".repeat(51);
        assert_eq!(
            failing_field(validate_new_user(&new_user(&long, ok_mail, "T"), &cfg)),
            "username"
        );
        assert_eq!(
            failing_field(validate_new_user(&new_user("bad-name", ok_mail, "T"), &cfg)),
            "username"
        );
        assert!(validate_new_user(&new_user(&"a".repeat(50), ok_mail, "T"), &cfg).is_ok());
    }

    #[test]
    fn email_format() {
        let cfg = ServiceConfig::default();
        for bad in ["plain", "a@b", "a b@c.io", "@c.io", "a@.io "] {
            assert_eq!(
                failing_field(validate_new_user(&new_user("user", bad, "T"), &cfg)),
                "email",
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn full_name_blank_or_too_long() {
        let cfg = ServiceConfig::default();
        assert_eq!(
            failing_field(validate_new_user(&new_user("user", "u@x.io", "   "), &cfg)),
            "fullName"
        );
        let long = "n".repeat(101);
        assert_eq!(
            failing_field(validate_new_user(&new_user("user", "u@x.io", &long), &cfg)),
            "fullName"
        );
    }

    #[test]
    fn patch_checks_only_supplied_fields() {
        let cfg = ServiceConfig::default();
        assert!(validate_patch(&UserPatch::default(), &cfg).is_ok());

        let patch = UserPatch {
            email: Some("nope".into()),
            ..Default::default()
        };
        assert_eq!(failing_field(validate_patch(&patch, &cfg)), "email");
    }
}
