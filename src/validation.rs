//! Field validators run whenever a user, assignment or group is constructed.
//!
//! The email check is a loose syntactic shape test, not RFC 5322 validation.

use super::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

pub const MEMBER_NAME_MAX_LEN: usize = 100;
pub const GROUP_NAME_MAX_LEN: usize = 128;
pub const EMAIL_MAX_LEN: usize = 128;

// anchored at the start only, trailing text after a match is accepted
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@]+@[^@]+\.[^@]+").expect("email pattern is valid"));

fn validate_name(name: &str, limit: usize) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > limit {
        return Err(ValidationError::NameTooLong { limit });
    }
    Ok(())
}

/// Name of a single group member.
pub fn validate_member_name(name: &str) -> Result<(), ValidationError> {
    validate_name(name, MEMBER_NAME_MAX_LEN)
}

/// Name of the group itself.
pub fn validate_group_name(name: &str) -> Result<(), ValidationError> {
    validate_name(name, GROUP_NAME_MAX_LEN)
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmptyEmail);
    }
    if email.chars().count() > EMAIL_MAX_LEN {
        return Err(ValidationError::EmailTooLong);
    }
    if !EMAIL_SHAPE.is_match(email) {
        return Err(ValidationError::MalformedEmail(email.to_string()));
    }
    Ok(())
}

/// Fails on the first name that repeats an earlier one, ignoring case.
pub fn ensure_unique_names<'a>(
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.to_lowercase()) {
            return Err(ValidationError::DuplicateName(name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_ceilings_differ_by_call_site() {
        let name = "x".repeat(101);
        assert_eq!(
            validate_member_name(&name),
            Err(ValidationError::NameTooLong { limit: 100 })
        );
        assert!(validate_group_name(&name).is_ok());
        assert!(validate_group_name(&"x".repeat(129)).is_err());
    }

    #[test]
    fn name_length_counts_characters() {
        // 100 two-byte characters
        assert!(validate_member_name(&"é".repeat(100)).is_ok());
    }

    #[test]
    fn email_shape_is_loose() {
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email("first last@host.example").is_ok());
        assert!(validate_email("a@b.c@d").is_ok());
        assert_eq!(
            validate_email("a@b"),
            Err(ValidationError::MalformedEmail("a@b".into()))
        );
        assert!(validate_email("@b.c").is_err());
        assert!(validate_email("a@.c").is_err());
        assert!(validate_email("a@b.").is_err());
    }

    #[test]
    fn email_empty_and_long() {
        assert_eq!(validate_email(""), Err(ValidationError::EmptyEmail));
        let long = format!("{}@example.com", "a".repeat(120));
        assert_eq!(validate_email(&long), Err(ValidationError::EmailTooLong));
    }

    #[test]
    fn duplicate_names_ignore_case() {
        assert!(ensure_unique_names(["Ann", "Bob"]).is_ok());
        assert_eq!(
            ensure_unique_names(["Ann", "Bob", "ANN"]),
            Err(ValidationError::DuplicateName("ANN".into()))
        );
    }
}
