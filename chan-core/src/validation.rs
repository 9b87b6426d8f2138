use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Validation helpers shared by registration and sign-in.
///
/// The login guard itself never validates identifiers; these are applied at
/// the edges, before an identifier is used as a lockout key.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

/// Canonical form of a sign-in identifier: trimmed and lowercased, so that
/// `Ana@Chan.mx ` and `ana@chan.mx` share one attempt counter.
///
/// # Examples
///
/// ```rust
/// use chan_core::validation::normalize_identifier;
///
/// assert_eq!(normalize_identifier("  Ana@Chan.MX "), "ana@chan.mx");
/// ```
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Validates an email address
///
/// # Examples
///
/// ```rust
/// use chan_core::validation::validate_email;
///
/// assert!(validate_email("operador@chan.mx").is_ok());
/// assert!(validate_email("invalid-email").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField(
            "Email is required".to_string(),
        ));
    }

    if email.len() > 254 {
        return Err(ValidationError::InvalidEmail(
            "Email is too long".to_string(),
        ));
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(format!(
            "Invalid email format: {email}"
        )))
    }
}

/// Validates a password for new accounts
///
/// # Password Requirements
///
/// - Minimum 8 characters
/// - Maximum 128 characters
/// - Cannot be empty or whitespace only
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    if password.trim().is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password cannot be only whitespace".to_string(),
        ));
    }

    if password.len() < 8 {
        return Err(ValidationError::InvalidPassword(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(ValidationError::InvalidPassword(
            "Password must be no more than 128 characters long".to_string(),
        ));
    }

    Ok(())
}

/// Validates an optional name field (first or last name)
pub fn validate_name(field: &str, name: Option<&str>) -> Result<(), ValidationError> {
    if let Some(name) = name {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidField(format!(
                "{field} cannot be empty or whitespace only"
            )));
        }

        if name.len() > 100 {
            return Err(ValidationError::InvalidField(format!(
                "{field} must be no more than 100 characters long"
            )));
        }
    }

    Ok(())
}
