//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validates a platform identifier (session, player): 1-64 visible
/// characters, no whitespace or control characters.
pub fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.len() > MAX_IDENTIFIER_LENGTH {
        let mut err = ValidationError::new("identifier_length");
        err.message = Some(
            format!(
                "identifier must be 1-{} characters (got {})",
                MAX_IDENTIFIER_LENGTH,
                value.len()
            )
            .into(),
        );
        return Err(err);
    }

    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        let mut err = ValidationError::new("identifier_format");
        err.message = Some("identifier must not contain whitespace or control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a display name: non-blank, at most 64 characters.
pub fn validate_display_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("display name must not be blank".into());
        return Err(err);
    }

    if value.len() > MAX_IDENTIFIER_LENGTH {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("display name must be at most {MAX_IDENTIFIER_LENGTH} characters").into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_identifiers_pass() {
        assert!(validate_identifier("t3_abc123").is_ok());
        assert!(validate_identifier("alice").is_ok());
        assert!(validate_identifier(&"x".repeat(64)).is_ok());
    }

    #[test]
    fn invalid_identifiers_fail() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier(&"x".repeat(65)).is_err());
        assert!(validate_identifier("has space").is_err());
        assert!(validate_identifier("tab\there").is_err());
    }

    #[test]
    fn display_names_must_not_be_blank() {
        assert!(validate_display_name("Alice").is_ok());
        assert!(validate_display_name("  ").is_err());
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name(&"x".repeat(65)).is_err());
    }
}
