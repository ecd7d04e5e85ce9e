// src/models/validation.rs

use std::borrow::Cow;

use validator::{ValidateEmail, ValidationError};

pub const PRIORITIES: &[&str] = &["High", "Medium", "Low"];

// E-mail opcional: vazio é aceito, preenchido precisa ser válido
pub fn validate_blank_or_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        return Ok(());
    }
    Err(ValidationError::new("email").with_message(Cow::Borrowed("Enter a valid email address.")))
}

pub fn validate_priority(value: &str) -> Result<(), ValidationError> {
    if PRIORITIES.contains(&value) {
        return Ok(());
    }
    Err(ValidationError::new("priority")
        .with_message(Cow::Owned(format!("\"{value}\" is not a valid choice."))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_email_is_allowed() {
        assert!(validate_blank_or_email("").is_ok());
        assert!(validate_blank_or_email("ana@acme.com").is_ok());
        assert!(validate_blank_or_email("not-an-email").is_err());
    }

    #[test]
    fn priority_must_be_known() {
        assert!(validate_priority("High").is_ok());
        assert!(validate_priority("Urgent").is_err());
        assert!(validate_priority("high").is_err());
    }
}
