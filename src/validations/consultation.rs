use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::NewConsultationRequest;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d\s\-\+\(\)]{10,}$").expect("valid phone regex"));

const MIN_NAME_LEN: usize = 2;
const MIN_MESSAGE_LEN: usize = 10;

/// A single failed form field, keyed by the field name the form uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn error_with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

// Counts Unicode scalar values; a UTF-16 count would differ only for characters outside the BMP
fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}

/// Validates the `local@domain.tld` shape without whitespace
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(error_with_message(
            "email",
            "Please enter a valid email address",
        ))
    }
}

/// Validates a phone number: at least 10 digits/punctuation once whitespace is removed
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    if PHONE_RE.is_match(&compact) {
        Ok(())
    } else {
        Err(error_with_message("phone", "Please enter a valid phone number"))
    }
}

pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    if trimmed_len(name) >= MIN_NAME_LEN {
        Ok(())
    } else {
        Err(error_with_message(
            "full_name",
            "Please enter a valid full name",
        ))
    }
}

pub fn validate_company(company: &str) -> Result<(), ValidationError> {
    if trimmed_len(company) >= MIN_NAME_LEN {
        Ok(())
    } else {
        Err(error_with_message(
            "company",
            "Please enter a valid company name",
        ))
    }
}

pub fn validate_message(message: &str) -> Result<(), ValidationError> {
    if trimmed_len(message) >= MIN_MESSAGE_LEN {
        Ok(())
    } else {
        Err(error_with_message(
            "message",
            "Please provide at least 10 characters in your message",
        ))
    }
}

/// Struct field names paired with the names the form uses, in form order
const FORM_FIELDS: [(&str, &str); 5] = [
    ("full_name", "fullName"),
    ("company", "company"),
    ("email", "email"),
    ("phone", "phone"),
    ("message", "message"),
];

/// Runs every field check and reports failures in form order.
///
/// An empty result means the submission is acceptable.
pub fn validate_consultation_form(data: &NewConsultationRequest) -> Vec<FieldError> {
    let errors = match data.validate() {
        Ok(()) => return Vec::new(),
        Err(errors) => errors,
    };
    let by_field = errors.field_errors();

    FORM_FIELDS
        .iter()
        .filter_map(|(key, form_name)| {
            let first = by_field.get(*key)?.first()?;
            let message = first
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "invalid".to_string());
            Some(FieldError::new(*form_name, message))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> NewConsultationRequest {
        NewConsultationRequest {
            full_name: "Jane Doe".into(),
            company: "Acme Corp".into(),
            email: "jane@acme.io".into(),
            phone: "+1 (555) 123-4567".into(),
            message: "We need a penetration test next quarter.".into(),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jane@acme.io").is_ok());
        assert!(validate_email("a.b+c@sub.example.co.uk").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("jane@acme").is_err());
        assert!(validate_email("jane doe@acme.io").is_err());
        assert!(validate_email("@acme.io").is_err());
        assert!(validate_email("jane@@acme.io").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("5551234567").is_ok());
        assert!(validate_phone("+1 (555) 123-4567").is_ok());
        // Whitespace does not count toward the minimum length
        assert!(validate_phone("555 123 45 6").is_err());

        assert!(validate_phone("").is_err());
        assert!(validate_phone("555-CALL-NOW").is_err());
        assert!(validate_phone("123456789").is_err());
    }

    #[test]
    fn test_validate_lengths_use_trimmed_input() {
        assert!(validate_full_name("Jo").is_ok());
        assert!(validate_full_name("  J  ").is_err());
        assert!(validate_company("  ").is_err());
        assert!(validate_message("too short").is_err());
        assert!(validate_message("   exactly10   ").is_err());
        assert!(validate_message("exactly 10").is_ok());
        // One astral-plane character is one character, not two
        assert!(validate_full_name("\u{1D49C}").is_err());
        assert!(validate_full_name("\u{1D49C}\u{1D49C}").is_ok());
    }

    #[test]
    fn test_valid_form_has_no_errors() {
        assert!(validate_consultation_form(&valid_request()).is_empty());
    }

    #[test]
    fn test_form_errors_are_in_form_order() {
        let data = NewConsultationRequest {
            full_name: "".into(),
            company: "A".into(),
            email: "not-an-email".into(),
            phone: "12".into(),
            message: "hi".into(),
        };

        let errors = validate_consultation_form(&data);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["fullName", "company", "email", "phone", "message"]);
        assert_eq!(
            errors[4].message,
            "Please provide at least 10 characters in your message"
        );
    }

    #[test]
    fn test_single_bad_field() {
        let data = NewConsultationRequest {
            email: "jane@acme".into(),
            ..valid_request()
        };
        assert_eq!(
            validate_consultation_form(&data),
            vec![FieldError::new("email", "Please enter a valid email address")]
        );
    }
}
