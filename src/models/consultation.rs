// src/models/consultation.rs - Pure data structures
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::validations::{
    validate_company, validate_email, validate_full_name, validate_message, validate_phone,
};

/// Where a consultation request sits in the follow-up workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    #[default]
    New,
    Contacted,
    Closed,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::New => "new",
            ConsultationStatus::Contacted => "contacted",
            ConsultationStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsultationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(ConsultationStatus::New),
            "contacted" => Ok(ConsultationStatus::Contacted),
            "closed" => Ok(ConsultationStatus::Closed),
            other => Err(format!(
                "Invalid status: {}. Must be one of: new, contacted, closed",
                other
            )),
        }
    }
}

impl TryFrom<String> for ConsultationStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// DTO for the public consultation form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NewConsultationRequest {
    #[validate(custom(function = "validate_full_name"))]
    pub full_name: String,

    #[validate(custom(function = "validate_company"))]
    pub company: String,

    #[validate(custom(function = "validate_email"))]
    pub email: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[validate(custom(function = "validate_message"))]
    pub message: String,
}

impl NewConsultationRequest {
    /// Strips surrounding whitespace from every field
    pub fn trimmed(self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            company: self.company.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

/// Values written to storage for an accepted submission
#[derive(Debug, Clone, PartialEq)]
pub struct NewConsultationRecord {
    pub full_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub status: ConsultationStatus,
    pub client_ip_hash: Option<String>,
}

/// A stored consultation request
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationRequest {
    pub id: Uuid,
    pub full_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub message: String,

    #[sqlx(try_from = "String")]
    pub status: ConsultationStatus,

    /// Salted hash of the submitting address, never the address itself
    #[serde(skip_serializing)]
    pub client_ip_hash: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Filters for the admin listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsultationQueryParams {
    pub status: Option<ConsultationStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationStatusUpdate {
    pub status: ConsultationStatus,
}

/// Body returned by the public submission endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsultationStats {
    pub total: i64,
    pub new: i64,
    pub contacted: i64,
    pub closed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!("Contacted".parse(), Ok(ConsultationStatus::Contacted));
        assert_eq!(ConsultationStatus::try_from("closed".to_string()), Ok(ConsultationStatus::Closed));
        assert!("archived".parse::<ConsultationStatus>().is_err());
        assert_eq!(ConsultationStatus::default().to_string(), "new");
    }

    #[test]
    fn test_request_uses_form_field_names() {
        let dto: NewConsultationRequest = serde_json::from_value(serde_json::json!({
            "fullName": "Jane Doe",
            "company": "Acme",
            "email": "jane@acme.io",
            "phone": "5551234567",
            "message": "Looking for an assessment"
        }))
        .unwrap();
        assert_eq!(dto.full_name, "Jane Doe");
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_fail_validation() {
        let dto: NewConsultationRequest =
            serde_json::from_value(serde_json::json!({ "email": "jane@acme.io" })).unwrap();
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("message"));
        assert!(!fields.contains_key("email"));
    }

    #[test]
    fn test_stored_request_hides_ip_hash() {
        let request = ConsultationRequest {
            id: Uuid::new_v4(),
            full_name: "Jane Doe".into(),
            company: "Acme".into(),
            email: "jane@acme.io".into(),
            phone: "5551234567".into(),
            message: "Looking for an assessment".into(),
            status: ConsultationStatus::New,
            client_ip_hash: Some("abc123".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["status"], "new");
        assert_eq!(json["fullName"], "Jane Doe");
        assert!(json.get("clientIpHash").is_none());
    }
}
