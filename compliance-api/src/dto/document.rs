use compliance_core::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use crate::security::{sanitize, validate_file_url, validate_safe_url};

/// Fields of a document submission that are encrypted at rest
pub const SENSITIVE_DOCUMENT_FIELDS: &[&str] = &["policy_number", "insured_tax_id"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitDocumentRequest {
    /// Stored reference to an externally hosted certificate
    #[validate(custom(function = "validate_file_url"))]
    pub document_url: Option<String>,
    /// Fetched by the server when processing completes
    #[validate(custom(function = "validate_safe_url"))]
    pub callback_url: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub policy_number: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub insured_tax_id: Option<String>,
}

impl SubmitDocumentRequest {
    /// Record shape handed to persistence, with free text stripped of markup
    pub fn into_record(self) -> Map<String, Value> {
        let mut record = Map::new();
        record.insert("document_url".to_string(), self.document_url.into());
        record.insert("callback_url".to_string(), self.callback_url.into());
        record.insert("notes".to_string(), sanitize(self.notes.as_deref()).into());
        record.insert("policy_number".to_string(), self.policy_number.into());
        record.insert("insured_tax_id".to_string(), self.insured_tax_id.into());
        record
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentSubmissionResponse {
    pub id: Uuid,
    pub document_url: Option<String>,
    pub callback_url: Option<String>,
    pub notes: Option<String>,
    /// Sensitive fields that were sealed before storage
    pub encrypted_fields: Vec<String>,
    pub submitted_by: Option<UserId>,
}
