use axum::{extract::State, http::StatusCode, Extension, Json};
use compliance_core::Principal;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{dto::*, error::ApiResult, AppState};

pub async fn submit(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
    Json(payload): Json<SubmitDocumentRequest>,
) -> ApiResult<(StatusCode, Json<DocumentSubmissionResponse>)> {
    payload.validate()?;

    let record = payload.into_record();
    let (sealed, encrypted_fields) = state
        .encryption
        .seal_fields(&record, SENSITIVE_DOCUMENT_FIELDS);

    let text = |field: &str| sealed.get(field).and_then(Value::as_str).map(str::to_string);

    let response = DocumentSubmissionResponse {
        id: Uuid::new_v4(),
        document_url: text("document_url"),
        callback_url: text("callback_url"),
        notes: text("notes"),
        encrypted_fields,
        submitted_by: principal.map(|Extension(p)| p.user_id),
    };

    tracing::info!(
        document_id = %response.id,
        encrypted = response.encrypted_fields.len(),
        "Document submission accepted"
    );

    Ok((StatusCode::CREATED, Json(response)))
}
