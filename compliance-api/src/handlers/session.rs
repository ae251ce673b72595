use axum::{Extension, Json};
use compliance_core::Principal;
use serde_json::{json, Value};

/// Report who the pipeline let through
pub async fn current(principal: Option<Extension<Principal>>) -> Json<Value> {
    match principal {
        Some(Extension(principal)) => Json(json!({
            "authenticated": true,
            "user_id": principal.user_id,
            "email": principal.email,
            "role": principal.role,
        })),
        None => Json(json!({ "authenticated": false })),
    }
}
