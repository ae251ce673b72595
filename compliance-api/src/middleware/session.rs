use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};
use compliance_core::{Principal, Role, UserId};
use uuid::Uuid;

/// Identity headers set by the login front in simple mode
pub const SESSION_USER_ID_HEADER: HeaderName = HeaderName::from_static("x-session-user-id");
pub const SESSION_EMAIL_HEADER: HeaderName = HeaderName::from_static("x-session-email");
pub const SESSION_ROLE_HEADER: HeaderName = HeaderName::from_static("x-session-role");

/// Read the session identity forwarded by the login front.
///
/// All three headers must be present and well-formed; anything else yields
/// no principal.
pub fn session_principal(headers: &HeaderMap) -> Option<Principal> {
    let value = |name: &HeaderName| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let user_id = value(&SESSION_USER_ID_HEADER)?;
    let email = value(&SESSION_EMAIL_HEADER)?;
    let role = value(&SESSION_ROLE_HEADER)?;

    let user_id = match Uuid::parse_str(user_id) {
        Ok(id) => UserId::from(id),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring session identity with malformed user id");
            return None;
        }
    };

    let role = match role.parse::<Role>() {
        Ok(role) => role,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring session identity with unknown role");
            return None;
        }
    };

    Some(Principal::new(user_id, email, role))
}

/// Simple-mode session layer: attaches the forwarded identity as the request
/// principal. Only mounted in simple mode, where the gate trusts the session.
pub async fn attach_session_principal(mut request: Request, next: Next) -> Response {
    if let Some(principal) = session_principal(request.headers()) {
        request.extensions_mut().insert(principal);
    }

    next.run(request).await
}
