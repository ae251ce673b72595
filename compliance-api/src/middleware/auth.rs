use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use compliance_core::{OperationPolicy, Principal};
use std::sync::Arc;

use crate::error::ApiError;
use crate::security::{bearer_token, AuthGate, GateOutcome, RoleGuard};

/// Middleware state: the shared gate plus the policy of the route it guards
#[derive(Clone)]
pub struct PolicyState {
    pub gate: Arc<AuthGate>,
    pub policy: Arc<OperationPolicy>,
}

impl PolicyState {
    pub fn new(gate: Arc<AuthGate>, policy: OperationPolicy) -> Self {
        Self {
            gate,
            policy: Arc::new(policy),
        }
    }
}

/// Authentication gate followed by the role guard.
///
/// Public routes skip both. A principal verified by the gate is inserted into
/// request extensions; in simple mode the guard reads the principal attached by
/// [`attach_session_principal`](super::session::attach_session_principal).
pub async fn enforce_policy(
    State(state): State<PolicyState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token);

    match state.gate.authenticate(&state.policy, token)? {
        GateOutcome::Public => return Ok(next.run(request).await),
        GateOutcome::Trusted => {}
        GateOutcome::Verified(principal) => {
            request.extensions_mut().insert(principal);
        }
    }

    RoleGuard::authorize(request.extensions().get::<Principal>(), &state.policy)?;

    Ok(next.run(request).await)
}
