//! Security layer of the compliance platform: field encryption, URL and text
//! input hardening, and the authentication/authorization request pipeline.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod security;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use compliance_core::{OperationPolicy, Role};
use std::sync::Arc;

pub use dto::*;
pub use error::{ApiError, ApiResult};
pub use middleware::{
    attach_session_principal, enforce_policy, session_principal, PolicyState,
    SESSION_EMAIL_HEADER, SESSION_ROLE_HEADER, SESSION_USER_ID_HEADER,
};
pub use security::*;

/// Roles allowed to submit compliance documents
pub const DOCUMENT_SUBMITTERS: [Role; 5] = [
    Role::SuperAdmin,
    Role::Admin,
    Role::Manager,
    Role::Contractor,
    Role::Subcontractor,
];

#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
    pub encryption: &'static FieldEncryption,
}

impl AppState {
    pub fn new(gate: AuthGate, encryption: &'static FieldEncryption) -> Self {
        Self {
            gate: Arc::new(gate),
            encryption,
        }
    }

    /// Middleware state guarding a route with `policy`
    pub fn guard(&self, policy: OperationPolicy) -> PolicyState {
        PolicyState::new(self.gate.clone(), policy)
    }
}

/// API routes, each guarded by its own policy.
///
/// In simple mode the session layer supplies the principal the role guard
/// checks; full mode ignores session headers and trusts only verified tokens.
pub fn routes(state: AppState) -> Router {
    let router = Router::new()
        .route(
            "/session",
            get(handlers::session::current).route_layer(from_fn_with_state(
                state.guard(OperationPolicy::authenticated()),
                enforce_policy,
            )),
        )
        .route(
            "/documents",
            post(handlers::documents::submit).route_layer(from_fn_with_state(
                state.guard(OperationPolicy::roles(DOCUMENT_SUBMITTERS)),
                enforce_policy,
            )),
        );

    let router = match state.gate.mode() {
        AuthMode::Simple => router.layer(from_fn(attach_session_principal)),
        AuthMode::Full(_) => router,
    };

    router.with_state(state)
}
