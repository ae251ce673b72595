pub mod auth;
pub mod session;

pub use auth::{enforce_policy, PolicyState};
pub use session::{
    attach_session_principal, session_principal, SESSION_EMAIL_HEADER, SESSION_ROLE_HEADER,
    SESSION_USER_ID_HEADER,
};
