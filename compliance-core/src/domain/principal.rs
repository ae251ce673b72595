use serde::{Deserialize, Serialize};

use super::ids::UserId;
use super::role::Role;

/// An already-authenticated caller, as attached to the request by the
/// authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, email: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            email: email.into(),
            role,
        }
    }
}
