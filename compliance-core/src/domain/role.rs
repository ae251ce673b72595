use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Roles attached to an authenticated principal.
///
/// Roles carry no ordering. A principal passes a role check only when its
/// role is a member of the operation's declared set, so `SuperAdmin` does not
/// implicitly satisfy an `Admin` requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    Contractor,
    Subcontractor,
    Broker,
    User,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Manager,
        Role::Contractor,
        Role::Subcontractor,
        Role::Broker,
        Role::User,
    ];

    /// Wire name shared with the token claims and the persisted user record
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::Contractor => "CONTRACTOR",
            Role::Subcontractor => "SUBCONTRACTOR",
            Role::Broker => "BROKER",
            Role::User => "USER",
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "ADMIN" => Ok(Role::Admin),
            "MANAGER" => Ok(Role::Manager),
            "CONTRACTOR" => Ok(Role::Contractor),
            "SUBCONTRACTOR" => Ok(Role::Subcontractor),
            "BROKER" => Ok(Role::Broker),
            "USER" => Ok(Role::User),
            _ => Err(CoreError::UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
