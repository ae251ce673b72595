use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::role::Role;

/// Set of roles an operation admits.
///
/// An empty set is an explicit "nobody" declaration and is distinct from an
/// operation that declares no roles at all (see [`OperationPolicy`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequiredRoles(HashSet<Role>);

impl RequiredRoles {
    pub fn new<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        Self(roles.into_iter().collect())
    }

    /// The explicit deny-all declaration
    pub fn nobody() -> Self {
        Self(HashSet::new())
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }
}

impl FromIterator<Role> for RequiredRoles {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Per-operation security declaration, attached when the operation is
/// registered and consumed as plain data by the gate and the guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationPolicy {
    /// `None` means the operation carries no role restriction.
    pub required_roles: Option<RequiredRoles>,
    /// Public operations bypass authentication entirely.
    pub is_public: bool,
}

impl OperationPolicy {
    /// Authenticated, no role restriction
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn public() -> Self {
        Self {
            required_roles: None,
            is_public: true,
        }
    }

    pub fn roles<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        Self {
            required_roles: Some(RequiredRoles::new(roles)),
            is_public: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_constructors() {
        let open = OperationPolicy::authenticated();
        assert!(open.required_roles.is_none());
        assert!(!open.is_public);

        let public = OperationPolicy::public();
        assert!(public.is_public);

        let admins = OperationPolicy::roles([Role::Admin, Role::Manager]);
        let required = admins.required_roles.unwrap();
        assert!(required.contains(Role::Manager));
        assert!(!required.contains(Role::User));
    }

    #[test]
    fn test_nobody_is_empty_but_present() {
        let policy = OperationPolicy {
            required_roles: Some(RequiredRoles::nobody()),
            is_public: false,
        };
        assert!(policy.required_roles.as_ref().is_some_and(|r| r.is_empty()));
    }
}
