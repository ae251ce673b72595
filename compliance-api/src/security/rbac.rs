use compliance_core::{OperationPolicy, Principal, RequiredRoles, Role};

use super::auth::{AuthError, AuthResult};

/// Stateless role check against an operation's declared roles.
///
/// Membership is the only test; roles have no hierarchy.
pub struct RoleGuard;

impl RoleGuard {
    /// Pure allow/deny decision.
    ///
    /// - no declared roles: allow
    /// - declared but empty: deny everyone
    /// - otherwise: allow iff `role` is declared
    pub fn is_allowed(role: Role, required: Option<&RequiredRoles>) -> bool {
        match required {
            None => true,
            Some(roles) if roles.is_empty() => false,
            Some(roles) => roles.contains(role),
        }
    }

    /// Apply the decision to the (possibly absent) principal of a request
    pub fn authorize(principal: Option<&Principal>, policy: &OperationPolicy) -> AuthResult<()> {
        let Some(required) = policy.required_roles.as_ref() else {
            return Ok(());
        };

        let Some(principal) = principal else {
            tracing::debug!("Role check denied, no principal on request");
            return Err(AuthError::Unauthenticated);
        };

        if Self::is_allowed(principal.role, Some(required)) {
            Ok(())
        } else {
            tracing::debug!(
                role = %principal.role,
                required = ?required.iter().map(Role::as_str).collect::<Vec<_>>(),
                "Role check denied"
            );
            Err(AuthError::Forbidden)
        }
    }
}
