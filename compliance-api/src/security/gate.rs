//! Request-level authentication gate.
//!
//! The gate runs before the role guard and answers one question: must this
//! call carry a verified identity, and does it? The operating mode is chosen
//! once at startup. In simple mode no verifier is constructed at all, so a
//! deployment without a credential store starts cleanly.

use compliance_core::{OperationPolicy, Principal};

use super::auth::{AuthConfig, AuthError, AuthModeKind, AuthResult, JwtService};

/// Authentication strategy selected at boot
#[derive(Clone)]
pub enum AuthMode {
    /// Identity established at login is trusted for the session
    Simple,
    /// Every non-public request must present a valid access token
    Full(JwtService),
}

impl AuthMode {
    pub fn kind(&self) -> AuthModeKind {
        match self {
            AuthMode::Simple => AuthModeKind::Simple,
            AuthMode::Full(_) => AuthModeKind::Full,
        }
    }
}

/// Result of a successful pass through the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Operation is public; nothing was checked
    Public,
    /// Simple mode; caller is trusted without verification
    Trusted,
    /// Full mode; the token verified as this principal
    Verified(Principal),
}

#[derive(Clone)]
pub struct AuthGate {
    mode: AuthMode,
}

impl AuthGate {
    pub fn new(mode: AuthMode) -> Self {
        Self { mode }
    }

    /// Build the gate from configuration.
    ///
    /// Full mode without a signing secret is a startup error rather than a
    /// per-request rejection: a misconfigured verifier should stop the boot,
    /// not turn every caller away as unauthenticated.
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        match config.mode {
            AuthModeKind::Simple => {
                tracing::info!("Authentication gate in simple mode, token verification disabled");
                Ok(Self::new(AuthMode::Simple))
            }
            AuthModeKind::Full => {
                let jwt = JwtService::new(config.jwt_config()?);
                tracing::info!("Authentication gate in full mode");
                Ok(Self::new(AuthMode::Full(jwt)))
            }
        }
    }

    pub fn mode(&self) -> &AuthMode {
        &self.mode
    }

    /// Decide whether a call to an operation declared by `policy` may proceed
    pub fn authenticate(
        &self,
        policy: &OperationPolicy,
        bearer_token: Option<&str>,
    ) -> AuthResult<GateOutcome> {
        if policy.is_public {
            return Ok(GateOutcome::Public);
        }

        match &self.mode {
            AuthMode::Simple => Ok(GateOutcome::Trusted),
            AuthMode::Full(jwt) => {
                let token = bearer_token.ok_or_else(|| {
                    tracing::debug!("Rejected request without bearer token");
                    AuthError::MissingToken
                })?;

                let claims = jwt.validate_access_token(token).inspect_err(|e| {
                    tracing::debug!(error = %e, "Rejected request with invalid token");
                })?;

                Ok(GateOutcome::Verified(claims.principal()))
            }
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_core::{Role, UserId};

    fn full_config() -> AuthConfig {
        AuthConfig {
            mode: AuthModeKind::Full,
            jwt_secret: Some("gate-test-secret".to_string()),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_full_mode_requires_secret() {
        let config = AuthConfig {
            mode: AuthModeKind::Full,
            jwt_secret: None,
            ..AuthConfig::default()
        };
        assert!(matches!(
            AuthGate::from_config(&config),
            Err(AuthError::MissingConfig(_))
        ));
    }

    #[test]
    fn test_simple_mode_needs_no_secret() {
        let config = AuthConfig {
            mode: AuthModeKind::Simple,
            jwt_secret: None,
            ..AuthConfig::default()
        };
        let gate = AuthGate::from_config(&config).unwrap();
        assert_eq!(gate.mode().kind(), AuthModeKind::Simple);
        assert_eq!(
            gate.authenticate(&OperationPolicy::authenticated(), None).unwrap(),
            GateOutcome::Trusted
        );
    }

    #[test]
    fn test_public_bypasses_full_mode() {
        let gate = AuthGate::from_config(&full_config()).unwrap();
        assert_eq!(
            gate.authenticate(&OperationPolicy::public(), None).unwrap(),
            GateOutcome::Public
        );
        assert_eq!(
            gate.authenticate(&OperationPolicy::public(), Some("garbage")).unwrap(),
            GateOutcome::Public
        );
    }

    #[test]
    fn test_full_mode_verifies_token() {
        let gate = AuthGate::from_config(&full_config()).unwrap();
        let AuthMode::Full(jwt) = gate.mode() else {
            panic!("expected full mode");
        };

        let principal = Principal::new(UserId::new(), "manager@example.com", Role::Manager);
        let tokens = jwt.generate_token_pair(&principal).unwrap();

        let outcome = gate
            .authenticate(&OperationPolicy::authenticated(), Some(&tokens.access_token))
            .unwrap();
        assert_eq!(outcome, GateOutcome::Verified(principal));

        assert!(matches!(
            gate.authenticate(&OperationPolicy::authenticated(), None),
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            gate.authenticate(&OperationPolicy::authenticated(), Some("not.a.token")),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
    }
}
