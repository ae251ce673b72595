use chrono::{Duration, Utc};
use compliance_core::{Principal, Role, UserId};
use jsonwebtoken::{
    decode, encode, errors::Error as JwtError, errors::ErrorKind, Algorithm, DecodingKey,
    EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("JWT encoding error: {0}")]
    JwtEncode(#[from] JwtError),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid token type: expected {expected}, got {actual}")]
    InvalidTokenType { expected: String, actual: String },

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token claims")]
    InvalidClaims,

    #[error("Missing bearer token")]
    MissingToken,

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("No authenticated principal")]
    Unauthenticated,

    #[error("Role not permitted for this operation")]
    Forbidden,
}

pub type AuthResult<T> = Result<T, AuthError>;

// ============================================================================
// Token Types
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Which authentication gate to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthModeKind {
    /// Identity established at login is trusted; no per-request verification
    Simple,
    /// Every protected request carries a verified signed token
    #[default]
    Full,
}

/// Authentication settings as loaded from configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub mode: AuthModeKind,
    /// Signing secret, required in full mode
    pub jwt_secret: Option<String>,
    /// Access token expiry in seconds (default: 15 minutes)
    pub access_token_expiry: i64,
    /// Refresh token expiry in seconds (default: 7 days)
    pub refresh_token_expiry: i64,
    pub issuer: String,
    pub audience: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthModeKind::Full,
            jwt_secret: None,
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            issuer: "compliance-api".to_string(),
            audience: "compliance-users".to_string(),
        }
    }
}

impl AuthConfig {
    /// Token settings for full mode; fails when no signing secret is configured
    pub fn jwt_config(&self) -> AuthResult<JwtConfig> {
        let secret_key = self
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AuthError::MissingConfig("auth.jwt_secret".to_string()))?;

        Ok(JwtConfig::with_settings(
            secret_key.to_string(),
            self.access_token_expiry,
            self.refresh_token_expiry,
            self.issuer.clone(),
            self.audience.clone(),
        ))
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret_key: String,
    /// Access token expiry in seconds
    pub access_token_expiry: i64,
    /// Refresh token expiry in seconds
    pub refresh_token_expiry: i64,
    /// Token issuer
    pub issuer: String,
    /// Token audience
    pub audience: String,
}

impl JwtConfig {
    pub fn with_settings(
        secret_key: String,
        access_token_expiry: i64,
        refresh_token_expiry: i64,
        issuer: String,
        audience: String,
    ) -> Self {
        Self {
            secret_key,
            access_token_expiry,
            refresh_token_expiry,
            issuer,
            audience,
        }
    }
}

// ============================================================================
// Token Pair
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token expiration time in seconds
    pub expires_in: i64,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

// ============================================================================
// Claims
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID as string)
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: String,
    pub iss: String,
    pub aud: String,
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub token_type: TokenType,
}

impl Claims {
    fn issue(principal: &Principal, token_type: TokenType, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => config.access_token_expiry,
            TokenType::Refresh => config.refresh_token_expiry,
        };
        let exp = now + Duration::seconds(lifetime);

        Self {
            sub: principal.user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            user_id: *principal.user_id.as_uuid(),
            email: principal.email.clone(),
            role: principal.role,
            token_type,
        }
    }

    pub fn new_access(principal: &Principal, config: &JwtConfig) -> Self {
        Self::issue(principal, TokenType::Access, config)
    }

    pub fn new_refresh(principal: &Principal, config: &JwtConfig) -> Self {
        Self::issue(principal, TokenType::Refresh, config)
    }

    pub fn validate(&self, expected_token_type: TokenType) -> AuthResult<()> {
        if self.token_type != expected_token_type {
            return Err(AuthError::InvalidTokenType {
                expected: expected_token_type.as_str().to_string(),
                actual: self.token_type.as_str().to_string(),
            });
        }

        let now = Utc::now().timestamp();
        if self.exp < now {
            return Err(AuthError::TokenExpired);
        }

        if self.nbf > now {
            return Err(AuthError::InvalidClaims);
        }

        Ok(())
    }

    /// The principal these claims authenticate
    pub fn principal(&self) -> Principal {
        Principal::new(UserId::from(self.user_id), self.email.clone(), self.role)
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Issues and verifies HS256 tokens. Verification is in-memory only.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let secret = config.secret_key.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            config,
        }
    }

    pub fn generate_token_pair(&self, principal: &Principal) -> AuthResult<TokenPair> {
        let access_claims = Claims::new_access(principal, &self.config);
        let refresh_claims = Claims::new_refresh(principal, &self.config);

        let access_token = encode(&Header::new(Algorithm::HS256), &access_claims, &self.encoding_key)?;
        let refresh_token = encode(&Header::new(Algorithm::HS256), &refresh_claims, &self.encoding_key)?;

        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.config.access_token_expiry,
        ))
    }

    fn decode_claims(&self, token: &str, expected: TokenType) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        token_data.claims.validate(expected)?;

        Ok(token_data.claims)
    }

    /// Verify signature, expiry, issuer, and audience of an access token
    pub fn validate_access_token(&self, token: &str) -> AuthResult<Claims> {
        self.decode_claims(token, TokenType::Access)
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

// ============================================================================
// Tests
// ============================================================================
