//! Security module for compliance-api
//!
//! Provides:
//! - Field-level authenticated encryption for PII at rest
//! - SSRF-safe URL validation and document URL allow-listing
//! - Markup stripping for free-text input
//! - Role-based access control
//! - JWT issuing/verification and the authentication gate

pub mod auth;
pub mod encryption;
pub mod gate;
pub mod rbac;
pub mod sanitize;
pub mod url_safety;

pub use auth::{
    AuthConfig, AuthError, AuthModeKind, AuthResult, Claims, JwtConfig, JwtService, TokenPair,
    TokenType,
};
pub use encryption::{
    is_encrypted, EncryptionConfig, EncryptionError, EncryptionResult, FieldEncryption,
};
pub use gate::{bearer_token, AuthGate, AuthMode, GateOutcome};
pub use rbac::RoleGuard;
pub use sanitize::{sanitize, sanitize_fields, sanitize_text};
pub use url_safety::{
    is_safe_url, is_valid_file_url, validate_file_url, validate_safe_url, FileUrlPolicy,
};
