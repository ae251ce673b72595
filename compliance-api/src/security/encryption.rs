//! Field-level authenticated encryption for sensitive values at rest.
//!
//! Values are sealed with AES-256-GCM under a single process-wide key derived
//! with scrypt from a configured passphrase and salt. Each sealed value is
//! stored as a self-describing envelope:
//!
//! ```text
//! <nonce-hex>:<tag-hex>:<payload-hex>
//! ```
//!
//! The envelope format is persisted and must stay stable, otherwise existing
//! records become unreadable.
//!
//! Failures never cross the public boundary: [`FieldEncryption::encrypt`] and
//! [`FieldEncryption::decrypt`] log and return `None`, which callers must treat
//! as "value unavailable" rather than as an empty string.

use aes_gcm::aead::consts::{U12, U16};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use rand::RngCore;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
use zeroize::Zeroizing;

// ============================================================================
// Constants
// ============================================================================

/// Derived key length in bytes (AES-256)
pub const KEY_LENGTH: usize = 32;

/// Nonce length written by this engine
pub const NONCE_LENGTH: usize = 16;

/// Standard 96-bit GCM nonce, accepted on decrypt
pub const STANDARD_NONCE_LENGTH: usize = 12;

/// GCM authentication tag length
pub const TAG_LENGTH: usize = 16;

/// Envelope segment separator
pub const ENVELOPE_SEPARATOR: char = ':';

// scrypt cost parameters: N = 2^14, r = 8, p = 1
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

type Aes256Gcm16 = AesGcm<Aes256, U16>;
type Aes256Gcm12 = AesGcm<Aes256, U12>;

static FIELD_ENCRYPTION: OnceLock<FieldEncryption> = OnceLock::new();

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("encryption.salt must be set when encryption.key is configured")]
    MissingSalt,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Field encryption is disabled")]
    Disabled,

    #[error("Refusing to encrypt an empty value")]
    EmptyPlaintext,

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Encryption failed")]
    Encryption,

    #[error("Authentication tag mismatch")]
    Authentication,

    #[error("Decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

pub type EncryptionResult<T> = Result<T, EncryptionError>;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Clone, Default, Deserialize)]
pub struct EncryptionConfig {
    /// Passphrase the key is derived from
    #[serde(default)]
    pub key: Option<String>,
    /// Fixed derivation salt
    #[serde(default)]
    pub salt: Option<String>,
}

impl EncryptionConfig {
    pub fn new(key: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            salt: Some(salt.into()),
        }
    }

    fn passphrase(&self) -> Option<&str> {
        non_empty(self.key.as_deref())
    }

    fn salt(&self) -> Option<&str> {
        non_empty(self.salt.as_deref())
    }
}

impl fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("key", &self.passphrase().map(|_| "[REDACTED]"))
            .field("salt", &self.salt().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Envelope
// ============================================================================

/// Decoded segments of an envelope
struct Envelope {
    nonce: Vec<u8>,
    tag: Vec<u8>,
    payload: Vec<u8>,
}

impl Envelope {
    fn parse(value: &str) -> EncryptionResult<Self> {
        let segments: Vec<&str> = value.split(ENVELOPE_SEPARATOR).collect();
        let [nonce, tag, payload] = segments.as_slice() else {
            return Err(EncryptionError::MalformedEnvelope(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };

        let decode = |segment: &str, name: &str| {
            hex::decode(segment).map_err(|e| {
                EncryptionError::MalformedEnvelope(format!("{} segment: {}", name, e))
            })
        };

        Ok(Self {
            nonce: decode(*nonce, "nonce")?,
            tag: decode(*tag, "tag")?,
            payload: decode(*payload, "payload")?,
        })
    }

    fn encode(nonce: &[u8], tag: &[u8], payload: &[u8]) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            hex::encode(nonce),
            hex::encode(tag),
            hex::encode(payload),
            sep = ENVELOPE_SEPARATOR
        )
    }
}

/// Structural check for an envelope.
///
/// True when the value has exactly three hex segments with non-empty nonce and
/// tag. The tag is not verified, so a `true` result does not guarantee that
/// decryption will succeed.
pub fn is_encrypted(value: &str) -> bool {
    let segments: Vec<&str> = value.split(ENVELOPE_SEPARATOR).collect();
    let [nonce, tag, payload] = segments.as_slice() else {
        return false;
    };

    let is_hex = |s: &str| s.len() % 2 == 0 && s.bytes().all(|b| b.is_ascii_hexdigit());

    !nonce.is_empty() && !tag.is_empty() && is_hex(*nonce) && is_hex(*tag) && is_hex(*payload)
}

// ============================================================================
// Engine
// ============================================================================

struct Ciphers {
    wide: Aes256Gcm16,
    standard: Aes256Gcm12,
}

/// Field encryption engine.
///
/// Holds the derived key for the lifetime of the process. The engine is
/// read-only after construction and can be shared across requests freely.
pub struct FieldEncryption {
    ciphers: Option<Ciphers>,
}

impl FieldEncryption {
    /// Build an engine from configuration.
    ///
    /// - passphrase absent: encryption is disabled and every operation is a no-op
    /// - passphrase present, salt absent: fatal [`EncryptionError::MissingSalt`]
    pub fn new(config: &EncryptionConfig) -> EncryptionResult<Self> {
        let Some(passphrase) = config.passphrase() else {
            tracing::warn!(
                "encryption.key not configured, field encryption is disabled and sensitive fields will not be encrypted"
            );
            return Ok(Self::disabled());
        };

        let Some(salt) = config.salt() else {
            tracing::error!("encryption.key is set without encryption.salt");
            return Err(EncryptionError::MissingSalt);
        };

        let key = derive_key(passphrase, salt)?;
        let ciphers = Ciphers {
            wide: Aes256Gcm16::new_from_slice(key.as_ref())
                .map_err(|e| EncryptionError::KeyDerivation(e.to_string()))?,
            standard: Aes256Gcm12::new_from_slice(key.as_ref())
                .map_err(|e| EncryptionError::KeyDerivation(e.to_string()))?,
        };

        tracing::info!("Field encryption initialized");

        Ok(Self {
            ciphers: Some(ciphers),
        })
    }

    /// An engine with no key; all operations return `None`
    pub fn disabled() -> Self {
        Self { ciphers: None }
    }

    /// Install the process-wide engine.
    ///
    /// Must run at startup before any request is served. The configuration is
    /// always validated, but a second successful call keeps the engine that
    /// was installed first.
    pub fn initialize(config: &EncryptionConfig) -> EncryptionResult<&'static FieldEncryption> {
        let engine = Self::new(config)?;

        if FIELD_ENCRYPTION.set(engine).is_err() {
            tracing::warn!("Field encryption already initialized, keeping existing key");
        }

        FIELD_ENCRYPTION
            .get()
            .ok_or_else(|| EncryptionError::KeyDerivation("engine not installed".to_string()))
    }

    /// The process-wide engine, if [`FieldEncryption::initialize`] has run
    pub fn global() -> Option<&'static FieldEncryption> {
        FIELD_ENCRYPTION.get()
    }

    pub fn is_enabled(&self) -> bool {
        self.ciphers.is_some()
    }

    /// Seal a value into an envelope, propagating the failure reason
    pub fn try_encrypt(&self, plaintext: &str) -> EncryptionResult<String> {
        let ciphers = self.ciphers.as_ref().ok_or(EncryptionError::Disabled)?;
        if plaintext.is_empty() {
            return Err(EncryptionError::EmptyPlaintext);
        }

        let mut nonce = [0u8; NONCE_LENGTH];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = ciphers
            .wide
            .encrypt(Nonce::<U16>::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| EncryptionError::Encryption)?;

        // aes-gcm appends the tag to the ciphertext
        let (payload, tag) = sealed.split_at(sealed.len() - TAG_LENGTH);

        Ok(Envelope::encode(&nonce, tag, payload))
    }

    /// Open an envelope, propagating the failure reason
    pub fn try_decrypt(&self, envelope: &str) -> EncryptionResult<String> {
        let ciphers = self.ciphers.as_ref().ok_or(EncryptionError::Disabled)?;
        let Envelope {
            nonce,
            tag,
            payload,
        } = Envelope::parse(envelope)?;

        if tag.len() != TAG_LENGTH {
            return Err(EncryptionError::MalformedEnvelope(format!(
                "tag must be {} bytes, found {}",
                TAG_LENGTH,
                tag.len()
            )));
        }

        let mut sealed = payload;
        sealed.extend_from_slice(&tag);

        let opened = match nonce.len() {
            NONCE_LENGTH => ciphers
                .wide
                .decrypt(Nonce::<U16>::from_slice(&nonce), sealed.as_slice()),
            STANDARD_NONCE_LENGTH => ciphers
                .standard
                .decrypt(Nonce::<U12>::from_slice(&nonce), sealed.as_slice()),
            other => {
                return Err(EncryptionError::MalformedEnvelope(format!(
                    "unsupported nonce length {}",
                    other
                )))
            }
        }
        .map_err(|_| EncryptionError::Authentication)?;

        String::from_utf8(opened).map_err(|_| EncryptionError::InvalidUtf8)
    }

    /// Encrypt a value.
    ///
    /// Returns `None` when encryption is disabled, the value is empty, or the
    /// cipher fails. Encrypting the same value twice yields different envelopes.
    pub fn encrypt(&self, plaintext: &str) -> Option<String> {
        match self.try_encrypt(plaintext) {
            Ok(envelope) => Some(envelope),
            Err(EncryptionError::Disabled) | Err(EncryptionError::EmptyPlaintext) => None,
            Err(e) => {
                tracing::error!(error = %e, "Field encryption failed");
                None
            }
        }
    }

    /// Decrypt an envelope.
    ///
    /// Returns `None` for malformed envelopes, tampered or foreign-key
    /// ciphertext, and when encryption is disabled.
    pub fn decrypt(&self, envelope: &str) -> Option<String> {
        match self.try_decrypt(envelope) {
            Ok(plaintext) => Some(plaintext),
            Err(EncryptionError::Disabled) => {
                tracing::debug!("Field decryption skipped, encryption disabled");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Field decryption failed");
                None
            }
        }
    }

    /// Encrypt the named string fields of a record.
    ///
    /// Absent, non-string, and empty fields are left as they are, as are
    /// values that already open under this engine's key. A field whose
    /// encryption fails is set to `null` so plaintext never remains in a field
    /// designated for encryption. With encryption disabled the record is
    /// returned unchanged.
    pub fn encrypt_fields(&self, record: &Map<String, Value>, fields: &[&str]) -> Map<String, Value> {
        self.seal_fields(record, fields).0
    }

    /// [`FieldEncryption::encrypt_fields`], also returning the names of the
    /// fields that were sealed by this call
    pub fn seal_fields(
        &self,
        record: &Map<String, Value>,
        fields: &[&str],
    ) -> (Map<String, Value>, Vec<String>) {
        let mut result = record.clone();
        let mut sealed_fields = Vec::new();
        if !self.is_enabled() {
            return (result, sealed_fields);
        }

        for field in fields {
            let Some(Value::String(value)) = record.get(*field) else {
                continue;
            };
            if value.is_empty() || self.is_own_envelope(value) {
                continue;
            }

            let sealed = match self.encrypt(value) {
                Some(envelope) => {
                    sealed_fields.push((*field).to_string());
                    Value::String(envelope)
                }
                None => Value::Null,
            };
            result.insert((*field).to_string(), sealed);
        }

        (result, sealed_fields)
    }

    /// Envelope shape alone does not prove a value is ciphertext: plaintext
    /// such as `12:34:56` is three hex segments too
    fn is_own_envelope(&self, value: &str) -> bool {
        is_encrypted(value) && self.try_decrypt(value).is_ok()
    }

    /// Decrypt the named fields of a record.
    ///
    /// Only string fields that look like envelopes are touched; a field that
    /// fails to decrypt becomes `null`.
    pub fn decrypt_fields(&self, record: &Map<String, Value>, fields: &[&str]) -> Map<String, Value> {
        let mut result = record.clone();

        for field in fields {
            let Some(Value::String(value)) = record.get(*field) else {
                continue;
            };
            if !is_encrypted(value) {
                continue;
            }

            let opened = self.decrypt(value).map_or(Value::Null, Value::String);
            result.insert((*field).to_string(), opened);
        }

        result
    }
}

impl fmt::Debug for FieldEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldEncryption")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

fn derive_key(passphrase: &str, salt: &str) -> EncryptionResult<Zeroizing<[u8; KEY_LENGTH]>> {
    let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LENGTH)
        .map_err(|e| EncryptionError::KeyDerivation(e.to_string()))?;

    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    scrypt::scrypt(passphrase.as_bytes(), salt.as_bytes(), &params, key.as_mut())
        .map_err(|e| EncryptionError::KeyDerivation(e.to_string()))?;

    Ok(key)
}

// ============================================================================
// Tests
// ============================================================================
