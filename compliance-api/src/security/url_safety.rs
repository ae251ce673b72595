//! URL checks for user-supplied links.
//!
//! Two rule sets with different purposes:
//! - [`is_safe_url`] gates URLs the server will fetch itself (document
//!   retrieval, webhook callbacks). It is an SSRF control.
//! - [`is_valid_file_url`] accepts stored references to externally hosted
//!   documents that the server never dereferences, so it is more permissive.

use serde::Deserialize;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;
use url::{Host, Url};
use validator::ValidationError;

/// Hostname suffixes that only resolve inside private networks
pub const BLOCKED_HOST_SUFFIXES: &[&str] = &[".local", ".internal", ".lan", ".intranet"];

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// Object storage and blob hosts whose URLs need no file extension
pub const DEFAULT_TRUSTED_DOMAINS: &[&str] = &[
    "s3.amazonaws.com",
    "storage.googleapis.com",
    "blob.core.windows.net",
    "cloudfront.net",
    "digitaloceanspaces.com",
];

static ACTIVE_FILE_URL_POLICY: OnceLock<FileUrlPolicy> = OnceLock::new();

// ============================================================================
// SSRF validation
// ============================================================================

/// Whether the server may fetch `url`.
///
/// An empty value is accepted; whether the field is required is the caller's
/// concern. Otherwise the URL must be absolute http(s) and its host must not be
/// loopback, a private or link-local IPv4 range, or an internal-only name.
pub fn is_safe_url(url: &str) -> bool {
    if url.trim().is_empty() {
        return true;
    }

    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    if !is_http_scheme(&parsed) {
        return false;
    }

    match parsed.host() {
        Some(Host::Domain(domain)) => !is_internal_hostname(domain),
        Some(Host::Ipv4(addr)) => !is_blocked_ipv4(addr),
        Some(Host::Ipv6(addr)) => !is_blocked_ipv6(addr),
        None => false,
    }
}

fn is_http_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn normalize_host(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_internal_hostname(domain: &str) -> bool {
    let host = normalize_host(domain);

    host == "localhost"
        || host.ends_with(".localhost")
        || host.starts_with("localhost.")
        || BLOCKED_HOST_SUFFIXES
            .iter()
            .any(|suffix| host.ends_with(suffix))
}

/// Loopback, 10/8, 172.16/12, 192.168/16, 169.254/16 and the unspecified address
fn is_blocked_ipv4(addr: Ipv4Addr) -> bool {
    addr.is_loopback() || addr.is_private() || addr.is_link_local() || addr.is_unspecified()
}

/// Loopback, unspecified, unique-local fc00::/7 and link-local fe80::/10
fn is_blocked_ipv6(addr: Ipv6Addr) -> bool {
    let first = addr.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00;
    let link_local = (first & 0xffc0) == 0xfe80;

    if addr.is_loopback() || addr.is_unspecified() || unique_local || link_local {
        return true;
    }

    // ::ffff:a.b.c.d reaches the embedded IPv4 host
    addr.to_ipv4_mapped().is_some_and(is_blocked_ipv4)
}

// ============================================================================
// Stored document references
// ============================================================================

/// Allow-lists for document reference URLs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileUrlPolicy {
    /// File extensions, without the leading dot
    pub allowed_extensions: Vec<String>,
    /// Domains matched exactly or as a parent of the URL host
    pub trusted_domains: Vec<String>,
}

impl Default for FileUrlPolicy {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            trusted_domains: DEFAULT_TRUSTED_DOMAINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FileUrlPolicy {
    /// Make this the policy behind [`is_valid_file_url`].
    ///
    /// Only the first installation takes effect, and it must happen before the
    /// first validation, which otherwise pins the default lists.
    pub fn install(self) -> &'static FileUrlPolicy {
        let active = ACTIVE_FILE_URL_POLICY.get_or_init(|| self.clone());
        if *active != self {
            tracing::warn!("File URL policy already in effect, ignoring new policy");
        }
        active
    }

    /// Accepts empty input, otherwise an http(s) URL with a host whose path has
    /// an allowed extension or whose host belongs to a trusted domain.
    pub fn is_valid(&self, url: &str) -> bool {
        if url.trim().is_empty() {
            return true;
        }

        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        if !is_http_scheme(&parsed) {
            return false;
        }

        let Some(host) = parsed.host_str().filter(|h| !h.is_empty()) else {
            return false;
        };

        self.has_allowed_extension(parsed.path()) || self.is_trusted_host(host)
    }

    fn has_allowed_extension(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|ext| {
            let ext = ext.trim_start_matches('.').to_ascii_lowercase();
            path.ends_with(&format!(".{}", ext))
        })
    }

    fn is_trusted_host(&self, host: &str) -> bool {
        let host = normalize_host(host);
        self.trusted_domains.iter().any(|domain| {
            let domain = normalize_host(domain);
            host == domain || host.ends_with(&format!(".{}", domain))
        })
    }
}

/// [`FileUrlPolicy::is_valid`] with the installed policy, or the default
/// allow-lists when none was installed
pub fn is_valid_file_url(url: &str) -> bool {
    ACTIVE_FILE_URL_POLICY
        .get_or_init(FileUrlPolicy::default)
        .is_valid(url)
}

// ============================================================================
// validator integration
// ============================================================================

/// `#[validate(custom(function = "validate_safe_url"))]`
pub fn validate_safe_url(value: &str) -> Result<(), ValidationError> {
    if is_safe_url(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("safe_url");
        err.message = Some("URL must be http(s) and must not target a private or internal host".into());
        Err(err)
    }
}

/// `#[validate(custom(function = "validate_file_url"))]`
pub fn validate_file_url(value: &str) -> Result<(), ValidationError> {
    if is_valid_file_url(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("file_url");
        err.message = Some("URL must point to a supported document type or a trusted storage host".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_accepted() {
        assert!(is_safe_url(""));
        assert!(is_valid_file_url(""));
    }

    #[test]
    fn test_ipv4_mapped_ipv6() {
        assert!(!is_safe_url("http://[::ffff:10.0.0.1]/"));
        assert!(!is_safe_url("http://[::ffff:127.0.0.1]/"));
        assert!(is_safe_url("http://[::ffff:8.8.8.8]/"));
    }

    #[test]
    fn test_ipv6_private_ranges() {
        assert!(!is_safe_url("http://[fc00::1]/"));
        assert!(!is_safe_url("http://[fd12:3456:789a::1]/hook"));
        assert!(!is_safe_url("http://[fe80::1]/"));
        assert!(!is_safe_url("http://[febf:ffff::1]/"));
        assert!(is_safe_url("http://[fec0::1]/"));
        assert!(is_safe_url("http://[2606:4700::1111]/"));
    }

    #[test]
    fn test_trailing_dot_and_case() {
        assert!(!is_safe_url("http://LOCALHOST./"));
        assert!(!is_safe_url("https://Printer.LAN/status"));
    }

    #[test]
    fn test_custom_policy() {
        let policy = FileUrlPolicy {
            allowed_extensions: vec![".xlsx".to_string()],
            trusted_domains: vec!["files.example.org".to_string()],
        };

        assert!(policy.is_valid("https://cdn.example.com/ledger.XLSX"));
        assert!(policy.is_valid("https://eu.files.example.org/abc"));
        assert!(!policy.is_valid("https://cdn.example.com/report.pdf"));
        assert!(!policy.is_valid("https://notfiles.example.org/abc"));
    }

    #[test]
    fn test_validator_wrappers() {
        assert!(validate_safe_url("https://example.com").is_ok());
        assert_eq!(
            validate_safe_url("http://192.168.1.1").unwrap_err().code,
            "safe_url"
        );
        assert_eq!(
            validate_file_url("https://example.com/report").unwrap_err().code,
            "file_url"
        );
    }
}
