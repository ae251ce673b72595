use anyhow::Result;
use compliance_api::{AuthConfig, EncryptionConfig, FileUrlPolicy};
use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub encryption: EncryptionConfig,
    pub auth: AuthConfig,
    pub file_urls: FileUrlPolicy,
}

impl Config {
    /// Layered load: config/default, config/local, then COMPLIANCE__* env vars
    pub fn load() -> Result<Self> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("COMPLIANCE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            encryption: EncryptionConfig::default(),
            auth: AuthConfig::default(),
            file_urls: FileUrlPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_api::AuthModeKind;
    use config::FileFormat;
    use pretty_assertions::assert_eq;

    fn from_toml(source: &str) -> Config {
        ConfigLoader::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.auth.mode, AuthModeKind::Full);
        assert!(config.encryption.key.is_none());
        assert_eq!(config.file_urls, FileUrlPolicy::default());
    }

    #[test]
    fn test_nested_sections() {
        let config = from_toml(
            r#"
            port = 8080
            log_format = "json"

            [encryption]
            key = "passphrase"
            salt = "salt"

            [auth]
            mode = "simple"

            [file_urls]
            trusted_domains = ["files.example.org"]
            "#,
        );

        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.encryption.salt.as_deref(), Some("salt"));
        assert_eq!(config.auth.mode, AuthModeKind::Simple);
        assert_eq!(config.file_urls.trusted_domains, vec!["files.example.org".to_string()]);
        assert!(!config.file_urls.allowed_extensions.is_empty());
    }
}
