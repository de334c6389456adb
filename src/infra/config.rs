//! Configuration management infrastructure.
//!
//! One TOML file with four sections: `[keystore]` (where the signing key
//! lives), `[signing]`, `[server]` and `[batch]`. The keystore password may be
//! supplied through `ETA_SIGNER_KEYSTORE_PASSWORD` instead of the file.

use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::yubikey::PivSlot;
use crate::domain::crypto::DigestAlgorithm;
use crate::infra::error::{SigningError, SigningResult};

/// Environment variable overriding `keystore.password`.
pub const KEYSTORE_PASSWORD_ENV: &str = "ETA_SIGNER_KEYSTORE_PASSWORD";

/// Complete signer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignerConfiguration {
    pub keystore: KeystoreConfig,
    pub signing: SigningSection,
    pub server: ServerConfig,
    pub batch: BatchConfig,
}

/// Where the private key and certificate come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeystoreBackend {
    /// PKCS#12 archive at `path`.
    #[default]
    Pkcs12,
    /// PEM certificate at `path`, PEM key at `key_path`.
    Pem,
    /// Hardware token slot `piv_slot`, PIN in `password`.
    Piv,
    /// Throw-away self-signed identity generated at startup. Development only.
    Ephemeral,
}

impl fmt::Display for KeystoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeystoreBackend::Pkcs12 => "pkcs12",
            KeystoreBackend::Pem => "pem",
            KeystoreBackend::Piv => "piv",
            KeystoreBackend::Ephemeral => "ephemeral",
        })
    }
}

impl FromStr for KeystoreBackend {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pkcs12" | "p12" => Ok(KeystoreBackend::Pkcs12),
            "pem" => Ok(KeystoreBackend::Pem),
            "piv" | "yubikey" => Ok(KeystoreBackend::Piv),
            "ephemeral" => Ok(KeystoreBackend::Ephemeral),
            other => Err(SigningError::ConfigurationError(format!(
                "Unknown keystore backend: {other}"
            ))),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoreConfig {
    pub backend: KeystoreBackend,
    pub path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Substring the signer certificate's issuer must contain.
    pub certificate_issuer_name: String,
    pub piv_slot: String,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            backend: KeystoreBackend::default(),
            path: None,
            key_path: None,
            password: None,
            certificate_issuer_name: String::new(),
            piv_slot: PivSlot::default().to_string(),
        }
    }
}

impl KeystoreConfig {
    /// Password from the environment, falling back to the file value.
    #[must_use]
    pub fn resolved_password(&self) -> Option<String> {
        std::env::var(KEYSTORE_PASSWORD_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.password.clone())
    }

    pub fn slot(&self) -> SigningResult<PivSlot> {
        self.piv_slot.parse()
    }

    /// `path`, or a `ConfigurationError` naming the backend that needs it.
    pub fn require_path(&self) -> SigningResult<&Path> {
        self.path.as_deref().ok_or_else(|| {
            SigningError::ConfigurationError(format!(
                "keystore.path is required for the {} backend",
                self.backend
            ))
        })
    }
}

impl fmt::Debug for KeystoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeystoreConfig")
            .field("backend", &self.backend)
            .field("path", &self.path)
            .field("key_path", &self.key_path)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("certificate_issuer_name", &self.certificate_issuer_name)
            .field("piv_slot", &self.piv_slot)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningSection {
    pub digest_algorithm: String,
}

impl Default for SigningSection {
    fn default() -> Self {
        Self {
            digest_algorithm: DigestAlgorithm::Sha256.as_str().to_string(),
        }
    }
}

impl SigningSection {
    /// Fails with `DigestAlgorithmUnavailable` for anything but SHA-256.
    pub fn digest_algorithm(&self) -> SigningResult<DigestAlgorithm> {
        self.digest_algorithm.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub username: String,
    /// Lowercase hex SHA-256 of the basic-auth password.
    pub password_sha256: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            username: String::new(),
            password_sha256: String::new(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SigningResult<SocketAddr> {
        self.bind_address.parse().map_err(|e| {
            SigningError::ConfigurationError(format!(
                "Invalid server.bind_address '{}': {e}",
                self.bind_address
            ))
        })
    }

    /// Whether basic-auth credentials are configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password_sha256.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_concurrency: usize,
    /// Zero disables the deadline.
    pub deadline_seconds: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            deadline_seconds: 0,
        }
    }
}

impl BatchConfig {
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        (self.deadline_seconds > 0).then(|| Duration::from_secs(self.deadline_seconds))
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// `<config_dir>/eta-signer/config.toml`, or the working directory when
    /// the platform has no config directory.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        match dirs::config_dir() {
            Some(config_dir) => config_dir.join("eta-signer").join("config.toml"),
            None => PathBuf::from("eta-signer-config.toml"),
        }
    }

    /// Read configuration from file, creating default if it doesn't exist.
    ///
    /// The result is not validated: a fresh default names no keystore yet.
    pub fn load_or_create_default(&self) -> SigningResult<SignerConfiguration> {
        if self.config_path.exists() {
            self.read()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = SignerConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load and validate the configuration file.
    pub fn load(&self) -> SigningResult<SignerConfiguration> {
        let config = self.read()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Read the configuration file without validating it.
    pub fn read(&self) -> SigningResult<SignerConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            SigningError::ConfigurationError(format!(
                "Failed to read config file {}: {e}",
                self.config_path.display()
            ))
        })?;
        Self::parse(&content)
    }

    /// Parse TOML text without validating it.
    pub fn parse(content: &str) -> SigningResult<SignerConfiguration> {
        toml::from_str(content).map_err(|e| {
            SigningError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })
    }

    /// Save configuration to file
    pub fn save(&self, config: &SignerConfiguration) -> SigningResult<()> {
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    SigningError::ConfigurationError(format!(
                        "Failed to create config directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            SigningError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            SigningError::ConfigurationError(format!(
                "Failed to write config file {}: {e}",
                self.config_path.display()
            ))
        })?;
        Ok(())
    }

    /// Set one `section.key` value and save.
    ///
    /// Only the value itself is checked; cross-field validation happens on [`load`](Self::load).
    pub fn update_value(&self, key: &str, value: &str) -> SigningResult<()> {
        let mut config = self.load_or_create_default()?;
        match key {
            "keystore.backend" => {
                config.keystore.backend = value.parse()?;
            }
            "keystore.path" => config.keystore.path = Some(PathBuf::from(value)),
            "keystore.key_path" => config.keystore.key_path = Some(PathBuf::from(value)),
            "keystore.certificate_issuer_name" => {
                config.keystore.certificate_issuer_name = value.to_string();
            }
            "keystore.piv_slot" => {
                value.parse::<PivSlot>()?;
                config.keystore.piv_slot = value.to_string();
            }
            "signing.digest_algorithm" => {
                value.parse::<DigestAlgorithm>()?;
                config.signing.digest_algorithm = value.to_string();
            }
            "server.bind_address" => {
                config.server.bind_address = value.to_string();
                config.server.socket_addr()?;
            }
            "server.username" => config.server.username = value.to_string(),
            "server.password_sha256" => config.server.password_sha256 = value.to_ascii_lowercase(),
            "batch.max_concurrency" => {
                config.batch.max_concurrency = value.parse().map_err(|_| {
                    SigningError::ConfigurationError(format!("Invalid number: {value}"))
                })?;
            }
            "batch.deadline_seconds" => {
                config.batch.deadline_seconds = value.parse().map_err(|_| {
                    SigningError::ConfigurationError(format!("Invalid number: {value}"))
                })?;
            }
            _ => {
                return Err(SigningError::ConfigurationError(format!(
                    "Unknown configuration key: {key}"
                )));
            }
        }
        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Check cross-field constraints.
///
/// An unsupported digest algorithm surfaces as `DigestAlgorithmUnavailable`,
/// everything else as `ConfigurationError`.
pub fn validate_config(config: &SignerConfiguration) -> SigningResult<()> {
    config.signing.digest_algorithm()?;

    let keystore = &config.keystore;
    match keystore.backend {
        KeystoreBackend::Pkcs12 => {
            keystore.require_path()?;
        }
        KeystoreBackend::Pem => {
            keystore.require_path()?;
            if keystore.key_path.is_none() {
                return Err(SigningError::ConfigurationError(
                    "keystore.key_path is required for the pem backend".to_string(),
                ));
            }
        }
        KeystoreBackend::Piv => {
            keystore.slot()?;
        }
        KeystoreBackend::Ephemeral => {}
    }

    config.server.socket_addr()?;
    let hash = &config.server.password_sha256;
    if !hash.is_empty() && hex::decode(hash).map_or(true, |digest| digest.len() != 32) {
        return Err(SigningError::ConfigurationError(
            "server.password_sha256 must be 64 hex characters".to_string(),
        ));
    }

    if config.batch.max_concurrency == 0 {
        return Err(SigningError::ConfigurationError(
            "batch.max_concurrency must be greater than 0".to_string(),
        ));
    }
    Ok(())
}
