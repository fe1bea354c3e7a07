//! Client configuration
//!
//! Every field has a default, so a partial JSON/TOML document (or an empty
//! one) deserializes into a usable configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AUDIENCE, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_HOST, DEFAULT_ISSUER,
    DEFAULT_KEY_DIR, DEFAULT_MANAGEMENT_PATH, DEFAULT_PORT, DEFAULT_PRIVATE_KEY_FILE,
    DEFAULT_READ_TIMEOUT_MS, DEFAULT_REFRESH_INTERVAL_MS, DEFAULT_SCHEME,
    DEFAULT_TOKEN_VALIDITY_SECS,
};
use crate::errors::{KuiperError, Result};

/// Connection and authentication settings for one engine instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub scheme: String,
    pub host: String,
    pub port: u16,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub basic: BasicAuthConfig,
    pub jwt: JwtConfig,
}

/// Static basic-auth credentials
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicAuthConfig {
    pub enabled: bool,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl fmt::Debug for BasicAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthConfig")
            .field("enabled", &self.enabled)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Signed-token authentication settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub enabled: bool,
    /// Defaults to `certs/ekuiper_rsa.key`
    pub private_key_path: Option<PathBuf>,
    /// Defaults to `certs/{issuer}`
    pub public_key_path: Option<PathBuf>,
    pub issuer: String,
    pub audience: String,
    pub expiration_seconds: u64,
    pub refresh_interval_ms: u64,
    /// Directory the engine watches for trusted public keys
    pub management_path: PathBuf,
    /// Optional prefix for the `Authorization` value, e.g. `Bearer`
    pub header_scheme: Option<String>,
}

/// Authentication mode resolved from a [`ClientConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    None,
    Basic,
    Jwt,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            basic: BasicAuthConfig::default(),
            jwt: JwtConfig::default(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            private_key_path: None,
            public_key_path: None,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            expiration_seconds: DEFAULT_TOKEN_VALIDITY_SECS,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            management_path: PathBuf::from(DEFAULT_MANAGEMENT_PATH),
            header_scheme: None,
        }
    }
}

impl ClientConfig {
    /// Base URL of the management API, `{scheme}://{host}:{port}`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Token auth wins over basic auth; basic auth needs both credentials.
    pub fn auth_mode(&self) -> AuthMode {
        if self.jwt.enabled {
            AuthMode::Jwt
        } else if self.basic.enabled
            && self.basic.username.is_some()
            && self.basic.password.is_some()
        {
            AuthMode::Basic
        } else {
            AuthMode::None
        }
    }

    /// Reject settings the client cannot run with.
    ///
    /// # Errors
    /// Returns `KuiperError::Configuration` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(KuiperError::Configuration(format!(
                "Unsupported scheme: {}",
                self.scheme
            )));
        }
        if self.host.trim().is_empty() {
            return Err(KuiperError::Configuration("Host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(KuiperError::Configuration("Port must be non-zero".to_string()));
        }
        if self.connect_timeout_ms == 0 || self.read_timeout_ms == 0 {
            return Err(KuiperError::Configuration("Timeouts must be non-zero".to_string()));
        }
        if self.jwt.enabled {
            self.jwt.validate()?;
        }
        Ok(())
    }
}

impl JwtConfig {
    pub fn token_validity(&self) -> Duration {
        Duration::from_secs(self.expiration_seconds)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn resolved_private_key_path(&self) -> PathBuf {
        self.private_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_DIR).join(DEFAULT_PRIVATE_KEY_FILE))
    }

    pub fn resolved_public_key_path(&self) -> PathBuf {
        self.public_key_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_KEY_DIR).join(&self.issuer))
    }

    /// Location of the deployed public key, `{management_path}/{issuer}`.
    pub fn deployed_key_path(&self) -> PathBuf {
        self.management_path.join(&self.issuer)
    }

    fn validate(&self) -> Result<()> {
        if self.issuer.trim().is_empty() {
            return Err(KuiperError::Configuration("Token issuer must not be empty".to_string()));
        }
        if self.issuer.contains(['/', '\\']) {
            return Err(KuiperError::Configuration(format!(
                "Token issuer is used as a file name and must not contain path separators: {}",
                self.issuer
            )));
        }
        if self.audience.trim().is_empty() {
            return Err(KuiperError::Configuration(
                "Token audience must not be empty".to_string(),
            ));
        }
        if self.expiration_seconds == 0 {
            return Err(KuiperError::Configuration(
                "Token validity must be non-zero".to_string(),
            ));
        }
        if self.refresh_interval_ms == 0 {
            return Err(KuiperError::Configuration(
                "Refresh interval must be non-zero".to_string(),
            ));
        }
        if self.refresh_interval() >= self.token_validity() {
            return Err(KuiperError::Configuration(format!(
                "Refresh interval ({} ms) must be shorter than token validity ({} s)",
                self.refresh_interval_ms, self.expiration_seconds
            )));
        }
        Ok(())
    }
}
