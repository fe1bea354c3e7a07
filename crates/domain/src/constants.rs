//! Client constants
//!
//! Defaults shared by the configuration types and the infra layer.

// Connection defaults
pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9081;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 15_000;

// Token defaults
pub const DEFAULT_ISSUER: &str = "ekuiper-rs.pub";
pub const DEFAULT_AUDIENCE: &str = "eKuiper";
pub const DEFAULT_TOKEN_VALIDITY_SECS: u64 = 3_600;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 600_000;
pub const DEFAULT_MANAGEMENT_PATH: &str = "/etc/mgmt";

// Key material
pub const DEFAULT_KEY_DIR: &str = "certs";
pub const DEFAULT_PRIVATE_KEY_FILE: &str = "ekuiper_rsa.key";
pub const RSA_KEY_BITS: usize = 2048;

// Headers
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const JSON_CONTENT_TYPE: &str = "application/json";
