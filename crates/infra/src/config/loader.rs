//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `EKUIPER_HOST` is unset or a value is invalid, falls back to a file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `EKUIPER_HOST`: Management API host (required)
//! - `EKUIPER_SCHEME`, `EKUIPER_PORT`: URL scheme and port
//! - `EKUIPER_CONNECT_TIMEOUT_MS`, `EKUIPER_READ_TIMEOUT_MS`: Timeouts
//! - `EKUIPER_BASIC_ENABLED`, `EKUIPER_BASIC_USERNAME`,
//!   `EKUIPER_BASIC_PASSWORD`: Basic auth
//! - `EKUIPER_JWT_ENABLED`: Token auth on/off
//! - `EKUIPER_JWT_ISSUER`, `EKUIPER_JWT_AUDIENCE`: Token claims
//! - `EKUIPER_JWT_EXPIRATION_SECONDS`, `EKUIPER_JWT_REFRESH_INTERVAL_MS`
//! - `EKUIPER_JWT_MANAGEMENT_PATH`: Public key deployment directory
//! - `EKUIPER_JWT_PRIVATE_KEY_PATH`, `EKUIPER_JWT_PUBLIC_KEY_PATH`
//! - `EKUIPER_JWT_HEADER_SCHEME`: Prefix for the `Authorization` value
//!
//! Unset variables keep their defaults.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./ekuiper.{json,toml}` and `./config.{json,toml}`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ekuiper_domain::{ClientConfig, KuiperError, Result};

const CONFIG_FILE_NAMES: [&str; 4] = ["ekuiper.json", "ekuiper.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `KuiperError::Configuration` if neither source yields a valid
/// configuration.
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `KuiperError::Configuration` if `EKUIPER_HOST` is missing, a
/// numeric variable does not parse, or the result fails validation.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig { host: env_var("EKUIPER_HOST")?, ..ClientConfig::default() };

    if let Some(scheme) = env_opt("EKUIPER_SCHEME") {
        config.scheme = scheme;
    }
    if let Some(port) = env_parse("EKUIPER_PORT")? {
        config.port = port;
    }
    if let Some(ms) = env_parse("EKUIPER_CONNECT_TIMEOUT_MS")? {
        config.connect_timeout_ms = ms;
    }
    if let Some(ms) = env_parse("EKUIPER_READ_TIMEOUT_MS")? {
        config.read_timeout_ms = ms;
    }

    config.basic.enabled = env_bool("EKUIPER_BASIC_ENABLED", false);
    config.basic.username = env_opt("EKUIPER_BASIC_USERNAME");
    config.basic.password = env_opt("EKUIPER_BASIC_PASSWORD");

    let jwt = &mut config.jwt;
    jwt.enabled = env_bool("EKUIPER_JWT_ENABLED", false);
    if let Some(issuer) = env_opt("EKUIPER_JWT_ISSUER") {
        jwt.issuer = issuer;
    }
    if let Some(audience) = env_opt("EKUIPER_JWT_AUDIENCE") {
        jwt.audience = audience;
    }
    if let Some(secs) = env_parse("EKUIPER_JWT_EXPIRATION_SECONDS")? {
        jwt.expiration_seconds = secs;
    }
    if let Some(ms) = env_parse("EKUIPER_JWT_REFRESH_INTERVAL_MS")? {
        jwt.refresh_interval_ms = ms;
    }
    if let Some(path) = env_opt("EKUIPER_JWT_MANAGEMENT_PATH") {
        jwt.management_path = PathBuf::from(path);
    }
    jwt.private_key_path = env_opt("EKUIPER_JWT_PRIVATE_KEY_PATH").map(PathBuf::from);
    jwt.public_key_path = env_opt("EKUIPER_JWT_PUBLIC_KEY_PATH").map(PathBuf::from);
    jwt.header_scheme = env_opt("EKUIPER_JWT_HEADER_SCHEME");

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the locations listed in the module docs.
///
/// # Errors
/// Returns `KuiperError::Configuration` if the file is missing, cannot be
/// parsed, or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(KuiperError::Configuration(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            KuiperError::Configuration(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| KuiperError::Configuration(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Format is detected by file extension; anything unlabelled is JSON.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| KuiperError::Configuration(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| KuiperError::Configuration(format!("Invalid JSON format: {e}"))),
        _ => Err(KuiperError::Configuration(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        KuiperError::Configuration(format!("Missing required environment variable: {key}"))
    })
}

/// Set and non-empty
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| KuiperError::Configuration(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
