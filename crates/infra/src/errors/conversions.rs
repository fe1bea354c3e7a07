//! Conversions from infrastructure failures into the client error taxonomy.

use std::path::PathBuf;

use ekuiper_domain::{ApplicationErrorBody, KuiperError};
use thiserror::Error;

/// Raw outcome of a failed HTTP exchange, before engine error parsing
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to {url} timed out: {message}")]
    Timeout { url: String, message: String },

    #[error("Failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Other(String),
}

impl TransportError {
    /// Classify a reqwest failure for the request sent to `url`.
    pub fn from_reqwest(err: &reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            return Self::Timeout { url: url.to_string(), message: err.to_string() };
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            if err.is_connect() {
                return Self::Connect { url: url.to_string(), message: err.to_string() };
            }
        }
        Self::Other(err.to_string())
    }
}

/// Key material and token signing failures
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Key file I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid key material: {0}")]
    Key(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Token auth is not enabled")]
    Disabled,
}

impl CredentialError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/* -------------------------------------------------------------------------- */
/* TransportError → KuiperError */
/* -------------------------------------------------------------------------- */

impl From<TransportError> for KuiperError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { url, message } => Self::Timeout { url, message },
            TransportError::Connect { message, .. } => {
                Self::TransportFailure { status: None, message }
            }
            TransportError::Status { status, body, .. } => match ApplicationErrorBody::parse(&body) {
                Some(app) => Self::application(app, Some(status)),
                None => Self::TransportFailure {
                    status: Some(status),
                    message: failure_message(&body, status),
                },
            },
            TransportError::Other(message) => Self::TransportFailure { status: None, message },
        }
    }
}

/* -------------------------------------------------------------------------- */
/* CredentialError → KuiperError */
/* -------------------------------------------------------------------------- */

impl From<CredentialError> for KuiperError {
    fn from(err: CredentialError) -> Self {
        Self::Credential(err.to_string())
    }
}

/// Best-effort human message for an unstructured error body: the `message`
/// field, then the `error` field, then the body itself.
pub(crate) fn failure_message(body: &str, status: u16) -> String {
    if let Ok(serde_json::Value::Object(object)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            match object.get(key) {
                Some(serde_json::Value::String(text)) if !text.is_empty() => return text.clone(),
                Some(serde_json::Value::Null) | None => {}
                Some(serde_json::Value::String(_)) => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP request failed with status code: {status}")
    } else {
        trimmed.to_string()
    }
}
