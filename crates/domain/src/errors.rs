//! Error types used throughout the client
//!
//! Every failure a caller can observe is folded into [`KuiperError`]. Remote
//! failures carry either a structured [`ErrorCode`] reported by the engine or
//! the raw HTTP status; local failures never touch the network.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error codes reported by the engine in the `error` field.
///
/// The code space is closed: anything not listed maps to [`ErrorCode::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Undefined,
    ResourceNotFound,
    IoError,
    EncodingError,
    SqlCompilation,
    SqlPlan,
    SqlExecutor,
    StreamTable,
    Rule,
    Configuration,
    Unknown,
}

impl ErrorCode {
    /// Map a numeric code to its variant. Unrecognized codes yield `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1000 => Self::Undefined,
            1002 => Self::ResourceNotFound,
            1003 => Self::IoError,
            1004 => Self::EncodingError,
            2001 => Self::SqlCompilation,
            2101 => Self::SqlPlan,
            2201 => Self::SqlExecutor,
            3000 => Self::StreamTable,
            4000 => Self::Rule,
            5000 => Self::Configuration,
            _ => Self::Unknown,
        }
    }

    /// Canonical numeric value of this code (`-1` for `Unknown`).
    pub fn code(self) -> i64 {
        match self {
            Self::Undefined => 1000,
            Self::ResourceNotFound => 1002,
            Self::IoError => 1003,
            Self::EncodingError => 1004,
            Self::SqlCompilation => 2001,
            Self::SqlPlan => 2101,
            Self::SqlExecutor => 2201,
            Self::StreamTable => 3000,
            Self::Rule => 4000,
            Self::Configuration => 5000,
            Self::Unknown => -1,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Undefined => "Undefined error code",
            Self::ResourceNotFound => "Resource not found",
            Self::IoError => "IO error in Source/Sink",
            Self::EncodingError => "Encoding error",
            Self::SqlCompilation => "SQL compilation error, syntax incorrect",
            Self::SqlPlan => "SQL plan error, cannot generate execution plan",
            Self::SqlExecutor => "SQL executor error, cannot generate executor",
            Self::StreamTable => "Stream table related error",
            Self::Rule => "Rule related error",
            Self::Configuration => "Configuration related error",
            Self::Unknown => "Unknown error",
        }
    }

    /// True for the SQL compilation, plan and executor codes.
    pub fn is_sql(self) -> bool {
        matches!(self, Self::SqlCompilation | Self::SqlPlan | Self::SqlExecutor)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.description())
    }
}

/// Wire shape of an engine error body: `{"error": 1003, "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationErrorBody {
    pub error: i64,
    #[serde(default)]
    pub message: String,
}

impl ApplicationErrorBody {
    /// Parse `body` as an engine error. Returns `None` unless the body is a
    /// JSON object with a positive numeric `error` field.
    pub fn parse(body: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let object = value.as_object()?;
        let code = object.get("error")?.as_i64()?;
        if code <= 0 {
            return None;
        }
        let message = match object.get("message") {
            Some(serde_json::Value::String(text)) => text.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Some(Self { error: code, message })
    }

    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from_code(self.error)
    }
}

/// Coarse classification of a [`KuiperError`], for callers that branch on
/// failure class rather than on the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local precondition violation; never sent over the wire
    InvalidArgument,
    /// Connect or read timeout
    Timeout,
    /// Connection-level failure or unstructured error response
    TransportFailure,
    /// Structured error reported by the engine
    Application,
    /// Body did not match the expected response shape
    DecodeFailure,
    /// Invalid client configuration
    Configuration,
    /// Key material or token signing failure
    Credential,
}

/// Unified error taxonomy for every client operation.
#[derive(Debug, Error)]
pub enum KuiperError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Request timed out: {message}")]
    Timeout { url: String, message: String },

    #[error("{message}")]
    TransportFailure { status: Option<u16>, message: String },

    #[error("[{} - {}] {message}", .code.code(), .code.description())]
    Application { code: ErrorCode, raw_code: i64, message: String, status: Option<u16> },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Credential error: {0}")]
    Credential(String),
}

impl KuiperError {
    /// Build an application error from a parsed engine error body.
    pub fn application(body: ApplicationErrorBody, status: Option<u16>) -> Self {
        Self::Application {
            code: body.error_code(),
            raw_code: body.error,
            message: body.message,
            status,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::TransportFailure { .. } => ErrorKind::TransportFailure,
            Self::Application { .. } => ErrorKind::Application,
            Self::Decode(_) => ErrorKind::DecodeFailure,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Credential(_) => ErrorKind::Credential,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Engine error code, for application errors only.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Application { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// HTTP status of the failed exchange, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TransportFailure { status, .. } | Self::Application { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, KuiperError>;
