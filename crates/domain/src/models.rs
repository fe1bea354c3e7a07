//! Response records with a stable schema
//!
//! Everything else the engine returns is handed to callers as
//! `serde_json::Value`.

use serde::{Deserialize, Serialize};

/// Answer of the root endpoint (`GET /`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub version: String,
    pub os: String,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub up_time_seconds: Option<u64>,
    /// Fields added by newer engine releases
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of the stream create and update calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDefinition {
    /// Full `CREATE STREAM` / `CREATE TABLE` statement
    pub sql: String,
}

impl StreamDefinition {
    pub fn new(sql: impl Into<String>) -> Self {
        Self { sql: sql.into() }
    }
}

/// One entry of the rule listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub id: String,
    #[serde(default)]
    pub status: String,
}
