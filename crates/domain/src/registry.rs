//! Endpoint registry
//!
//! The registry maps an [`Operation`] to its [`EndpointDescriptor`] and is
//! built once, at client construction. Building it checks that every
//! descriptor declares exactly as many path variables as its template has
//! placeholders; a mismatch is a programming error and aborts construction.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::endpoint::{EndpointDescriptor, Operation};
use crate::errors::KuiperError;

/// Registry construction failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error(
        "Endpoint {operation} declares {declared} path variables but template '{path}' has {actual}"
    )]
    PlaceholderMismatch { operation: Operation, path: &'static str, declared: usize, actual: usize },

    #[error("Endpoint {operation} has a malformed path template '{path}'")]
    MalformedTemplate { operation: Operation, path: &'static str },

    #[error("Endpoint {0} is registered more than once")]
    Duplicate(Operation),
}

impl From<RegistryError> for KuiperError {
    fn from(err: RegistryError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Immutable lookup table of endpoint descriptors
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    entries: BTreeMap<Operation, EndpointDescriptor>,
}

impl EndpointRegistry {
    /// Build a registry from `descriptors`, validating each one.
    ///
    /// # Errors
    /// Returns the first [`RegistryError`] found.
    pub fn new<I>(descriptors: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = EndpointDescriptor>,
    {
        let mut entries = BTreeMap::new();
        for descriptor in descriptors {
            let actual = descriptor.placeholder_count();
            if actual != descriptor.expected_vars {
                return Err(RegistryError::PlaceholderMismatch {
                    operation: descriptor.operation,
                    path: descriptor.path,
                    declared: descriptor.expected_vars,
                    actual,
                });
            }
            let placeholders = vec![""; descriptor.expected_vars];
            if descriptor.expand_path(&placeholders, str::to_string).is_err() {
                return Err(RegistryError::MalformedTemplate {
                    operation: descriptor.operation,
                    path: descriptor.path,
                });
            }
            if entries.insert(descriptor.operation, descriptor).is_some() {
                return Err(RegistryError::Duplicate(descriptor.operation));
            }
        }
        Ok(Self { entries })
    }

    /// Registry holding the full standard endpoint table.
    ///
    /// # Errors
    /// Fails only if the standard table itself is inconsistent.
    pub fn standard() -> Result<Self, RegistryError> {
        Self::new(standard::all())
    }

    pub fn get(&self, operation: Operation) -> Option<&EndpointDescriptor> {
        self.entries.get(&operation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.entries.values()
    }
}

/// The standard endpoint table of the engine's REST API
pub mod standard {
    use serde_json::{Map, Value};

    use crate::endpoint::{
        Endpoint, EndpointDescriptor, HttpVerb, Operation, RequestShape, ResponseShape,
    };
    use crate::models::{RuleSummary, ServerInfo, StreamDefinition};

    /// JSON object responses and request bodies
    pub type JsonObject = Map<String, Value>;

    // Overview
    pub const GET_SERVER_INFO: Endpoint<(), ServerInfo> = Endpoint::new(
        Operation::GetServerInfo,
        HttpVerb::Get,
        "",
        0,
        RequestShape::Empty,
        ResponseShape::Record,
    );
    pub const PING: Endpoint<(), String> = Endpoint::new(
        Operation::Ping,
        HttpVerb::Get,
        "ping",
        0,
        RequestShape::Empty,
        ResponseShape::Scalar,
    );

    // Streams
    pub const CREATE_STREAM: Endpoint<StreamDefinition, String> = Endpoint::new(
        Operation::CreateStream,
        HttpVerb::Post,
        "/streams",
        0,
        RequestShape::Json,
        ResponseShape::Scalar,
    );
    pub const LIST_STREAMS: Endpoint<(), Vec<String>> = Endpoint::new(
        Operation::ListStreams,
        HttpVerb::Get,
        "/streams",
        0,
        RequestShape::Empty,
        ResponseShape::Sequence(&ResponseShape::Scalar),
    );
    pub const GET_STREAM_DETAILS: Endpoint<(), Value> = Endpoint::new(
        Operation::GetStreamDetails,
        HttpVerb::Get,
        "/streams/{id}",
        1,
        RequestShape::Empty,
        ResponseShape::Record,
    );
    pub const GET_STREAM_SCHEMA: Endpoint<(), Value> = Endpoint::new(
        Operation::GetStreamSchema,
        HttpVerb::Get,
        "/streams/{id}/schema",
        1,
        RequestShape::Empty,
        ResponseShape::Record,
    );
    pub const UPDATE_STREAM: Endpoint<StreamDefinition, String> = Endpoint::new(
        Operation::UpdateStream,
        HttpVerb::Put,
        "/streams/{id}",
        1,
        RequestShape::Json,
        ResponseShape::Scalar,
    );
    pub const DELETE_STREAM: Endpoint<(), String> = Endpoint::new(
        Operation::DeleteStream,
        HttpVerb::Delete,
        "/streams/{id}",
        1,
        RequestShape::Empty,
        ResponseShape::Scalar,
    );

    // Connections
    pub const CREATE_CONNECTION: Endpoint<Value, String> = Endpoint::new(
        Operation::CreateConnection,
        HttpVerb::Post,
        "/connections",
        0,
        RequestShape::Json,
        ResponseShape::Scalar,
    );
    pub const UPDATE_CONNECTION: Endpoint<Value, String> = Endpoint::new(
        Operation::UpdateConnection,
        HttpVerb::Put,
        "/connection/{id}",
        1,
        RequestShape::Json,
        ResponseShape::Scalar,
    );
    pub const LIST_CONNECTIONS: Endpoint<(), Vec<JsonObject>> = Endpoint::new(
        Operation::ListConnections,
        HttpVerb::Get,
        "/connections",
        0,
        RequestShape::Empty,
        ResponseShape::Sequence(&ResponseShape::Record),
    );
    pub const GET_CONNECTION_INFO: Endpoint<(), JsonObject> = Endpoint::new(
        Operation::GetConnectionInfo,
        HttpVerb::Get,
        "/connections/{id}",
        1,
        RequestShape::Empty,
        ResponseShape::Record,
    );
    pub const DELETE_CONNECTION: Endpoint<(), String> = Endpoint::new(
        Operation::DeleteConnection,
        HttpVerb::Delete,
        "/connections/{id}",
        1,
        RequestShape::Empty,
        ResponseShape::Scalar,
    );
    pub const SINK_CONNECTION_CHECK: Endpoint<JsonObject, String> = Endpoint::new(
        Operation::SinkConnectionCheck,
        HttpVerb::Post,
        "/metadata/sinks/connection/{type}",
        1,
        RequestShape::Json,
        ResponseShape::Scalar,
    );
    pub const SOURCE_CONNECTION_CHECK: Endpoint<JsonObject, String> = Endpoint::new(
        Operation::SourceConnectionCheck,
        HttpVerb::Post,
        "/metadata/source/connection/{type}",
        1,
        RequestShape::Json,
        ResponseShape::Scalar,
    );
    pub const MQTT_SOURCE_CONNECTION_CHECK: Endpoint<JsonObject, ()> = Endpoint::new(
        Operation::MqttSourceConnectionCheck,
        HttpVerb::Post,
        "/metadata/source/connection/mqtt",
        0,
        RequestShape::Json,
        ResponseShape::Unit,
    );

    // MQTT configuration keys
    pub const CONF_LIST_MQTT_SOURCES: Endpoint<(), Map<String, Value>> = Endpoint::new(
        Operation::ListMqttSourceConfigs,
        HttpVerb::Get,
        "/metadata/sources/yaml/mqtt",
        0,
        RequestShape::Empty,
        ResponseShape::Mapping(&ResponseShape::Record),
    );
    pub const CONF_DELETE_MQTT_BROKER: Endpoint<(), ()> = Endpoint::new(
        Operation::DeleteMqttBrokerConfig,
        HttpVerb::Delete,
        "/metadata/sources/mqtt/confKeys/{confKey}",
        1,
        RequestShape::Empty,
        ResponseShape::Unit,
    );
    pub const CONF_CREATE_MQTT_BROKER: Endpoint<JsonObject, ()> = Endpoint::new(
        Operation::CreateMqttBrokerConfig,
        HttpVerb::Put,
        "/metadata/sources/mqtt/confKeys/{confKey}",
        1,
        RequestShape::Json,
        ResponseShape::Unit,
    );

    // Rules
    pub const CREATE_RULE: Endpoint<Value, String> = Endpoint::new(
        Operation::CreateRule,
        HttpVerb::Post,
        "/rules",
        0,
        RequestShape::Json,
        ResponseShape::Scalar,
    );
    pub const LIST_RULES: Endpoint<(), Vec<RuleSummary>> = Endpoint::new(
        Operation::ListRules,
        HttpVerb::Get,
        "/rules",
        0,
        RequestShape::Empty,
        ResponseShape::Sequence(&ResponseShape::Record),
    );
    pub const GET_RULE: Endpoint<(), Value> = Endpoint::new(
        Operation::GetRule,
        HttpVerb::Get,
        "/rules/{id}",
        1,
        RequestShape::Empty,
        ResponseShape::Record,
    );
    pub const UPDATE_RULE: Endpoint<Value, String> = Endpoint::new(
        Operation::UpdateRule,
        HttpVerb::Put,
        "/rules/{id}",
        1,
        RequestShape::Json,
        ResponseShape::Scalar,
    );
    pub const DELETE_RULE: Endpoint<(), String> = Endpoint::new(
        Operation::DeleteRule,
        HttpVerb::Delete,
        "/rules/{id}",
        1,
        RequestShape::Empty,
        ResponseShape::Scalar,
    );
    pub const START_RULE: Endpoint<(), String> = Endpoint::new(
        Operation::StartRule,
        HttpVerb::Post,
        "/rules/{id}/start",
        1,
        RequestShape::Empty,
        ResponseShape::Scalar,
    );
    pub const STOP_RULE: Endpoint<(), String> = Endpoint::new(
        Operation::StopRule,
        HttpVerb::Post,
        "/rules/{id}/stop",
        1,
        RequestShape::Empty,
        ResponseShape::Scalar,
    );
    pub const RESTART_RULE: Endpoint<(), String> = Endpoint::new(
        Operation::RestartRule,
        HttpVerb::Post,
        "/rules/{id}/restart",
        1,
        RequestShape::Empty,
        ResponseShape::Scalar,
    );
    pub const GET_RULE_STATUS: Endpoint<(), Value> = Endpoint::new(
        Operation::GetRuleStatus,
        HttpVerb::Get,
        "/rules/{id}/status",
        1,
        RequestShape::Empty,
        ResponseShape::Record,
    );
    pub const GET_ALL_RULES_STATUS: Endpoint<(), Map<String, Value>> = Endpoint::new(
        Operation::GetAllRulesStatus,
        HttpVerb::Get,
        "/rules/status/all",
        0,
        RequestShape::Empty,
        ResponseShape::Mapping(&ResponseShape::Record),
    );
    pub const VALIDATE_RULE: Endpoint<Value, String> = Endpoint::new(
        Operation::ValidateRule,
        HttpVerb::Post,
        "/rules/validate",
        0,
        RequestShape::Json,
        ResponseShape::Scalar,
    );
    pub const EXPLAIN_RULE: Endpoint<(), String> = Endpoint::new(
        Operation::ExplainRule,
        HttpVerb::Get,
        "/rules/{id}/explain",
        1,
        RequestShape::Empty,
        ResponseShape::Scalar,
    );
    pub const GET_RULES_CPU_USAGE: Endpoint<(), String> = Endpoint::new(
        Operation::GetRulesCpuUsage,
        HttpVerb::Get,
        "/rules/usage/cpu",
        0,
        RequestShape::Empty,
        ResponseShape::Scalar,
    );

    /// Every standard descriptor, in table order.
    pub fn all() -> Vec<EndpointDescriptor> {
        vec![
            *GET_SERVER_INFO.descriptor(),
            *PING.descriptor(),
            *CREATE_STREAM.descriptor(),
            *LIST_STREAMS.descriptor(),
            *GET_STREAM_DETAILS.descriptor(),
            *GET_STREAM_SCHEMA.descriptor(),
            *UPDATE_STREAM.descriptor(),
            *DELETE_STREAM.descriptor(),
            *CREATE_CONNECTION.descriptor(),
            *UPDATE_CONNECTION.descriptor(),
            *LIST_CONNECTIONS.descriptor(),
            *GET_CONNECTION_INFO.descriptor(),
            *DELETE_CONNECTION.descriptor(),
            *SINK_CONNECTION_CHECK.descriptor(),
            *SOURCE_CONNECTION_CHECK.descriptor(),
            *MQTT_SOURCE_CONNECTION_CHECK.descriptor(),
            *CONF_LIST_MQTT_SOURCES.descriptor(),
            *CONF_DELETE_MQTT_BROKER.descriptor(),
            *CONF_CREATE_MQTT_BROKER.descriptor(),
            *CREATE_RULE.descriptor(),
            *LIST_RULES.descriptor(),
            *GET_RULE.descriptor(),
            *UPDATE_RULE.descriptor(),
            *DELETE_RULE.descriptor(),
            *START_RULE.descriptor(),
            *STOP_RULE.descriptor(),
            *RESTART_RULE.descriptor(),
            *GET_RULE_STATUS.descriptor(),
            *GET_ALL_RULES_STATUS.descriptor(),
            *VALIDATE_RULE.descriptor(),
            *EXPLAIN_RULE.descriptor(),
            *GET_RULES_CPU_USAGE.descriptor(),
        ]
    }
}
