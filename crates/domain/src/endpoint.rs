//! Endpoint descriptors
//!
//! An endpoint is static metadata for one remote operation: the verb, a path
//! template with ordered `{placeholder}` segments, the number of path
//! variables callers must supply, and the shapes of the request and response
//! bodies. Descriptors are `const`-constructible and never mutated.

use std::fmt;
use std::marker::PhantomData;

use crate::errors::{KuiperError, Result};

/// HTTP verb of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an endpoint accepts a request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    Empty,
    Json,
}

/// Structural shape of a response body, checked before typed decoding.
///
/// Exactly one of the variants applies; nesting is expressed through the
/// element shape of `Sequence` and `Mapping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Body is ignored
    Unit,
    /// String, number or boolean. Plain-text bodies are accepted as strings.
    Scalar,
    /// JSON array whose elements all have the inner shape
    Sequence(&'static ResponseShape),
    /// JSON object with unique string keys whose values have the inner shape
    Mapping(&'static ResponseShape),
    /// JSON object decoded into a record type
    Record,
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => f.write_str("unit"),
            Self::Scalar => f.write_str("scalar"),
            Self::Sequence(inner) => write!(f, "sequence<{inner}>"),
            Self::Mapping(inner) => write!(f, "mapping<string, {inner}>"),
            Self::Record => f.write_str("record"),
        }
    }
}

/// Logical operation identifiers of the standard endpoint table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    GetServerInfo,
    Ping,

    CreateStream,
    ListStreams,
    GetStreamDetails,
    GetStreamSchema,
    UpdateStream,
    DeleteStream,

    CreateConnection,
    UpdateConnection,
    ListConnections,
    GetConnectionInfo,
    DeleteConnection,
    SinkConnectionCheck,
    SourceConnectionCheck,
    MqttSourceConnectionCheck,

    ListMqttSourceConfigs,
    DeleteMqttBrokerConfig,
    CreateMqttBrokerConfig,

    CreateRule,
    ListRules,
    GetRule,
    UpdateRule,
    DeleteRule,
    StartRule,
    StopRule,
    RestartRule,
    GetRuleStatus,
    GetAllRulesStatus,
    ValidateRule,
    ExplainRule,
    GetRulesCpuUsage,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetServerInfo => "GET_SERVER_INFO",
            Self::Ping => "PING",
            Self::CreateStream => "CREATE_STREAM",
            Self::ListStreams => "LIST_STREAMS",
            Self::GetStreamDetails => "GET_STREAM_DETAILS",
            Self::GetStreamSchema => "GET_STREAM_SCHEMA",
            Self::UpdateStream => "UPDATE_STREAM",
            Self::DeleteStream => "DELETE_STREAM",
            Self::CreateConnection => "CREATE_CONNECTION",
            Self::UpdateConnection => "UPDATE_CONNECTION",
            Self::ListConnections => "LIST_CONNECTIONS",
            Self::GetConnectionInfo => "GET_CONNECTION_INFO",
            Self::DeleteConnection => "DELETE_CONNECTION",
            Self::SinkConnectionCheck => "SINK_CONNECTION_CHECK",
            Self::SourceConnectionCheck => "SOURCE_CONNECTION_CHECK",
            Self::MqttSourceConnectionCheck => "MQTT_SOURCE_CONNECTION_CHECK",
            Self::ListMqttSourceConfigs => "CONF_LIST_MQTT_SOURCES",
            Self::DeleteMqttBrokerConfig => "CONF_DELETE_MQTT_BROKER",
            Self::CreateMqttBrokerConfig => "CONF_CREATE_MQTT_BROKER",
            Self::CreateRule => "CREATE_RULE",
            Self::ListRules => "LIST_RULES",
            Self::GetRule => "GET_RULE",
            Self::UpdateRule => "UPDATE_RULE",
            Self::DeleteRule => "DELETE_RULE",
            Self::StartRule => "START_RULE",
            Self::StopRule => "STOP_RULE",
            Self::RestartRule => "RESTART_RULE",
            Self::GetRuleStatus => "GET_RULE_STATUS",
            Self::GetAllRulesStatus => "GET_ALL_RULES_STATUS",
            Self::ValidateRule => "VALIDATE_RULE",
            Self::ExplainRule => "EXPLAIN_RULE",
            Self::GetRulesCpuUsage => "GET_RULES_CPU_USAGE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Untyped endpoint metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub operation: Operation,
    pub verb: HttpVerb,
    pub path: &'static str,
    pub expected_vars: usize,
    pub request: RequestShape,
    pub response: ResponseShape,
}

impl EndpointDescriptor {
    /// Number of `{...}` placeholders literally present in the path template.
    pub fn placeholder_count(&self) -> usize {
        placeholder_count(self.path)
    }

    /// Fail unless `supplied` matches the declared path-variable count.
    ///
    /// # Errors
    /// Returns `KuiperError::InvalidArgument` on an arity mismatch.
    pub fn check_arity(&self, supplied: usize) -> Result<()> {
        if supplied != self.expected_vars {
            return Err(KuiperError::InvalidArgument(format!(
                "Path variable count mismatch for endpoint {}: expected {} but got {}",
                self.operation, self.expected_vars, supplied
            )));
        }
        Ok(())
    }

    /// Substitute `vars` into the path template, in order of appearance.
    ///
    /// Each variable is passed through `encode` before insertion.
    ///
    /// # Errors
    /// Returns `KuiperError::InvalidArgument` if the arity does not match.
    pub fn expand_path<F>(&self, vars: &[&str], encode: F) -> Result<String>
    where
        F: Fn(&str) -> String,
    {
        self.check_arity(vars.len())?;
        expand_template(self.path, vars, encode).ok_or_else(|| {
            KuiperError::InvalidArgument(format!(
                "Path template for endpoint {} is malformed: {}",
                self.operation, self.path
            ))
        })
    }
}

/// Endpoint descriptor tagged with its request and response types.
///
/// The type parameters exist only at compile time; `Endpoint` is `Copy` and
/// can be declared as a `const`.
pub struct Endpoint<Req, Resp> {
    descriptor: EndpointDescriptor,
    _types: PhantomData<fn() -> (Req, Resp)>,
}

impl<Req, Resp> Endpoint<Req, Resp> {
    pub const fn new(
        operation: Operation,
        verb: HttpVerb,
        path: &'static str,
        expected_vars: usize,
        request: RequestShape,
        response: ResponseShape,
    ) -> Self {
        Self {
            descriptor: EndpointDescriptor {
                operation,
                verb,
                path,
                expected_vars,
                request,
                response,
            },
            _types: PhantomData,
        }
    }

    pub const fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }
}

impl<Req, Resp> Clone for Endpoint<Req, Resp> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Req, Resp> Copy for Endpoint<Req, Resp> {}

impl<Req, Resp> fmt::Debug for Endpoint<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Endpoint").field(&self.descriptor).finish()
    }
}

/// Count `{...}` placeholders in a path template.
pub fn placeholder_count(template: &str) -> usize {
    let mut count = 0;
    let mut open = false;
    for ch in template.chars() {
        match ch {
            '{' if !open => open = true,
            '}' if open => {
                open = false;
                count += 1;
            }
            _ => {}
        }
    }
    count
}

/// Replace placeholders left to right. Returns `None` when the template has
/// an unterminated placeholder or the variable count does not match.
fn expand_template<F>(template: &str, vars: &[&str], encode: F) -> Option<String>
where
    F: Fn(&str) -> String,
{
    let mut out = String::with_capacity(template.len() + vars.iter().map(|v| v.len()).sum::<usize>());
    let mut remaining = vars.iter();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let end = start + rest[start..].find('}')?;
        out.push_str(&rest[..start]);
        out.push_str(&encode(remaining.next()?));
        rest = &rest[end + 1..];
    }
    out.push_str(rest);

    if remaining.next().is_some() {
        return None;
    }
    Some(out)
}
