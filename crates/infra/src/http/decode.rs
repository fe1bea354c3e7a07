//! Response decoding
//!
//! Bodies are first checked against the endpoint's [`ResponseShape`] and
//! then deserialized into the caller's type.

use ekuiper_domain::{KuiperError, ResponseShape, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode `body` according to `shape`.
///
/// `Scalar` responses fall back to the raw text when the body is not JSON
/// or does not fit the target type, since the engine answers many mutations
/// with a bare sentence.
///
/// # Errors
/// Returns `KuiperError::Decode` when the body does not match the shape or
/// the target type.
pub fn decode_response<T: DeserializeOwned>(shape: ResponseShape, body: &str) -> Result<T> {
    if shape == ResponseShape::Unit {
        return from_value(Value::Null, shape);
    }

    let parsed = parse_body(body);

    if shape == ResponseShape::Scalar {
        if let Ok(value) = &parsed {
            if conforms(shape, value) {
                if let Ok(decoded) = serde_json::from_value::<T>(value.clone()) {
                    return Ok(decoded);
                }
            }
        }
        return from_value(Value::String(body.to_string()), shape);
    }

    let value = parsed.map_err(|e| {
        KuiperError::Decode(format!("expected {shape} but body is not valid JSON: {e}"))
    })?;
    if !conforms(shape, &value) {
        return Err(KuiperError::Decode(format!(
            "expected {shape} but got {}",
            describe(&value)
        )));
    }
    from_value(value, shape)
}

fn parse_body(body: &str) -> std::result::Result<Value, serde_json::Error> {
    if body.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str(body)
    }
}

fn from_value<T: DeserializeOwned>(value: Value, shape: ResponseShape) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| KuiperError::Decode(format!("failed to decode {shape} response: {e}")))
}

/// Structural check of `value` against `shape`.
pub fn conforms(shape: ResponseShape, value: &Value) -> bool {
    match shape {
        ResponseShape::Unit => true,
        ResponseShape::Scalar => matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)),
        ResponseShape::Sequence(inner) => match value {
            Value::Array(items) => items.iter().all(|item| conforms(*inner, item)),
            _ => false,
        },
        ResponseShape::Mapping(inner) => match value {
            Value::Object(entries) => entries.values().all(|item| conforms(*inner, item)),
            _ => false,
        },
        ResponseShape::Record => value.is_object(),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ekuiper_domain::{RuleSummary, ServerInfo};
    use serde_json::json;

    use super::*;

    #[test]
    fn scalar_accepts_plain_text() {
        let text: String =
            decode_response(ResponseShape::Scalar, "Stream demo is created.").unwrap();
        assert_eq!(text, "Stream demo is created.");
    }

    #[test]
    fn scalar_unquotes_json_string() {
        let text: String = decode_response(ResponseShape::Scalar, r#""pong""#).unwrap();
        assert_eq!(text, "pong");
    }

    #[test]
    fn scalar_number() {
        let usage: f64 = decode_response(ResponseShape::Scalar, "12.5").unwrap();
        assert!((usage - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn scalar_object_body_kept_as_text() {
        let text: String = decode_response(ResponseShape::Scalar, r#"{"r1":0.3}"#).unwrap();
        assert_eq!(text, r#"{"r1":0.3}"#);
    }

    #[test]
    fn unit_ignores_body() {
        decode_response::<()>(ResponseShape::Unit, "anything at all").unwrap();
        decode_response::<()>(ResponseShape::Unit, "").unwrap();
    }

    #[test]
    fn sequence_of_scalars() {
        let streams: Vec<String> =
            decode_response(ResponseShape::Sequence(&ResponseShape::Scalar), r#"["a","b"]"#).unwrap();
        assert_eq!(streams, vec!["a", "b"]);
    }

    #[test]
    fn sequence_of_records() {
        let rules: Vec<RuleSummary> = decode_response(
            ResponseShape::Sequence(&ResponseShape::Record),
            r#"[{"id":"r1","status":"running"},{"id":"r2","status":"stopped"}]"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[1].status, "stopped");
    }

    #[test]
    fn sequence_rejects_mixed_elements() {
        let err = decode_response::<Vec<Value>>(
            ResponseShape::Sequence(&ResponseShape::Record),
            r#"[{"id":"r1"}, "oops"]"#,
        )
        .unwrap_err();
        assert!(matches!(err, KuiperError::Decode(_)));
    }

    #[test]
    fn mapping_of_records() {
        let statuses: BTreeMap<String, Value> = decode_response(
            ResponseShape::Mapping(&ResponseShape::Record),
            r#"{"r1":{"status":"running"},"r2":{"status":"stopped"}}"#,
        )
        .unwrap();
        assert_eq!(statuses["r1"], json!({"status": "running"}));
    }

    #[test]
    fn record_rejects_array() {
        let err = decode_response::<Value>(ResponseShape::Record, "[1,2]").unwrap_err();
        assert_eq!(err.to_string(), "Failed to decode response: expected record but got array");
    }

    #[test]
    fn record_rejects_text() {
        let err = decode_response::<Value>(ResponseShape::Record, "not json").unwrap_err();
        assert!(matches!(err, KuiperError::Decode(_)));
    }

    #[test]
    fn record_missing_field_is_decode_failure() {
        let err = decode_response::<ServerInfo>(ResponseShape::Record, r#"{"os":"linux"}"#)
            .unwrap_err();
        assert!(matches!(err, KuiperError::Decode(_)));
    }

    #[test]
    fn empty_body_for_record_is_decode_failure() {
        let err = decode_response::<Value>(ResponseShape::Record, "").unwrap_err();
        assert!(err.to_string().contains("got null"));
    }
}
