//! Inbound tool-call extraction and outbound result events.

use serde_json::{json, Map, Value};
use thiserror::Error;

pub const UNKNOWN_CALL_ID: &str = "unknown-call";
const FLAT_TOOL_CALL_TYPE: &str = "response.tool_call";

/// Arguments as they arrived: already an object, or JSON text to decode.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolArguments {
    Encoded(String),
    Decoded(Map<String, Value>),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ArgumentDecodeError {
    #[error("arguments are not valid JSON: {0}")]
    Malformed(String),
    #[error("arguments must be a JSON object")]
    NotAnObject,
}

impl ToolArguments {
    fn from_field(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Decoded(Map::new()),
            Some(Value::Object(map)) => Self::Decoded(map.clone()),
            Some(Value::String(text)) => Self::Encoded(text.clone()),
            // numbers, arrays and booleans fail in resolve() like bad text would
            Some(other) => Self::Encoded(other.to_string()),
        }
    }

    pub fn resolve(self) -> Result<Map<String, Value>, ArgumentDecodeError> {
        match self {
            Self::Decoded(map) => Ok(map),
            Self::Encoded(text) if text.trim().is_empty() => Ok(Map::new()),
            Self::Encoded(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) => Err(ArgumentDecodeError::NotAnObject),
                Err(error) => Err(ArgumentDecodeError::Malformed(error.to_string())),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    pub call_id: String,
    pub name: String,
    pub arguments: ToolArguments,
}

/// The two shapes a tool call may arrive in, tried in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ToolCallEnvelope {
    /// `{"tool_call": {...}}` or `{"call": {...}}`
    Embedded,
    /// `{"type": "response.tool_call", "id", "name", "arguments"}`
    Flat,
}

impl ToolCallEnvelope {
    const ORDER: [ToolCallEnvelope; 2] = [Self::Embedded, Self::Flat];

    fn extract(self, frame: &Map<String, Value>) -> Option<ToolCall> {
        match self {
            Self::Embedded => {
                let body = ["tool_call", "call"]
                    .into_iter()
                    .find_map(|key| frame.get(key).filter(|value| is_truthy(value)))?;
                call_from_fields(body.as_object()?)
            }
            Self::Flat => {
                if frame.get("type").and_then(Value::as_str) != Some(FLAT_TOOL_CALL_TYPE) {
                    return None;
                }
                call_from_fields(frame)
            }
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(text) => !text.is_empty(),
        Value::Number(_) => true,
    }
}

fn call_from_fields(fields: &Map<String, Value>) -> Option<ToolCall> {
    let name = fields.get("name").and_then(Value::as_str).filter(|name| !name.is_empty())?;
    let call_id = match fields.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => UNKNOWN_CALL_ID.to_string(),
    };

    Some(ToolCall {
        call_id,
        name: name.to_string(),
        arguments: ToolArguments::from_field(fields.get("arguments")),
    })
}

/// `None` when the frame carries no tool call; such frames are ignored.
pub fn extract_tool_call(frame: &Value) -> Option<ToolCall> {
    let fields = frame.as_object()?;
    ToolCallEnvelope::ORDER.into_iter().find_map(|shape| shape.extract(fields))
}

pub fn tool_result_event(call_id: &str, output: Value) -> Value {
    json!({
        "type": "tool.result",
        "tool_call_id": call_id,
        "output": output,
    })
}
