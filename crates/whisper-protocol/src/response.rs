//! Response envelope and result classification.
//!
//! The node answers every method with `{jsonrpc, id, result}` where `result`
//! may be a message array, a bool, a string, or anything else (including null).
//! Classification is an ordered match on the JSON kind of `result`:
//!
//!   1. array  -> Multi   (every element must decode as a message)
//!   2. bool   -> Bool
//!   3. string -> Str
//!   4. other  -> Generic (null/absent included)
//!
//! A stricter shape always wins over the fallback, so a bool result can never
//! be absorbed by Generic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::{RawMessage, WhisperMessage};
use crate::ProtocolError;

/// Error object a JSON-RPC server may return instead of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Raw response envelope, before `result` is classified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Echoed correlation id. Not validated against the request.
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl ResponseEnvelope {
    /// Parse a response body. Anything other than a JSON object is rejected.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(ProtocolError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// True if the echoed id equals `expected`.
    pub fn id_matches(&self, expected: &str) -> bool {
        matches!(&self.id, Some(Value::String(id)) if id == expected)
    }

    /// Classify `result` into exactly one variant.
    pub fn into_response(self) -> Result<IncomingResponse, ProtocolError> {
        IncomingResponse::classify(self.result.unwrap_or(Value::Null))
    }
}

/// A decoded response, one variant per result shape.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingResponse {
    Multi(Vec<WhisperMessage>),
    Bool(bool),
    Str(String),
    /// Fallback for every other shape. `Value::Null` when the result was
    /// null or absent.
    Generic(Value),
}

impl IncomingResponse {
    /// Decode a full response body (envelope + classification).
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        ResponseEnvelope::from_slice(body)?.into_response()
    }

    /// Classify a bare `result` value. Arm order is the decode priority.
    pub fn classify(result: Value) -> Result<Self, ProtocolError> {
        match result {
            Value::Array(items) => {
                let mut messages = Vec::with_capacity(items.len());
                for item in items {
                    let raw: RawMessage = serde_json::from_value(item)
                        .map_err(|e| ProtocolError::MalformedBatch(e.to_string()))?;
                    messages.push(WhisperMessage::try_from(raw)?);
                }
                Ok(IncomingResponse::Multi(messages))
            }
            Value::Bool(b) => Ok(IncomingResponse::Bool(b)),
            Value::String(s) => Ok(IncomingResponse::Str(s)),
            other => Ok(IncomingResponse::Generic(other)),
        }
    }

    /// Null/absent result. On `shh_getMessages` this means the filter expired.
    pub fn is_null(&self) -> bool {
        matches!(self, IncomingResponse::Generic(Value::Null))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            IncomingResponse::Multi(_) => "multi",
            IncomingResponse::Bool(_) => "bool",
            IncomingResponse::Str(_) => "string",
            IncomingResponse::Generic(_) => "generic",
        }
    }
}
