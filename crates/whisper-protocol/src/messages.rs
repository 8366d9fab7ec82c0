//! Wire message types: outgoing calls, retrieved messages, topics.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ProtocolError, CORRELATION_ID_LEN, HEX_PREFIX, JSONRPC_VERSION, TTL_RETENTION_FACTOR};

// ============================================================================
// Methods
// ============================================================================

/// RPC methods consumed from the node. Wire names are protocol constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "shh_hasIdentity")]
    HasIdentity,
    #[serde(rename = "shh_newIdentity")]
    NewIdentity,
    #[serde(rename = "shh_post")]
    Post,
    #[serde(rename = "shh_newFilter")]
    NewFilter,
    #[serde(rename = "shh_getMessages")]
    GetMessages,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::HasIdentity => "shh_hasIdentity",
            Method::NewIdentity => "shh_newIdentity",
            Method::Post => "shh_post",
            Method::NewFilter => "shh_newFilter",
            Method::GetMessages => "shh_getMessages",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Outgoing call
// ============================================================================

/// A single JSON-RPC request. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingCall {
    jsonrpc: &'static str,
    id: String,
    method: Method,
    params: Vec<Value>,
}

impl OutgoingCall {
    /// Build a call with a fresh correlation id.
    pub fn new(method: Method, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: correlation_id(),
            method,
            params,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Random alphanumeric token used as the JSON-RPC `id`.
fn correlation_id() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(CORRELATION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Wrap a single value as a positional param list.
pub fn wrap_param(param: impl Into<Value>) -> Vec<Value> {
    vec![param.into()]
}

// ============================================================================
// Retrieved messages
// ============================================================================

/// One message returned by `shh_getMessages`.
///
/// `payload` holds the raw bytes; on the wire it is `0x` + hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage", into = "RawMessage")]
pub struct WhisperMessage {
    /// Transport-assigned content identifier.
    pub hash: String,
    /// Lifetime in seconds.
    pub ttl: i64,
    /// Unix seconds.
    pub sent: i64,
    pub from: String,
    pub to: String,
    pub payload: Vec<u8>,
}

impl WhisperMessage {
    /// Instant after which the dedup cache may forget this hash.
    pub fn retain_until(&self) -> i64 {
        self.sent
            .saturating_add(self.ttl.saturating_mul(TTL_RETENTION_FACTOR))
    }
}

/// Wire form of `WhisperMessage` before the payload is decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub hash: String,
    pub ttl: i64,
    pub sent: i64,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    pub payload: String,
}

impl TryFrom<RawMessage> for WhisperMessage {
    type Error = ProtocolError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let payload = decode_hex(&raw.payload).map_err(|reason| ProtocolError::InvalidPayload {
            hash: raw.hash.clone(),
            reason,
        })?;
        Ok(Self {
            hash: raw.hash,
            ttl: raw.ttl,
            sent: raw.sent,
            from: raw.from,
            to: raw.to,
            payload,
        })
    }
}

impl From<WhisperMessage> for RawMessage {
    fn from(msg: WhisperMessage) -> Self {
        Self {
            hash: msg.hash,
            ttl: msg.ttl,
            sent: msg.sent,
            from: msg.from,
            to: msg.to,
            payload: encode_hex(&msg.payload),
        }
    }
}

// ============================================================================
// Topics
// ============================================================================

/// A topic as sent to the node (already encoded).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Wrap a value the caller has already encoded.
    pub fn raw(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encode arbitrary bytes as `0x` + hex.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(encode_hex(bytes))
    }

    /// Encode a text topic, e.g. "micropayment".
    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Hex helpers
// ============================================================================

/// `0x` + lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("{HEX_PREFIX}{}", hex::encode(bytes))
}

/// Strip the `0x` marker and decode the remainder.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, String> {
    let digits = s
        .strip_prefix(HEX_PREFIX)
        .ok_or_else(|| format!("missing {HEX_PREFIX} marker"))?;
    hex::decode(digits).map_err(|e| e.to_string())
}
