//! Whisper Protocol -- JSON-RPC wire types, message decoding, response classification.
//!
//! HTTP POST to the node. One JSON-RPC 2.0 envelope per call.
//! The node reuses the `result` field for several shapes with no discriminator,
//! so responses are classified by the JSON kind of `result` (see `response`).

pub mod messages;
pub mod response;

pub use messages::*;
pub use response::{IncomingResponse, ResponseEnvelope, RpcErrorObject};

/// JSON-RPC protocol version carried by every request.
pub const JSONRPC_VERSION: &str = "2.0";

/// Scheme marker preceding hex-encoded payloads and topics.
pub const HEX_PREFIX: &str = "0x";

/// Length of generated correlation ids.
pub const CORRELATION_ID_LEN: usize = 32;

/// Dedup retention multiplier applied to a message TTL.
pub const TTL_RETENTION_FACTOR: i64 = 2;

/// Opaque server-side filter handle.
pub type FilterId = String;

/// Opaque sender/recipient identity string.
pub type Identity = String;

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("response body is not a JSON-RPC object")]
    NotAnObject,
    #[error("invalid payload for message {hash}: {reason}")]
    InvalidPayload { hash: String, reason: String },
    #[error("malformed message batch: {0}")]
    MalformedBatch(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
