//! Whisper Client -- polling retrieval engine for Whisper JSON-RPC nodes.
//!
//! Reader -> FilterManager (lazily) -> Transport -> DedupCache -> caller.
//! One `Reader` per topic set; readers share no mutable state.

pub mod config;
pub mod dedup;
pub mod filter;
pub mod identity;
pub mod reader;
pub mod transport;

use std::path::PathBuf;

use whisper_protocol::{Method, ProtocolError};

pub use config::ReaderConfig;
pub use dedup::DedupCache;
pub use filter::{Filter, FilterManager};
pub use identity::{ensure_identity, has_identity, new_identity, IdentitySource, StaticIdentity};
pub use reader::{ReadOutcome, ReadTimeout, Reader};
pub use transport::{post_message, HttpTransport, Transport};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to encode {method} call: {source}")]
    Encode {
        method: Method,
        source: serde_json::Error,
    },
    #[error("rpc call {method} failed: {source}")]
    Network {
        method: Method,
        source: reqwest::Error,
    },
    #[error("rpc call {method} returned non-OK status {status}: {body}")]
    Status {
        method: Method,
        status: u16,
        body: String,
    },
    #[error("could not decode {method} response ({source}). Returned content: {body}")]
    Decode {
        method: Method,
        source: ProtocolError,
        body: String,
    },
    #[error("rpc call {method} failed [{code}]: {message}")]
    Rpc {
        method: Method,
        code: i64,
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected {got} response to {method}, expected {expected}: {detail}")]
    Classification {
        method: Method,
        expected: &'static str,
        got: &'static str,
        detail: String,
    },
    #[error("no returned value from {0}, cannot proceed")]
    EmptyResult(Method),
    #[error("cannot create a filter without topics")]
    EmptyTopics,
    #[error("identity source failed: {0}")]
    Identity(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Build a classification error for a response of the wrong shape.
    pub(crate) fn unexpected(
        method: Method,
        expected: &'static str,
        response: &whisper_protocol::IncomingResponse,
    ) -> Self {
        ClientError::Classification {
            method,
            expected,
            got: response.kind(),
            detail: format!("{response:?}"),
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs_or_home() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn dirs_or_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
