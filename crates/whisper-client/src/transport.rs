//! JSON-RPC transport over HTTP POST.
//!
//! One request per call, no retries. Non-200 status, network failure and
//! undecodable bodies all surface as `TransportError` with the method and
//! raw body attached.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use whisper_protocol::{IncomingResponse, Method, OutgoingCall, ResponseEnvelope};

use crate::config::NodeSection;
use crate::TransportError;

/// Ceiling for a single HTTP exchange, independent of any read timeout.
pub const REQUEST_CEILING: Duration = Duration::from_secs(180);

/// Sends one JSON-RPC call and classifies the response.
pub trait Transport: Send + Sync {
    /// `timeout` is capped at the transport's own per-request ceiling.
    fn send(
        &self,
        method: Method,
        params: Vec<Value>,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<IncomingResponse, TransportError>> + Send;
}

/// Transport backed by a reusable `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    ceiling: Duration,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::with_ceiling(url, REQUEST_CEILING)
    }

    pub fn with_ceiling(url: impl Into<String>, ceiling: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(ceiling)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self {
            client,
            url: url.into(),
            ceiling,
        })
    }

    pub fn from_config(node: &NodeSection) -> Result<Self, TransportError> {
        Self::with_ceiling(
            node.url.clone(),
            Duration::from_secs(node.request_timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        params: Vec<Value>,
        timeout: Option<Duration>,
    ) -> Result<IncomingResponse, TransportError> {
        let call = OutgoingCall::new(method, params);
        let body = serde_json::to_vec(&call).map_err(|source| TransportError::Encode { method, source })?;

        tracing::debug!(%method, id = call.id(), url = %self.url, "sending rpc call");

        let timeout = timeout.map_or(self.ceiling, |t| t.min(self.ceiling));
        let resp = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .body(body)
            .send()
            .await
            .map_err(|source| TransportError::Network { method, source })?;

        let status = resp.status();
        let content = resp
            .bytes()
            .await
            .map_err(|source| TransportError::Network { method, source })?;

        if status != reqwest::StatusCode::OK {
            return Err(TransportError::Status {
                method,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&content).into_owned(),
            });
        }

        decode_response(method, call.id(), &content)
    }
}

/// Decode a 200 response body for `method`.
///
/// The echoed id is not enforced; a mismatch is only logged.
pub fn decode_response(
    method: Method,
    request_id: &str,
    body: &[u8],
) -> Result<IncomingResponse, TransportError> {
    let decode_err = |source| TransportError::Decode {
        method,
        source,
        body: String::from_utf8_lossy(body).into_owned(),
    };

    let envelope = ResponseEnvelope::from_slice(body).map_err(decode_err)?;

    if !envelope.id_matches(request_id) {
        tracing::debug!(%method, request_id, response_id = ?envelope.id, "response id does not match request");
    }

    if let Some(err) = &envelope.error {
        return Err(TransportError::Rpc {
            method,
            code: err.code,
            message: err.message.clone(),
        });
    }

    let response = envelope.into_response().map_err(decode_err)?;
    tracing::trace!(%method, kind = response.kind(), "decoded rpc response");
    Ok(response)
}

/// Publish a message. `params` are built by the caller; the result is not consumed.
pub async fn post_message<T: Transport>(
    transport: &T,
    params: Vec<Value>,
    timeout: Option<Duration>,
) -> crate::Result<()> {
    let response = transport.send(Method::Post, params, timeout).await?;
    tracing::debug!(kind = response.kind(), "posted whisper message");
    Ok(())
}
