//! Filter manager -- creates server-side subscriptions for a topic set.
//!
//! A filter id is a capability token with a lifetime only the node knows.
//! No caching here: every `create` asks the node for a fresh filter.

use std::collections::HashSet;
use std::time::Duration;

use serde_json::json;
use whisper_protocol::{FilterId, IncomingResponse, Method, Topic};

use crate::transport::Transport;
use crate::{ClientError, Result};

/// A live subscription handle and the topics it was created for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub id: FilterId,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone)]
pub struct FilterManager {
    topics: Vec<Topic>,
    timeout: Option<Duration>,
}

impl FilterManager {
    /// Topics must be non-empty. Repeats are dropped, first occurrence wins.
    pub fn new(mut topics: Vec<Topic>) -> Result<Self> {
        if topics.is_empty() {
            return Err(ClientError::EmptyTopics);
        }
        let mut seen = HashSet::new();
        topics.retain(|t| seen.insert(t.clone()));
        Ok(Self {
            topics,
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Params for `shh_newFilter`: `[{"topics": [...]}]`.
    pub fn params(&self) -> Vec<serde_json::Value> {
        vec![json!({ "topics": self.topics })]
    }

    /// Ask the node for a new filter. Expects a non-empty string result.
    pub async fn create<T: Transport>(&self, transport: &T) -> Result<Filter> {
        let response = transport
            .send(Method::NewFilter, self.params(), self.timeout)
            .await?;

        let id = match response {
            IncomingResponse::Str(id) => id,
            other => return Err(ClientError::unexpected(Method::NewFilter, "string", &other)),
        };
        if id.is_empty() {
            return Err(ClientError::Classification {
                method: Method::NewFilter,
                expected: "non-empty string",
                got: "string",
                detail: "empty filter id".into(),
            });
        }

        tracing::info!(filter_id = %id, topics = self.topics.len(), "created whisper filter");
        Ok(Filter {
            id,
            topics: self.topics.clone(),
        })
    }
}
