//! Configuration types for a whisper reader.
//! Parsed from TOML, e.g. ~/.whisper/reader.toml.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use whisper_protocol::Topic;

use crate::expand_tilde;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReaderConfig {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub reader: ReaderSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    /// JSON-RPC endpoint of the whisper node.
    #[serde(default = "default_url")]
    pub url: String,
    /// Ceiling for a single HTTP exchange.
    #[serde(default = "default_180")]
    pub request_timeout_secs: u64,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            url: default_url(),
            request_timeout_secs: 180,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderSection {
    /// Already-encoded topics (`0x` + hex), sent as-is.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Plain text topics; hex-encoded before they are sent.
    #[serde(default)]
    pub text_topics: Vec<String>,
    #[serde(default = "default_1000")]
    pub poll_interval_ms: u64,
    /// -1 blocks until a message arrives.
    #[serde(default = "default_no_timeout")]
    pub read_timeout_secs: i64,
}

impl Default for ReaderSection {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            text_topics: Vec::new(),
            poll_interval_ms: 1000,
            read_timeout_secs: -1,
        }
    }
}

impl ReaderSection {
    /// Encoded topics followed by hex-encoded text topics.
    pub fn topics(&self) -> Vec<Topic> {
        self.topics
            .iter()
            .map(|t| Topic::raw(t.as_str()))
            .chain(self.text_topics.iter().map(|t| Topic::from_text(t)))
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn read_timeout(&self) -> crate::ReadTimeout {
        crate::ReadTimeout::from_secs(self.read_timeout_secs)
    }
}

// Default value functions
fn default_url() -> String {
    "http://127.0.0.1:8545".into()
}
fn default_180() -> u64 {
    180
}
fn default_1000() -> u64 {
    1000
}
fn default_no_timeout() -> i64 {
    -1
}

impl ReaderConfig {
    /// Load config from file, or fall back to defaults if missing.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: ReaderConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            tracing::debug!(path = %path.display(), "no reader config, using defaults");
            Ok(Self::default())
        }
    }

    /// Same as `load_or_default`, expanding a leading `~/`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        Self::load_or_default(&expand_tilde(path))
    }
}
