//! Poll loop -- blocking retrieval of new messages for one topic set.
//!
//! States:
//!   NoFilter -> AwaitingFilter -> Polling -> (TimedOut | done)
//!
//! Three different things mean "nothing to return yet" and none of them is an
//! error: an empty poll (sleep and poll again), a null poll result (the node
//! dropped our filter, recreate it), and the read timeout (return empty).
//!
//! A `Reader` keeps its filter id and dedup cache across `read` calls, so a
//! message handed out once is not handed out again while its hash is retained.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;
use whisper_protocol::{IncomingResponse, Method, Topic, WhisperMessage};

use crate::config::ReaderConfig;
use crate::dedup::DedupCache;
use crate::filter::{Filter, FilterManager};
use crate::transport::{HttpTransport, Transport};
use crate::{ClientError, Result};

/// Overall budget for one `read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTimeout {
    /// Poll until a message arrives.
    Never,
    After(Duration),
}

impl ReadTimeout {
    /// Seconds as configured; any negative value (conventionally -1) means never.
    pub fn from_secs(secs: i64) -> Self {
        match u64::try_from(secs) {
            Ok(secs) => ReadTimeout::After(Duration::from_secs(secs)),
            Err(_) => ReadTimeout::Never,
        }
    }

    fn exceeded(&self, elapsed: Duration) -> bool {
        match self {
            ReadTimeout::Never => false,
            ReadTimeout::After(limit) => elapsed > *limit,
        }
    }
}

/// How a read ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Non-empty batch of new messages.
    Messages(Vec<WhisperMessage>),
    /// Read timeout exhausted with nothing new.
    TimedOut,
    /// Shutdown signal received before anything new arrived.
    Cancelled,
}

impl ReadOutcome {
    pub fn into_messages(self) -> Vec<WhisperMessage> {
        match self {
            ReadOutcome::Messages(msgs) => msgs,
            ReadOutcome::TimedOut | ReadOutcome::Cancelled => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    NoFilter,
    AwaitingFilter,
    Polling,
    TimedOut,
}

/// Result of a single `shh_getMessages` call.
enum Poll {
    Expired,
    Batch(Vec<WhisperMessage>),
}

/// Unix seconds.
pub type Clock = fn() -> i64;

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub struct Reader<T> {
    transport: T,
    filters: FilterManager,
    filter: Option<Filter>,
    cache: DedupCache,
    clock: Clock,
    request_timeout: Option<Duration>,
}

impl Reader<HttpTransport> {
    /// Build an HTTP-backed reader from config.
    pub fn from_config(cfg: &ReaderConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(&cfg.node)?;
        Self::new(transport, cfg.reader.topics())
    }
}

impl<T: Transport> Reader<T> {
    pub fn new(transport: T, topics: Vec<Topic>) -> Result<Self> {
        Ok(Self {
            transport,
            filters: FilterManager::new(topics)?,
            filter: None,
            cache: DedupCache::new(),
            clock: unix_now,
            request_timeout: None,
        })
    }

    /// Replace the clock used for dedup expiry.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Per-call HTTP timeout (still capped by the transport ceiling).
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self.filters = self.filters.with_timeout(timeout);
        self
    }

    pub fn topics(&self) -> &[Topic] {
        self.filters.topics()
    }

    /// Current filter id, if one is live.
    pub fn filter_id(&self) -> Option<&str> {
        self.filter.as_ref().map(|f| f.id.as_str())
    }

    pub fn known_hashes(&self) -> usize {
        self.cache.len()
    }

    /// Block until new messages arrive or `timeout` passes.
    ///
    /// Returns an empty batch on timeout.
    pub async fn read(
        &mut self,
        poll_interval: Duration,
        timeout: ReadTimeout,
    ) -> Result<Vec<WhisperMessage>> {
        Ok(self.run(poll_interval, timeout).await?.into_messages())
    }

    /// Like `read`, but also stops when `shutdown` fires.
    ///
    /// Cancellation interrupts an in-flight call or sleep. Filter and dedup
    /// state stay consistent; the next read resumes from them.
    pub async fn read_until(
        &mut self,
        poll_interval: Duration,
        timeout: ReadTimeout,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<ReadOutcome> {
        tokio::select! {
            outcome = self.run(poll_interval, timeout) => outcome,
            _ = shutdown.recv() => {
                tracing::info!("whisper read cancelled");
                Ok(ReadOutcome::Cancelled)
            }
        }
    }

    async fn run(&mut self, poll_interval: Duration, timeout: ReadTimeout) -> Result<ReadOutcome> {
        tracing::debug!(?poll_interval, ?timeout, "polling for incoming whisper messages");

        let start = Instant::now();
        let mut state = if self.filter.is_some() {
            ReaderState::Polling
        } else {
            ReaderState::NoFilter
        };

        loop {
            state = match state {
                ReaderState::NoFilter => ReaderState::AwaitingFilter,
                ReaderState::AwaitingFilter => {
                    self.filter = Some(self.filters.create(&self.transport).await?);
                    ReaderState::Polling
                }
                ReaderState::Polling => {
                    if timeout.exceeded(start.elapsed()) {
                        ReaderState::TimedOut
                    } else {
                        match self.poll_once().await? {
                            Poll::Expired => {
                                if let Some(old) = self.filter.take() {
                                    tracing::warn!(filter_id = %old.id, "whisper filter expired, recreating");
                                }
                                tokio::time::sleep(poll_interval).await;
                                ReaderState::NoFilter
                            }
                            Poll::Batch(msgs) if !msgs.is_empty() => {
                                tracing::debug!(count = msgs.len(), "received new whisper messages");
                                return Ok(ReadOutcome::Messages(msgs));
                            }
                            Poll::Batch(_) => {
                                tracing::trace!(?poll_interval, "no new messages, sleeping");
                                tokio::time::sleep(poll_interval).await;
                                ReaderState::Polling
                            }
                        }
                    }
                }
                ReaderState::TimedOut => {
                    tracing::info!("read timeout exceeded, ending whisper poll loop");
                    return Ok(ReadOutcome::TimedOut);
                }
            };
        }
    }

    async fn poll_once(&mut self) -> Result<Poll> {
        let filter_id = match &self.filter {
            Some(filter) => filter.id.clone(),
            None => return Ok(Poll::Expired),
        };

        let response = self
            .transport
            .send(
                Method::GetMessages,
                whisper_protocol::wrap_param(filter_id),
                self.request_timeout,
            )
            .await?;

        match response {
            IncomingResponse::Multi(batch) => {
                let now = (self.clock)();
                Ok(Poll::Batch(self.cache.purge_and_filter(batch, now)))
            }
            other if other.is_null() => Ok(Poll::Expired),
            other => Err(ClientError::unexpected(Method::GetMessages, "multi", &other)),
        }
    }
}
