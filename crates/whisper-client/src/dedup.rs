//! Dedup cache -- suppresses re-delivery of messages already handed out.
//!
//! The node may return the same message on several polls. Each retained hash
//! is remembered until `sent + 2 * ttl`; the extra TTL absorbs clock skew and
//! poll jitter so a hash is never forgotten before the node drops the message.
//!
//! `now` is always passed in, so the cache has no wall-clock dependence.

use std::collections::HashMap;

use whisper_protocol::WhisperMessage;

#[derive(Debug, Clone, Default)]
pub struct DedupCache {
    /// hash -> unix second after which the entry may be purged.
    expires: HashMap<String, i64>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries with `expires_at < now`. Returns how many were removed.
    pub fn purge(&mut self, now: i64) -> usize {
        let before = self.expires.len();
        self.expires.retain(|_, expires_at| *expires_at >= now);
        before - self.expires.len()
    }

    /// Purge, then keep only messages whose hash is unknown, in input order.
    ///
    /// Retained hashes are recorded immediately, so a hash repeated within
    /// one batch is kept once.
    pub fn purge_and_filter(&mut self, batch: Vec<WhisperMessage>, now: i64) -> Vec<WhisperMessage> {
        let purged = self.purge(now);
        let incoming = batch.len();

        let retained: Vec<WhisperMessage> = batch
            .into_iter()
            .filter(|msg| {
                if self.expires.contains_key(&msg.hash) {
                    tracing::trace!(hash = %msg.hash, "dropping known message");
                    return false;
                }
                self.expires.insert(msg.hash.clone(), msg.retain_until());
                tracing::trace!(hash = %msg.hash, "retaining message");
                true
            })
            .collect();

        tracing::debug!(
            incoming,
            retained = retained.len(),
            purged,
            known = self.expires.len(),
            "dedup pass"
        );
        retained
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.expires.contains_key(hash)
    }

    pub fn expires_at(&self, hash: &str) -> Option<i64> {
        self.expires.get(hash).copied()
    }

    pub fn len(&self) -> usize {
        self.expires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expires.is_empty()
    }
}
