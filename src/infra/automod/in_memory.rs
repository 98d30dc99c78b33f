// In-memory recent-message archive backing the spam rule's window.
//
// Owned by the Discord layer, not the engine: the host records every guild
// message it sees, and the engine only counts through the MessageArchive
// port. Entries are bounded per (channel, author) and pruned by age on
// insert, so memory stays flat even in busy channels.

use crate::core::automod::{AutoModError, MessageArchive};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Per-key cap on stored timestamps. Spam thresholds are far below this.
const MAX_TIMESTAMPS_PER_KEY: usize = 50;

/// How far back entries are kept, regardless of the per-key cap.
const RETENTION_MINUTES: i64 = 10;

/// A composite key for the archive.
/// The spam window is scoped to one author in one channel.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct ChannelAuthorKey {
    channel_id: u64,
    author_id: u64,
}

/// In-memory implementation of MessageArchive.
pub struct InMemoryMessageArchive {
    /// Maps (channel_id, author_id) -> recent message timestamps, oldest first.
    timestamps: DashMap<ChannelAuthorKey, Vec<DateTime<Utc>>>,
}

impl InMemoryMessageArchive {
    pub fn new() -> Self {
        Self {
            timestamps: DashMap::new(),
        }
    }

    /// Record one message arrival. Called by the host after the engine has
    /// evaluated the message, so the window never counts the message under
    /// evaluation.
    pub fn record(&self, channel_id: u64, author_id: u64, timestamp: DateTime<Utc>) {
        let key = ChannelAuthorKey {
            channel_id,
            author_id,
        };
        let horizon = Utc::now() - Duration::minutes(RETENTION_MINUTES);

        let mut entry = self.timestamps.entry(key).or_default();
        entry.push(timestamp);
        entry.retain(|ts| *ts >= horizon);
        if entry.len() > MAX_TIMESTAMPS_PER_KEY {
            let excess = entry.len() - MAX_TIMESTAMPS_PER_KEY;
            entry.drain(..excess);
        }
    }
}

impl Default for InMemoryMessageArchive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageArchive for InMemoryMessageArchive {
    async fn count_recent(
        &self,
        channel_id: u64,
        author_id: u64,
        since: DateTime<Utc>,
    ) -> Result<u32, AutoModError> {
        let key = ChannelAuthorKey {
            channel_id,
            author_id,
        };
        Ok(self
            .timestamps
            .get(&key)
            .map(|entry| entry.iter().filter(|ts| **ts >= since).count() as u32)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_only_messages_in_window() {
        let archive = InMemoryMessageArchive::new();
        let now = Utc::now();

        archive.record(10, 100, now - Duration::seconds(30));
        archive.record(10, 100, now - Duration::seconds(5));
        archive.record(10, 100, now - Duration::seconds(1));

        let count = archive
            .count_recent(10, 100, now - Duration::seconds(10))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn scopes_by_channel_and_author() {
        let archive = InMemoryMessageArchive::new();
        let now = Utc::now();

        archive.record(10, 100, now);
        archive.record(11, 100, now);
        archive.record(10, 200, now);

        let since = now - Duration::seconds(10);
        assert_eq!(archive.count_recent(10, 100, since).await.unwrap(), 1);
        assert_eq!(archive.count_recent(12, 100, since).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bounds_entries_per_key() {
        let archive = InMemoryMessageArchive::new();
        let now = Utc::now();

        for i in 0..200 {
            archive.record(10, 100, now - Duration::milliseconds(i));
        }

        let count = archive
            .count_recent(10, 100, now - Duration::seconds(60))
            .await
            .unwrap();
        assert_eq!(count as usize, MAX_TIMESTAMPS_PER_KEY);
    }
}
