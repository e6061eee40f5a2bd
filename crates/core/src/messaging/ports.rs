//! Port interfaces for message broker operations

use async_trait::async_trait;
use gamesync_domain::Result;

/// Suffix appended to a queue name to derive its dead-letter queue.
pub const DLQ_SUFFIX: &str = ".dlq";

/// Derive the dead-letter queue name for a queue.
///
/// Pure and total: every queue name maps to exactly one DLQ name.
#[must_use]
pub fn dlq_name(queue: &str) -> String {
    format!("{queue}{DLQ_SUFFIX}")
}

/// Trait for durable message broker operations.
///
/// Implementations guarantee at-least-once semantics: a message removed by
/// [`MessageBroker::receive`] is acknowledged at fetch time and will not be
/// redelivered, while failures surfaced by the caller must be routed through
/// [`MessageBroker::reject_to_dlq`] to avoid silent loss.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publish a durable message to a queue, creating the queue and its
    /// dead-letter queue if they do not exist yet.
    async fn publish(&self, queue: &str, message: &str) -> Result<()>;

    /// Fetch and acknowledge up to `max_messages` messages.
    ///
    /// Each message is acknowledged as it is read; the call returns early
    /// when the queue is empty and never waits for new messages.
    async fn receive(&self, queue: &str, max_messages: usize) -> Result<Vec<String>>;

    /// Publish a message to the queue's dead-letter queue, tagged with the
    /// original queue name, the rejection reason and a rejection timestamp.
    async fn reject_to_dlq(&self, queue: &str, message: &str, reason: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dlq_name_appends_fixed_suffix() {
        assert_eq!(dlq_name("sync_games"), "sync_games.dlq");
        assert_eq!(dlq_name("sync_genres"), "sync_genres.dlq");
    }

    #[test]
    fn dlq_names_do_not_collide_across_queues() {
        assert_ne!(dlq_name("sync_games"), dlq_name("sync_genres"));
    }
}
