//! Generic message processing with dead-letter quarantine.
//!
//! [`MessageProcessor`] is the single choke point for every inbound signal:
//! a raw payload is deserialized, handed to a typed handler, and any failure
//! along the way is converted into a DLQ rejection carrying a diagnostic
//! reason. Callers observe only a bool — payload and handler errors never
//! propagate past this layer.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use gamesync_domain::Result;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info};

use super::ports::MessageBroker;

const MAX_REASON_LEN: usize = 256;

/// Deserialize-dispatch-quarantine wrapper around a [`MessageBroker`].
pub struct MessageProcessor<T> {
    broker: Arc<dyn MessageBroker>,
    _message: PhantomData<fn() -> T>,
}

impl<T> MessageProcessor<T>
where
    T: DeserializeOwned,
{
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker, _message: PhantomData }
    }

    /// Deserialize `raw_message` and run `handler` on the result.
    ///
    /// Returns `true` only when deserialization and the handler both
    /// succeed. On any failure the message is rejected to the queue's DLQ
    /// and `false` is returned; a failure of the rejection itself is logged
    /// and absorbed so that the caller's cycle never aborts on a poison
    /// message.
    pub async fn execute<F, Fut>(&self, queue: &str, raw_message: &str, handler: F) -> bool
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        // JSON `null` deserializes to None rather than erroring, so the two
        // rejection reasons stay distinguishable.
        let parsed = match serde_json::from_str::<Option<T>>(raw_message) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!(queue = %queue, error = %err, "Invalid JSON in message, sending to DLQ");
                self.reject(queue, raw_message, &format!("JSON deserialization error: {err}"))
                    .await;
                return false;
            }
        };

        let Some(message) = parsed else {
            error!(queue = %queue, "Message is null after deserialization, sending to DLQ");
            self.reject(queue, raw_message, "Deserialization returned null").await;
            return false;
        };

        debug!(queue = %queue, "Message deserialized");

        match handler(message).await {
            Ok(()) => {
                info!(queue = %queue, "Message processed");
                true
            }
            Err(err) => {
                error!(queue = %queue, error = %err, "Message handler failed, sending to DLQ");
                self.reject(queue, raw_message, &format!("Processing error: {err}")).await;
                false
            }
        }
    }

    async fn reject(&self, queue: &str, raw_message: &str, reason: &str) {
        let reason = truncate_reason(reason);
        if let Err(err) = self.broker.reject_to_dlq(queue, raw_message, &reason).await {
            error!(queue = %queue, error = %err, "Failed to reject message to DLQ");
        }
    }
}

fn truncate_reason(reason: &str) -> String {
    if reason.len() <= MAX_REASON_LEN {
        return reason.to_string();
    }

    let mut truncated = reason.chars().take(MAX_REASON_LEN.saturating_sub(3)).collect::<String>();
    truncated.push_str("...");
    truncated
}
