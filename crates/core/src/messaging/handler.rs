//! Typed handler seam between polling workers and domain use cases

use async_trait::async_trait;
use gamesync_domain::Result;

/// A consumer of deserialized sync signals.
///
/// Implemented by the domain use cases; polling workers hold one per topic
/// and invoke it through the message processor.
#[async_trait]
pub trait SignalHandler<T>: Send + Sync {
    async fn handle(&self, signal: T) -> Result<()>;
}
