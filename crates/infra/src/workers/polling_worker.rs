//! Queue polling worker for signal-driven synchronization.
//!
//! One worker per topic. Each cycle receives at most `max_messages` signals
//! from the topic's queue (steady state: one) and runs them through the
//! message processor, which forwards the deserialized signal into the domain
//! use case and quarantines failures to the DLQ. A failed cycle never stops
//! the loop — only cancellation does. Join handles are tracked and
//! cancellation is explicit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gamesync_core::{MessageBroker, MessageProcessor, SignalHandler};
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Configuration for a polling worker.
#[derive(Debug, Clone)]
pub struct PollingWorkerConfig {
    /// Queue this worker drains
    pub queue: String,
    /// Interval between polling cycles
    pub poll_interval: Duration,
    /// Messages fetched per cycle
    pub max_messages: usize,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl PollingWorkerConfig {
    pub fn new(queue: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            poll_interval: Duration::from_secs(5),
            max_messages: 1,
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Polling worker with explicit lifecycle management.
pub struct PollingWorker<T> {
    broker: Arc<dyn MessageBroker>,
    handler: Arc<dyn SignalHandler<T>>,
    config: PollingWorkerConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl<T> PollingWorker<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Create a new worker for one topic.
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        handler: Arc<dyn SignalHandler<T>>,
        config: PollingWorkerConfig,
    ) -> Self {
        Self { broker, handler, config, cancellation: CancellationToken::new(), task_handle: None }
    }

    /// Start the worker, spawning the background polling task.
    #[instrument(skip(self), fields(queue = %self.config.queue))]
    pub fn start(&mut self) -> Result<(), String> {
        if self.is_running() {
            return Err("Worker already running".to_string());
        }

        info!("Starting polling worker");

        self.cancellation = CancellationToken::new();

        let broker = Arc::clone(&self.broker);
        let handler = Arc::clone(&self.handler);
        let config = self.config.clone();
        let cancel = self.cancellation.clone();

        let handle = tokio::spawn(async move {
            Self::process_loop(broker, handler, config, cancel).await;
        });

        self.task_handle = Some(handle);
        info!("Polling worker started");

        Ok(())
    }

    /// Stop the worker and wait for the polling task to finish.
    #[instrument(skip(self), fields(queue = %self.config.queue))]
    pub async fn stop(&mut self) -> Result<(), String> {
        if !self.is_running() {
            return Err("Worker not running".to_string());
        }

        info!("Stopping polling worker");

        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            match tokio::time::timeout(self.config.join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Worker task panicked: {}", e);
                    return Err("Worker task panicked".to_string());
                }
                Err(_) => {
                    warn!("Worker task did not complete within timeout");
                    return Err("Worker task timeout".to_string());
                }
            }
        }

        info!("Polling worker stopped");
        self.cancellation = CancellationToken::new();

        Ok(())
    }

    /// Background polling loop: cancellable sleep, then one cycle.
    async fn process_loop(
        broker: Arc<dyn MessageBroker>,
        handler: Arc<dyn SignalHandler<T>>,
        config: PollingWorkerConfig,
        cancel: CancellationToken,
    ) {
        let processor = MessageProcessor::<T>::new(Arc::clone(&broker));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(queue = %config.queue, "Polling worker loop cancelled");
                    break;
                }
                _ = tokio::time::sleep(config.poll_interval) => {
                    Self::run_cycle(&broker, &handler, &processor, &config).await;
                }
            }
        }
    }

    /// One polling cycle. All failures are logged and absorbed so a bad
    /// cycle only costs one interval.
    async fn run_cycle(
        broker: &Arc<dyn MessageBroker>,
        handler: &Arc<dyn SignalHandler<T>>,
        processor: &MessageProcessor<T>,
        config: &PollingWorkerConfig,
    ) {
        let started = Instant::now();
        debug!(queue = %config.queue, "Starting synchronization cycle");

        let messages = match broker.receive(&config.queue, config.max_messages).await {
            Ok(messages) => messages,
            Err(err) => {
                error!(queue = %config.queue, error = %err, "Failed to receive messages, skipping cycle");
                return;
            }
        };

        if messages.is_empty() {
            debug!(queue = %config.queue, "No message found, skipping synchronization");
            return;
        }

        info!(queue = %config.queue, count = messages.len(), "Message received, starting synchronization");

        for message in messages {
            let handler = Arc::clone(handler);
            let processed = processor
                .execute(&config.queue, &message, |signal| async move {
                    handler.handle(signal).await
                })
                .await;

            if processed {
                info!(
                    queue = %config.queue,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Synchronization finished"
                );
            } else {
                warn!(queue = %config.queue, "Message quarantined to DLQ");
            }
        }
    }
}

impl<T> PollingWorker<T> {
    /// Returns true when a worker instance is active.
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }
}

impl<T> Drop for PollingWorker<T> {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("PollingWorker dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}
