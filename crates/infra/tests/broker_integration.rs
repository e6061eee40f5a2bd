//! Broker integration tests: the processor running against the real
//! SQLite-backed broker.

mod support;

use std::sync::Arc;

use gamesync_core::{MessageBroker, MessageProcessor};
use gamesync_domain::{GameSyncError, GamesSyncSignal, GenresSyncSignal};
use support::TestBroker;

#[tokio::test(flavor = "multi_thread")]
async fn bounded_receive_drains_available_messages_only() {
    let test = TestBroker::new();
    let broker = Arc::clone(&test.broker);

    broker.publish("sync_games", "first").await.expect("published");
    broker.publish("sync_games", "second").await.expect("published");

    let messages = broker.receive("sync_games", 3).await.expect("received");

    assert_eq!(messages.len(), 2);
    assert_eq!(broker.queue_depth("sync_games").await.expect("depth"), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn successful_processing_leaves_queue_and_dlq_empty() {
    let test = TestBroker::new();
    let broker = Arc::clone(&test.broker);

    broker.publish("sync_games", r#"{"platform_ids":[6]}"#).await.expect("published");

    let messages = broker.receive("sync_games", 1).await.expect("received");
    assert_eq!(messages.len(), 1);

    let processor: MessageProcessor<GamesSyncSignal> =
        MessageProcessor::new(Arc::clone(&broker) as Arc<dyn MessageBroker>);

    let processed = processor
        .execute("sync_games", &messages[0], |signal| async move {
            assert_eq!(signal.platform_ids, vec![6]);
            Ok(())
        })
        .await;

    assert!(processed);
    assert_eq!(broker.queue_depth("sync_games").await.expect("depth"), 0);
    assert_eq!(broker.queue_depth("sync_games.dlq").await.expect("depth"), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_message_lands_in_dlq_with_diagnostics() {
    let test = TestBroker::new();
    let broker = Arc::clone(&test.broker);

    broker.publish("sync_genres", "not-json").await.expect("published");

    let messages = broker.receive("sync_genres", 1).await.expect("received");
    let processor: MessageProcessor<GenresSyncSignal> =
        MessageProcessor::new(Arc::clone(&broker) as Arc<dyn MessageBroker>);

    let processed =
        processor.execute("sync_genres", &messages[0], |_signal| async { Ok(()) }).await;

    assert!(!processed);

    let rejected = broker.rejected_messages("sync_genres").await.expect("dlq read");
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].body, "not-json");
    assert_eq!(rejected[0].original_queue, "sync_genres");
    assert!(rejected[0].reason.contains("JSON deserialization error"));
}

#[tokio::test(flavor = "multi_thread")]
async fn handler_failure_lands_in_dlq_with_processing_reason() {
    let test = TestBroker::new();
    let broker = Arc::clone(&test.broker);

    broker.publish("sync_games", "{}").await.expect("published");

    let messages = broker.receive("sync_games", 1).await.expect("received");
    let processor: MessageProcessor<GamesSyncSignal> =
        MessageProcessor::new(Arc::clone(&broker) as Arc<dyn MessageBroker>);

    let processed = processor
        .execute("sync_games", &messages[0], |_signal| async {
            Err(GameSyncError::Network("catalog API unreachable".into()))
        })
        .await;

    assert!(!processed);

    let rejected = broker.rejected_messages("sync_games").await.expect("dlq read");
    assert_eq!(rejected.len(), 1);
    assert!(rejected[0].reason.contains("Processing error"));
    assert!(rejected[0].reason.contains("catalog API unreachable"));
}
