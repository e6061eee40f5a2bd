//! Durable message broker implementation

pub mod sqlite;

pub use sqlite::{RejectedMessage, SqliteMessageBroker};
