//! Message broker port and the generic processing wrapper

pub mod handler;
pub mod ports;
pub mod processor;

pub use handler::SignalHandler;
pub use ports::{dlq_name, MessageBroker, DLQ_SUFFIX};
pub use processor::MessageProcessor;
