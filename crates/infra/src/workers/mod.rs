//! Background polling workers

pub mod polling_worker;

pub use polling_worker::{PollingWorker, PollingWorkerConfig};
