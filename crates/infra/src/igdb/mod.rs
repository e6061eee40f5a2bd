//! Upstream catalog API integration

pub mod client;

pub use client::IgdbClient;
