//! Valkey proxy API client
//!
//! This module maps key-value operations onto the proxy's HTTP endpoints.
//!
//! # Architecture
//!
//! - All requests go through [`crate::http::HttpClient`] (no direct reqwest)
//! - Single calls: one request per operation, one field read per response
//! - Batches: [`Pipeline`] queues commands and flushes them in one request

pub mod client;
pub(crate) mod fields;
pub mod pipeline;

pub use client::KachyClient;
pub use pipeline::Pipeline;
