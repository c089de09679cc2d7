//! HTTP transport
//!
//! Blocking `reqwest` client with bearer authentication, verbatim retries on
//! transient failures, and status-code classification into [`KachyError`].
//!
//! [`KachyError`]: kachy_domain::KachyError

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
