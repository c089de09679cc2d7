//! # Kachy Infrastructure
//!
//! I/O side of the Kachy Valkey client.
//!
//! This crate contains:
//! - The blocking HTTP transport with auth and retry
//! - Configuration loading from the environment and files
//! - The key-value client and the command pipeline
//!
//! ## Architecture
//! - Depends on `kachy-domain` for configuration, commands, and errors
//! - Contains all network and filesystem access

pub mod api;
pub mod config;
pub mod http;

// Re-export commonly used items
pub use api::{KachyClient, Pipeline};
pub use http::{HttpClient, HttpClientBuilder};
