//! # Kachy Domain
//!
//! Domain types for the Kachy Valkey client.
//!
//! This crate contains:
//! - Client configuration and its builder
//! - The command model used by single calls and pipelines
//! - Error types and Result definitions
//! - Environment variable names, defaults, and endpoint paths
//!
//! ## Architecture
//! - No dependencies on other Kachy crates
//! - No network I/O

pub mod command;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used items
pub use command::Command;
pub use config::{KachyConfig, KachyConfigBuilder};
pub use errors::*;
