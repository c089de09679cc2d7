//! # Kachy
//!
//! Process-wide convenience layer over [`KachyClient`].
//!
//! This crate contains:
//! - A guarded registry holding at most one shared client
//! - Free functions delegating to the registered client
//! - Re-exports of the client, pipeline, configuration, and error types
//!
//! ## Architecture
//! - Depends on `kachy-domain` and `kachy-infra`
//! - Explicit lifecycle: [`init`] installs a client, [`close`] removes it
//!
//! ```no_run
//! # fn main() -> kachy::Result<()> {
//! kachy::init("my-access-key")?;
//! kachy::set("greeting", "hello", Some(60))?;
//! assert_eq!(kachy::get("greeting")?.as_deref(), Some("hello"));
//! kachy::close();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use parking_lot::{const_rwlock, RwLock};
use serde_json::Value;
use tracing::{debug, info};

pub use kachy_domain::constants;
pub use kachy_domain::{Command, ErrorCategory, KachyConfig, KachyConfigBuilder, KachyError, Result};
pub use kachy_infra::config;
pub use kachy_infra::{KachyClient, Pipeline};

static CLIENT: RwLock<Option<Arc<KachyClient>>> = const_rwlock(None);

/// Install a client built from `access_key`, the environment, and defaults.
///
/// # Errors
///
/// Returns `KachyError::Config` if the key is empty or an environment
/// override is invalid. The registry is left untouched on error.
pub fn init(access_key: impl Into<String>) -> Result<Arc<KachyClient>> {
    init_with_config(KachyConfig::new(access_key)?)
}

/// Install a client for an already-built configuration.
///
/// A previously registered client is closed; handles still held elsewhere
/// fail with `KachyError::Closed` from then on.
///
/// # Errors
///
/// Returns `KachyError::Config` if the transport cannot be built.
pub fn init_with_config(config: KachyConfig) -> Result<Arc<KachyClient>> {
    let client = Arc::new(KachyClient::new(config)?);

    let previous = CLIENT.write().replace(Arc::clone(&client));
    if let Some(previous) = previous {
        previous.close();
        debug!("Replaced previously registered Kachy client");
    }

    info!(base_url = %client.config().base_url(), "Kachy client registered");
    Ok(client)
}

/// The registered client.
///
/// # Errors
///
/// Returns `KachyError::NotInitialized` before [`init`] or after [`close`].
pub fn get_client() -> Result<Arc<KachyClient>> {
    CLIENT.read().clone().ok_or(KachyError::NotInitialized)
}

pub fn is_initialized() -> bool {
    CLIENT.read().is_some()
}

/// See [`KachyClient::set`].
pub fn set(key: &str, value: impl Into<Value>, ex: Option<u64>) -> Result<bool> {
    get_client()?.set(key, value, ex)
}

/// See [`KachyClient::get`].
pub fn get(key: &str) -> Result<Option<String>> {
    get_client()?.get(key)
}

/// See [`KachyClient::delete`].
pub fn delete(key: &str) -> Result<bool> {
    get_client()?.delete(key)
}

/// See [`KachyClient::exists`].
pub fn exists(key: &str) -> Result<bool> {
    get_client()?.exists(key)
}

/// See [`KachyClient::expire`].
pub fn expire(key: &str, seconds: u64) -> Result<bool> {
    get_client()?.expire(key, seconds)
}

/// See [`KachyClient::ttl`].
pub fn ttl(key: &str) -> Result<i64> {
    get_client()?.ttl(key)
}

/// See [`KachyClient::raw_command`].
pub fn raw_command<N, I, A>(name: N, args: I) -> Result<Value>
where
    N: AsRef<str>,
    I: IntoIterator<Item = A>,
    A: Into<Value>,
{
    get_client()?.raw_command(name, args)
}

/// Build and flush a batch on the registered client.
///
/// See [`KachyClient::with_pipeline`].
pub fn with_pipeline<F, T>(build: F) -> Result<(T, Vec<Value>)>
where
    F: FnOnce(&mut Pipeline<'_>) -> T,
{
    get_client()?.with_pipeline(build)
}

/// Close and unregister the client. A no-op when nothing is registered.
pub fn close() {
    let previous = CLIENT.write().take();
    if let Some(client) = previous {
        client.close();
        info!("Kachy client unregistered");
    }
}
