//! Client constants
//!
//! Environment variable names, defaults, and the endpoint paths of the
//! remote Valkey proxy.

// Environment variables
pub const ENV_ACCESS_KEY: &str = "KACHY_ACCESS_KEY";
pub const ENV_BASE_URL: &str = "KACHY_BASE_URL";
pub const ENV_TIMEOUT: &str = "KACHY_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "KACHY_MAX_RETRIES";
pub const ENV_RETRY_DELAY: &str = "KACHY_RETRY_DELAY";
pub const ENV_POOL_SIZE: &str = "KACHY_POOL_SIZE";
pub const ENV_CONFIG_PATH: &str = "KACHY_CONFIG";

// Defaults
pub const DEFAULT_BASE_URL: &str = "https://api.klache.net";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_POOL_SIZE: usize = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("kachy-valkey-rust/", env!("CARGO_PKG_VERSION"));

/// Upper bound for a single backoff sleep.
pub const MAX_BACKOFF_SECS: u64 = 120;

/// Statuses the transport replays the request on.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

// Endpoints
pub const PATH_SET: &str = "/valkey/set";
pub const PATH_GET: &str = "/valkey/get";
pub const PATH_DEL: &str = "/valkey/del";
pub const PATH_EXISTS: &str = "/valkey/exists";
pub const PATH_EXPIRE: &str = "/valkey/expire";
pub const PATH_TTL: &str = "/valkey/ttl";
pub const PATH_EXEC: &str = "/valkey/exec";
pub const PATH_PIPELINE: &str = "/valkey/pipeline";

/// TTL reported for a key that does not exist.
pub const TTL_MISSING: i64 = -2;
/// TTL reported for a key without an expiration.
pub const TTL_NO_EXPIRY: i64 = -1;
