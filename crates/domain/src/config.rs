//! Client configuration
//!
//! Every setting resolves, in order, from an explicit builder value, then the
//! matching `KACHY_*` environment variable, then the hard-coded default in
//! [`crate::constants`]. The resulting [`KachyConfig`] is immutable.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_POOL_SIZE, DEFAULT_RETRY_DELAY_SECS,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ENV_ACCESS_KEY, ENV_BASE_URL, ENV_MAX_RETRIES,
    ENV_POOL_SIZE, ENV_RETRY_DELAY, ENV_TIMEOUT,
};
use crate::errors::{KachyError, Result};

/// Immutable connection settings for one client.
#[derive(Clone, Serialize)]
pub struct KachyConfig {
    #[serde(skip_serializing)]
    access_key: String,
    base_url: String,
    timeout: u64,
    max_retries: u32,
    retry_delay: f64,
    pool_size: usize,
    user_agent: String,
    headers: BTreeMap<String, String>,
}

impl KachyConfig {
    /// Start building a configuration for the given access key.
    pub fn builder(access_key: impl Into<String>) -> KachyConfigBuilder {
        KachyConfigBuilder::new(access_key)
    }

    /// Configuration with every override taken from the environment or
    /// defaults.
    ///
    /// # Errors
    /// Returns `KachyError::Config` if the access key is empty or an
    /// environment variable holds an invalid number.
    pub fn new(access_key: impl Into<String>) -> Result<Self> {
        Self::builder(access_key).build()
    }

    /// Configuration read entirely from `KACHY_*` environment variables.
    ///
    /// # Errors
    /// Returns `KachyError::Config` if `KACHY_ACCESS_KEY` is unset or empty.
    pub fn from_env() -> Result<Self> {
        let access_key = std::env::var(ENV_ACCESS_KEY)
            .map_err(|_| KachyError::Config(format!("{ENV_ACCESS_KEY} is required")))?;
        Self::new(access_key)
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Backoff factor: the sleep before the first retry.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay)
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Default headers sent with every request (authorization excluded).
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

impl fmt::Debug for KachyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KachyConfig")
            .field("access_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("pool_size", &self.pool_size)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Builder for [`KachyConfig`].
#[derive(Clone, Default)]
pub struct KachyConfigBuilder {
    access_key: String,
    base_url: Option<String>,
    timeout: Option<u64>,
    max_retries: Option<u32>,
    retry_delay: Option<f64>,
    pool_size: Option<usize>,
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
}

impl KachyConfigBuilder {
    pub fn new(access_key: impl Into<String>) -> Self {
        Self { access_key: access_key.into(), ..Self::default() }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Per-request timeout in whole seconds.
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Number of retries after the first attempt.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Backoff factor in (fractional) seconds.
    pub fn retry_delay(mut self, seconds: f64) -> Self {
        self.retry_delay = Some(seconds);
        self
    }

    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = Some(size);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Add or replace a default header. Names compare case-insensitively.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Resolve against the process environment.
    ///
    /// # Errors
    /// Returns `KachyError::Config` if the access key is empty or an
    /// environment variable cannot be parsed.
    pub fn build(self) -> Result<KachyConfig> {
        self.build_with(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup.
    ///
    /// # Errors
    /// See [`KachyConfigBuilder::build`].
    pub fn build_with<F>(self, lookup: F) -> Result<KachyConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.access_key.trim().is_empty() {
            return Err(KachyError::Config(format!("{ENV_ACCESS_KEY} is required")));
        }

        let base_url = match self.base_url {
            Some(url) => url,
            None => lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(KachyError::Config("base URL must not be empty".into()));
        }

        let timeout = resolve(self.timeout, &lookup, ENV_TIMEOUT, DEFAULT_TIMEOUT_SECS)?;
        let max_retries = resolve(self.max_retries, &lookup, ENV_MAX_RETRIES, DEFAULT_MAX_RETRIES)?;
        let retry_delay =
            resolve(self.retry_delay, &lookup, ENV_RETRY_DELAY, DEFAULT_RETRY_DELAY_SECS)?;
        if Duration::try_from_secs_f64(retry_delay).is_err() {
            return Err(KachyError::Config(format!(
                "retry delay must be a non-negative number of seconds, got {retry_delay}"
            )));
        }
        let pool_size = resolve(self.pool_size, &lookup, ENV_POOL_SIZE, DEFAULT_POOL_SIZE)?;

        let user_agent = self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let headers = merge_headers(&user_agent, self.headers);

        Ok(KachyConfig {
            access_key: self.access_key,
            base_url,
            timeout,
            max_retries,
            retry_delay,
            pool_size,
            user_agent,
            headers,
        })
    }
}

impl fmt::Debug for KachyConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KachyConfigBuilder")
            .field("access_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .field("pool_size", &self.pool_size)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers)
            .finish()
    }
}

fn resolve<T, F>(explicit: Option<T>, lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = explicit {
        return Ok(value);
    }
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| KachyError::Config(format!("Invalid value for {key}: {e}"))),
        None => Ok(default),
    }
}

fn merge_headers(user_agent: &str, overrides: Vec<(String, String)>) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("User-Agent".to_string(), user_agent.to_string());
    headers.insert("Accept".to_string(), "application/json".to_string());
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    for (name, value) in overrides {
        headers.retain(|existing: &String, _| !existing.eq_ignore_ascii_case(&name));
        headers.insert(name, value);
    }
    headers
}
