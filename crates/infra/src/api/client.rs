//! Key-value client over the Valkey proxy API
//!
//! Each operation maps to one transport request; the result is pulled out of
//! a single response field with a fixed default (see [`super::fields`]).

use kachy_domain::constants::{
    PATH_DEL, PATH_EXEC, PATH_EXISTS, PATH_EXPIRE, PATH_GET, PATH_SET, PATH_TTL, TTL_MISSING,
};
use kachy_domain::{Command, KachyConfig, Result};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

use super::fields;
use super::pipeline::Pipeline;
use crate::http::HttpClient;

/// Client for the Kachy Valkey proxy.
///
/// Holds no key or value state. The pooled transport is shared by every call
/// on the same client; after [`KachyClient::close`] all calls fail with
/// `KachyError::Closed`.
#[derive(Debug)]
pub struct KachyClient {
    config: KachyConfig,
    http: HttpClient,
}

impl KachyClient {
    /// Create a client from a configuration snapshot.
    ///
    /// # Errors
    ///
    /// Returns `KachyError::Config` if the transport cannot be built from
    /// the configuration
    pub fn new(config: KachyConfig) -> Result<Self> {
        let http = HttpClient::from_config(&config)?;
        info!(base_url = %config.base_url(), "Kachy client created");
        Ok(Self { config, http })
    }

    /// Create a client configured from `KACHY_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `KachyError::Config` if `KACHY_ACCESS_KEY` is missing or any
    /// variable is invalid
    pub fn from_env() -> Result<Self> {
        Self::new(KachyConfig::from_env()?)
    }

    pub fn config(&self) -> &KachyConfig {
        &self.config
    }

    /// Set `key` to `value`, optionally expiring after `ex` seconds.
    ///
    /// Returns the `success` flag, `false` if the service omitted it.
    #[instrument(skip(self, value))]
    pub fn set(&self, key: &str, value: impl Into<Value>, ex: Option<u64>) -> Result<bool> {
        let mut body = Map::new();
        body.insert("key".into(), Value::from(key));
        body.insert("value".into(), value.into());
        if let Some(ex) = ex {
            body.insert("ex".into(), Value::from(ex));
        }

        let response = self.http.request(Method::POST, PATH_SET, Some(&Value::Object(body)))?;
        Ok(fields::bool_or(response.as_ref(), "success", false))
    }

    /// Value stored at `key`, or `None` if absent.
    ///
    /// A non-string value comes back as its JSON text, so `5` and `"5"` both
    /// read as `"5"`. Use [`KachyClient::raw_command`] with `GET` to see the
    /// untyped value.
    #[instrument(skip(self))]
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let response = self.http.request(Method::GET, &key_path(PATH_GET, key), None)?;
        Ok(fields::string(response.as_ref(), "value"))
    }

    /// Delete `key`. Returns whether a key was removed.
    #[instrument(skip(self))]
    pub fn delete(&self, key: &str) -> Result<bool> {
        let response = self.http.request(Method::DELETE, &key_path(PATH_DEL, key), None)?;
        Ok(fields::bool_or(response.as_ref(), "deleted", false))
    }

    #[instrument(skip(self))]
    pub fn exists(&self, key: &str) -> Result<bool> {
        let response = self.http.request(Method::GET, &key_path(PATH_EXISTS, key), None)?;
        Ok(fields::bool_or(response.as_ref(), "exists", false))
    }

    /// Set a timeout on `key`. Returns `false` if the key does not exist.
    #[instrument(skip(self))]
    pub fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        let body = json!({ "key": key, "seconds": seconds });
        let response = self.http.request(Method::POST, PATH_EXPIRE, Some(&body))?;
        Ok(fields::bool_or(response.as_ref(), "success", false))
    }

    /// Remaining time to live in seconds.
    ///
    /// [`TTL_NO_EXPIRY`] for a key without expiry, [`TTL_MISSING`] when the
    /// key is missing or the service omitted the field.
    ///
    /// [`TTL_NO_EXPIRY`]: kachy_domain::constants::TTL_NO_EXPIRY
    #[instrument(skip(self))]
    pub fn ttl(&self, key: &str) -> Result<i64> {
        let response = self.http.request(Method::GET, &key_path(PATH_TTL, key), None)?;
        Ok(fields::i64_or(response.as_ref(), "ttl", TTL_MISSING))
    }

    /// Run an arbitrary command. The name is upper-cased before sending.
    ///
    /// Returns the `result` field as-is, `Value::Null` if absent.
    #[instrument(skip(self, name, args), fields(command = tracing::field::Empty))]
    pub fn raw_command<N, I, A>(&self, name: N, args: I) -> Result<Value>
    where
        N: AsRef<str>,
        I: IntoIterator<Item = A>,
        A: Into<Value>,
    {
        let command = Command::new(name, args);
        tracing::Span::current().record("command", command.name());

        let body = json!({ "command": command.name(), "args": command.args() });
        let response = self.http.request(Method::POST, PATH_EXEC, Some(&body))?;
        Ok(fields::value(response.as_ref(), "result"))
    }

    /// Start an empty batch bound to this client.
    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(self)
    }

    /// Run `build` against a fresh pipeline and flush whatever it left
    /// queued, on return.
    ///
    /// Returns the closure's value with the results of the final flush.
    ///
    /// # Errors
    ///
    /// Propagates the flush error; the queue is cleared either way
    pub fn with_pipeline<F, T>(&self, build: F) -> Result<(T, Vec<Value>)>
    where
        F: FnOnce(&mut Pipeline<'_>) -> T,
    {
        let mut pipeline = self.pipeline();
        let output = build(&mut pipeline);
        let results = pipeline.execute()?;
        Ok((output, results))
    }

    /// Release the pooled connections.
    pub fn close(&self) {
        self.http.close();
        debug!("Kachy client closed");
    }

    pub fn is_closed(&self) -> bool {
        self.http.is_closed()
    }

    pub(crate) fn transport(&self) -> &HttpClient {
        &self.http
    }
}

fn key_path(prefix: &str, key: &str) -> String {
    format!("{}/{}", prefix, urlencoding::encode(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_path_encodes_single_segment() {
        assert_eq!(key_path(PATH_GET, "plain"), "/valkey/get/plain");
        assert_eq!(key_path(PATH_GET, "user:1"), "/valkey/get/user%3A1");
        assert_eq!(key_path(PATH_DEL, "a/b c"), "/valkey/del/a%2Fb%20c");
    }

    #[test]
    fn test_client_keeps_config() {
        let config = KachyConfig::builder("key")
            .base_url("http://127.0.0.1:1")
            .max_retries(0)
            .build_with(|_| None)
            .unwrap();
        let client = KachyClient::new(config).unwrap();

        assert_eq!(client.config().base_url(), "http://127.0.0.1:1");
        assert_eq!(client.transport().max_retries(), 0);
        assert!(!client.is_closed());

        client.close();
        assert!(client.is_closed());
    }
}
