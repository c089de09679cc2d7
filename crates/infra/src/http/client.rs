use std::time::Duration;

use kachy_domain::constants::MAX_BACKOFF_SECS;
use kachy_domain::{KachyConfig, KachyError, Result};
use parking_lot::RwLock;
use reqwest::blocking::{Client as ReqwestClient, Response};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

/// Blocking HTTP transport with bearer auth, retry, and a pooled connection.
///
/// Retries replay the request verbatim. No idempotency key is attached, so a
/// write whose response was lost after the server applied it can be applied
/// twice.
pub struct HttpClient {
    client: RwLock<Option<ReqwestClient>>,
    base_url: String,
    authorization: HeaderValue,
    max_retries: u32,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Transport configured from a client configuration snapshot.
    ///
    /// # Errors
    /// Returns `KachyError::Config` if the base URL, a header, or the
    /// credential cannot be used, or the connection pool cannot be created.
    pub fn from_config(config: &KachyConfig) -> Result<Self> {
        let mut builder = Self::builder()
            .base_url(config.base_url())
            .bearer_token(config.access_key())
            .timeout(config.timeout())
            .max_retries(config.max_retries())
            .base_backoff(config.retry_delay())
            .pool_size(config.pool_size());
        for (name, value) in config.headers() {
            builder = builder.header(name, value);
        }
        builder.build()
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Send `method path` with an optional JSON body and return the parsed
    /// response body, or `None` when the body is empty.
    ///
    /// # Errors
    /// - `KachyError::Closed` after [`HttpClient::close`]
    /// - `KachyError::Authentication` on HTTP 401
    /// - `KachyError::Response` on any other status >= 400, including a
    ///   retryable status once the retry budget is spent, and on a body that
    ///   is not JSON
    /// - `KachyError::Connection` when the request cannot be completed
    pub fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Option<Value>> {
        let client = self.handle()?;
        let url = format!("{}{}", self.base_url, path);
        let attempts = self.max_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let mut request =
                client.request(method.clone(), &url).header(AUTHORIZATION, self.authorization.clone());
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(attempt, %method, %url, "sending HTTP request");

            match request.send() {
                Ok(response) => {
                    let status = response.status();
                    let server_delay = retry_after(&response);
                    debug!(attempt, %method, %url, %status, "received HTTP response");

                    match read_response(response) {
                        Err(err) if err.is_retryable() && attempt < attempts => {
                            let delay = server_delay.unwrap_or_else(|| self.backoff_delay(attempt));
                            warn!(
                                attempt, %method, %url, %status, ?delay, error = %err,
                                "retrying after HTTP error"
                            );
                            sleep(delay);
                            continue;
                        }
                        outcome => return outcome,
                    }
                }
                Err(err) => {
                    debug!(attempt, %method, %url, error = %err, "HTTP request failed");

                    if attempt < attempts && should_retry_error(&err) {
                        let delay = self.backoff_delay(attempt);
                        warn!(attempt, %method, %url, ?delay, "retrying after network error");
                        sleep(delay);
                        continue;
                    }

                    return Err(KachyError::Connection(format!("Request failed: {err}")));
                }
            }
        }

        Err(KachyError::Connection("http client exhausted retries without producing a result".into()))
    }

    /// Release the pooled connections. Later requests fail with
    /// `KachyError::Closed`.
    pub fn close(&self) {
        if self.client.write().take().is_some() {
            debug!(base_url = %self.base_url, "HTTP client closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.client.read().is_none()
    }

    fn handle(&self) -> Result<ReqwestClient> {
        self.client.read().clone().ok_or(KachyError::Closed)
    }

    /// Sleep before retry `retry_number` (1-based): `base * 2^(n-1)`, capped.
    fn backoff_delay(&self, retry_number: u32) -> Duration {
        let shift = retry_number.saturating_sub(1).min(16);
        let delay = self.base_backoff.saturating_mul(1u32 << shift);
        delay.min(Duration::from_secs(MAX_BACKOFF_SECS))
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("base_backoff", &self.base_backoff)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    base_url: String,
    bearer_token: Option<String>,
    timeout: Duration,
    max_retries: u32,
    base_backoff: Duration,
    pool_size: usize,
    headers: Vec<(String, String)>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            base_url: kachy_domain::constants::DEFAULT_BASE_URL.to_string(),
            bearer_token: None,
            timeout: Duration::from_secs(kachy_domain::constants::DEFAULT_TIMEOUT_SECS),
            max_retries: kachy_domain::constants::DEFAULT_MAX_RETRIES,
            base_backoff: Duration::from_secs_f64(kachy_domain::constants::DEFAULT_RETRY_DELAY_SECS),
            pool_size: kachy_domain::constants::DEFAULT_POOL_SIZE,
            headers: Vec::new(),
        }
    }
}

impl std::fmt::Debug for HttpClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClientBuilder")
            .field("base_url", &self.base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("base_backoff", &self.base_backoff)
            .field("pool_size", &self.pool_size)
            .field("headers", &self.headers)
            .finish()
    }
}

impl HttpClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the number of retries after the initial attempt.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    /// Maximum idle connections kept per host.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// # Errors
    /// Returns `KachyError::Config` for a missing token, an invalid base URL
    /// or header, or when the underlying client cannot be built.
    pub fn build(self) -> Result<HttpClient> {
        let token = self
            .bearer_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| KachyError::Config("bearer token not set".to_string()))?;
        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| KachyError::Config("access key is not a valid header value".into()))?;
        authorization.set_sensitive(true);

        let base_url = self.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| KachyError::Config(format!("Invalid base URL '{base_url}': {e}")))?;

        let mut default_headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| KachyError::Config(format!("Invalid header name '{name}': {e}")))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| KachyError::Config(format!("Invalid value for header '{name}': {e}")))?;
            default_headers.insert(header_name, header_value);
        }

        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(self.pool_size)
            .default_headers(default_headers)
            .no_proxy()
            .build()
            .map_err(|e| KachyError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(HttpClient {
            client: RwLock::new(Some(client)),
            base_url,
            authorization,
            max_retries: self.max_retries,
            base_backoff: self.base_backoff,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Honors a `Retry-After` header given in whole seconds.
fn retry_after(response: &Response) -> Option<Duration> {
    let seconds = response.headers().get(RETRY_AFTER)?.to_str().ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(seconds.min(MAX_BACKOFF_SECS)))
}

fn sleep(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}

fn read_response(response: Response) -> Result<Option<Value>> {
    let status = response.status();
    let text = response
        .text()
        .map_err(|e| KachyError::Connection(format!("Failed to read response body: {e}")))?;

    if status == StatusCode::UNAUTHORIZED {
        return Err(KachyError::Authentication("Authentication failed".to_string()));
    }
    if status.as_u16() >= 400 {
        return Err(KachyError::Response { status: status.as_u16(), body: text });
    }
    if text.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&text)
        .map(Some)
        .map_err(|_| KachyError::Response { status: status.as_u16(), body: text })
}
