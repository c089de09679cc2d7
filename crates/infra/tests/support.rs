#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use kachy_domain::constants::{TTL_MISSING, TTL_NO_EXPIRY};
use kachy_domain::KachyConfig;
use kachy_infra::KachyClient;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const TEST_TOKEN: &str = "test-access-key";

/// Install a test-writer subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// WireMock server plus the runtime used to configure and inspect it.
///
/// The server answers from its own thread, so the blocking client is called
/// directly from the test thread. Field order matters: the server must be
/// dropped (and its expectations verified) before the runtime.
pub struct MockBackend {
    server: MockServer,
    runtime: Runtime,
}

impl MockBackend {
    pub fn start() -> Self {
        init_tracing();
        let runtime = Runtime::new().expect("tokio runtime should start");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.runtime.block_on(self.server.received_requests()).unwrap_or_default()
    }

    /// Client with a fast backoff so retry tests stay quick.
    pub fn client_with_retries(&self, max_retries: u32) -> KachyClient {
        let config = KachyConfig::builder(TEST_TOKEN)
            .base_url(self.uri())
            .timeout(5)
            .max_retries(max_retries)
            .retry_delay(0.005)
            .build_with(|_| None)
            .expect("config should build");
        KachyClient::new(config).expect("client should build")
    }

    pub fn client(&self) -> KachyClient {
        self.client_with_retries(2)
    }
}

type Store = Arc<Mutex<HashMap<String, (Value, Option<u64>)>>>;

fn key_from(req: &Request) -> String {
    let raw = req.url.path().rsplit('/').next().unwrap_or_default();
    urlencoding::decode(raw).map(|k| k.into_owned()).unwrap_or_default()
}

/// Mount an in-memory imitation of the proxy's single-key endpoints.
pub fn mount_fake_store(backend: &MockBackend) {
    let store: Store = Arc::default();

    let s = store.clone();
    backend.mount(Mock::given(method("POST")).and(path("/valkey/set")).respond_with(
        move |req: &Request| {
            let body: Value = req.body_json().unwrap_or_default();
            let key = body["key"].as_str().unwrap_or_default().to_string();
            s.lock().unwrap().insert(key, (body["value"].clone(), body["ex"].as_u64()));
            ResponseTemplate::new(200).set_body_json(json!({"success": true}))
        },
    ));

    let s = store.clone();
    backend.mount(Mock::given(method("GET")).and(path_regex("^/valkey/get/.+$")).respond_with(
        move |req: &Request| {
            let value = s.lock().unwrap().get(&key_from(req)).map(|(v, _)| v.clone());
            ResponseTemplate::new(200).set_body_json(json!({"value": value}))
        },
    ));

    let s = store.clone();
    backend.mount(Mock::given(method("DELETE")).and(path_regex("^/valkey/del/.+$")).respond_with(
        move |req: &Request| {
            let deleted = s.lock().unwrap().remove(&key_from(req)).is_some();
            ResponseTemplate::new(200).set_body_json(json!({"deleted": deleted}))
        },
    ));

    let s = store.clone();
    backend.mount(Mock::given(method("GET")).and(path_regex("^/valkey/exists/.+$")).respond_with(
        move |req: &Request| {
            let exists = s.lock().unwrap().contains_key(&key_from(req));
            ResponseTemplate::new(200).set_body_json(json!({"exists": exists}))
        },
    ));

    let s = store.clone();
    backend.mount(Mock::given(method("POST")).and(path("/valkey/expire")).respond_with(
        move |req: &Request| {
            let body: Value = req.body_json().unwrap_or_default();
            let key = body["key"].as_str().unwrap_or_default();
            let success = match s.lock().unwrap().get_mut(key) {
                Some(entry) => {
                    entry.1 = body["seconds"].as_u64();
                    true
                }
                None => false,
            };
            ResponseTemplate::new(200).set_body_json(json!({"success": success}))
        },
    ));

    let s = store;
    backend.mount(Mock::given(method("GET")).and(path_regex("^/valkey/ttl/.+$")).respond_with(
        move |req: &Request| {
            let ttl = match s.lock().unwrap().get(&key_from(req)) {
                None => TTL_MISSING,
                Some((_, None)) => TTL_NO_EXPIRY,
                Some((_, Some(seconds))) => i64::try_from(*seconds).unwrap_or(i64::MAX),
            };
            ResponseTemplate::new(200).set_body_json(json!({"ttl": ttl}))
        },
    ));
}
