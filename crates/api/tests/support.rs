#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard};

use kachy::KachyConfig;
use once_cell::sync::Lazy;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

pub const TEST_TOKEN: &str = "facade-access-key";

static REGISTRY_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Serialize tests that touch the process-wide client.
pub fn registry_guard() -> MutexGuard<'static, ()> {
    REGISTRY_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// WireMock server plus the runtime used to configure and inspect it.
///
/// Field order matters: the server must be dropped before the runtime.
pub struct MockBackend {
    server: MockServer,
    runtime: Runtime,
}

impl MockBackend {
    pub fn start() -> Self {
        let runtime = Runtime::new().expect("tokio runtime should start");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.runtime.block_on(self.server.received_requests()).unwrap_or_default()
    }

    pub fn config(&self) -> KachyConfig {
        KachyConfig::builder(TEST_TOKEN)
            .base_url(self.server.uri())
            .timeout(5)
            .max_retries(1)
            .retry_delay(0.005)
            .build_with(|_| None)
            .expect("config should build")
    }
}
