//! Ready-made key-value client wiring for tests.

use std::sync::Arc;

use docbridge_storage::{KvDataObjectClient, MemoryTableClient, SdkClient};
use docbridge_telemetry::{LogConfig, LogFormat, setup_logging};

use crate::mocks::MockSearchClient;

/// An [`SdkClient`] over the key-value adapter, with handles on its
/// in-memory table and mock search engine.
#[derive(Debug, Clone)]
pub struct KvHarness {
    /// Client under test.
    pub client: SdkClient,
    /// Backing table, for inspecting raw items.
    pub table: Arc<MemoryTableClient>,
    /// Search engine stand-in.
    pub search: MockSearchClient,
}

impl KvHarness {
    /// Build a harness whose table rejects calls made outside the
    /// adapter's privileged scope.
    #[must_use]
    pub fn new() -> Self {
        Self::with_search(MockSearchClient::new())
    }

    /// Build a harness with a preconfigured search mock.
    #[must_use]
    pub fn with_search(search: MockSearchClient) -> Self {
        let table = Arc::new(MemoryTableClient::new().require_privileged());
        let adapter = KvDataObjectClient::new(table.clone(), Arc::new(search.clone()));
        Self {
            client: SdkClient::new(Arc::new(adapter)),
            table,
            search,
        }
    }
}

impl Default for KvHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a debug-level, timestamp-free subscriber for test output.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_logging() {
    let config = LogConfig::new("debug")
        .with_format(LogFormat::Compact)
        .without_timestamps()
        .without_ansi();
    if setup_logging(&config).is_err() {
        tracing::trace!("test subscriber already installed");
    }
}
