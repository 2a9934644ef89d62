//! Configuration struct definitions.
//!
//! Every struct uses `#[serde(default)]` so a partial file deserializes
//! cleanly; the `Default` impls mirror `defaults.toml`.

use serde::{Deserialize, Serialize};

/// Top-level docbridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend selection and endpoints.
    pub storage: StorageSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// StorageSection
// ---------------------------------------------------------------------------

/// Which backend serves data objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Documents live in the search engine itself.
    #[default]
    Native,
    /// Documents live in a key-value table; search goes to a remote engine.
    Kv,
}

/// The `[storage]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Selected backend. Fixed for the lifetime of the process.
    pub backend: StorageBackend,
    /// Native engine connection.
    pub native: NativeSection,
    /// Key-value table engine.
    pub table: TableSection,
    /// Remote search engine used by the `kv` backend.
    pub remote_search: RemoteSearchSection,
}

/// The `[storage.native]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeSection {
    /// Base URL of the engine's REST API.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for NativeSection {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9200".to_owned(),
            timeout_secs: 30,
        }
    }
}

/// Key-value table engine implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableEngine {
    /// Process-local, lost on exit.
    #[default]
    Memory,
    /// Embedded `SurrealKV` store on disk.
    Surrealkv,
}

/// The `[storage.table]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSection {
    /// Engine implementation.
    pub engine: TableEngine,
    /// Data directory for on-disk engines.
    pub path: Option<String>,
}

/// The `[storage.remote_search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSearchSection {
    /// Base URL of the engine holding the replicated table indices.
    pub endpoint: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for RemoteSearchSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Write logs to this file instead of stderr.
    pub file: Option<String>,
    /// Per-crate tracing directives (e.g. `["docbridge_storage=debug",
    /// "reqwest=warn"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            file: None,
            directives: Vec::new(),
        }
    }
}
