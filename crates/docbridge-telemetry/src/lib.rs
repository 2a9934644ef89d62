//! Docbridge Telemetry - logging and request tracing.
//!
//! This crate provides:
//! - Configurable `tracing` subscriber setup (pretty, compact, JSON, full;
//!   stdout, stderr, or a file)
//! - Request contexts that tag every log line of a data object operation
//!   with its collection, tenant and document id
//!
//! # Example
//!
//! ```rust,no_run
//! use docbridge_telemetry::{LogConfig, LogFormat, RequestContext, RequestGuard, setup_logging};
//!
//! # fn main() -> Result<(), docbridge_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("docbridge_storage=debug");
//! setup_logging(&config)?;
//!
//! let _guard = RequestGuard::new(
//!     RequestContext::new("put")
//!         .with_collection("connectors")
//!         .with_tenant("acme"),
//! );
//! tracing::info!("Storing connector");
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//!
//! - **`config`**: `LogConfig: TryFrom<&docbridge_config::LoggingSection>`

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
