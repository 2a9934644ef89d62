//! Docbridge Test - Shared test utilities.
//!
//! Mock collaborators for the key-value adapter and sample documents that
//! exercise every JSON shape the attribute transcoder handles.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! docbridge-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use docbridge_storage::PutDataObjectRequest;
//! use docbridge_test::{KvHarness, sample_connector};
//!
//! #[tokio::test]
//! async fn test_put() {
//!     let harness = KvHarness::new();
//!     let response = harness
//!         .client
//!         .put_data_object(PutDataObjectRequest::new("connectors", sample_connector()))
//!         .await
//!         .unwrap();
//!     assert_eq!(response.seq_no(), 0);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
