//! Docbridge Storage: backend-agnostic data object store.
//!
//! Callers put, get, update, delete and search JSON documents ("data
//! objects") through one [`SdkClient`]. Which backend serves them is chosen
//! once at startup:
//!
//! # Native engine ([`NativeDataObjectClient`])
//!
//! Documents live in a search engine cluster and every operation is a REST
//! call to its document API.
//!
//! # Key-value table ([`KvDataObjectClient`])
//!
//! Documents live in a partitioned key-value table, one table per collection,
//! keyed by `(tenant, id)`. The adapter emulates document-store semantics on
//! top of flat attribute maps:
//!
//! | Concern | Mechanism |
//! |---------|-----------|
//! | Nested JSON | [`attribute`] transcoding |
//! | Create-only puts | `attribute_not_exists` condition on both keys |
//! | Optimistic concurrency | `_seq_no` attribute advanced by every write |
//! | Tenant isolation | tenant is the partition key ([`key`]) |
//! | Response parity | synthesized [`ResponseEnvelope`]s |
//!
//! Searches never touch the table; they are delegated to a remote engine
//! that mirrors it ([`search`]).
//!
//! # Feature Flags
//!
//! - **`kv`**: persistent `SurrealKV` table engine
//! - **`config`**: [`SdkClient::from_config`] from `docbridge-config`
//! - **`full`**: Both `kv` and `config`

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod attribute;
pub mod client;
pub mod condition;
pub mod error;
pub mod key;
pub mod kv_adapter;
pub mod native;
pub mod privilege;
pub mod request;
pub mod response;
pub mod search;
pub mod table;

mod http;

pub use attribute::{AttributeMap, AttributeValue, attributes_to_document, document_to_attributes};
pub use client::{BackendKind, DataObjectClient, SdkClient};
pub use condition::Condition;
pub use error::{ConflictKind, DocumentContext, StorageError, StorageResult, TranscodeError};
pub use key::{DEFAULT_TENANT, ItemKey, resolve_table};
pub use kv_adapter::KvDataObjectClient;
pub use native::NativeDataObjectClient;
pub use request::{
    DeleteDataObjectRequest, DeleteDataObjectResponse, GetDataObjectRequest,
    GetDataObjectResponse, PutDataObjectRequest, PutDataObjectResponse, SearchDataObjectRequest,
    SearchDataObjectResponse, UpdateDataObjectRequest, UpdateDataObjectResponse,
};
pub use response::{DocWriteResult, ResponseEnvelope, ShardInfo, build_response};
pub use search::{HttpSearchClient, SearchClient, delegate_search};
pub use table::{MemoryTableClient, TableClient, TableError};

#[cfg(feature = "kv")]
pub use table::SurrealKvTableClient;
