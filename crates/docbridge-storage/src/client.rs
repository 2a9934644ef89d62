//! Backend-agnostic data object API.
//!
//! [`DataObjectClient`] is the capability both backends implement. Callers
//! hold an [`SdkClient`], which wraps exactly one implementation chosen at
//! startup and never changes afterwards.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::StorageResult;
use crate::request::{
    DeleteDataObjectRequest, DeleteDataObjectResponse, GetDataObjectRequest,
    GetDataObjectResponse, PutDataObjectRequest, PutDataObjectResponse, SearchDataObjectRequest,
    SearchDataObjectResponse, UpdateDataObjectRequest, UpdateDataObjectResponse,
};

/// Which physical backend serves the data objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// The native search engine cluster.
    Native,
    /// A key-value table plus a remote search cluster.
    KeyValue,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => f.write_str("native"),
            Self::KeyValue => f.write_str("kv"),
        }
    }
}

/// CRUD and search over data objects.
///
/// Implementations are shared across all concurrent callers. Failures are
/// typed so callers can tell a lost race from bad input from an outage.
#[async_trait]
pub trait DataObjectClient: Send + Sync {
    /// Store a document.
    async fn put(&self, request: PutDataObjectRequest) -> StorageResult<PutDataObjectResponse>;

    /// Read a document. A missing document is a normal `found = false` response.
    async fn get(&self, request: GetDataObjectRequest) -> StorageResult<GetDataObjectResponse>;

    /// Update top-level fields of an existing document.
    async fn update(
        &self,
        request: UpdateDataObjectRequest,
    ) -> StorageResult<UpdateDataObjectResponse>;

    /// Delete a document.
    async fn delete(
        &self,
        request: DeleteDataObjectRequest,
    ) -> StorageResult<DeleteDataObjectResponse>;

    /// Search one or more collections.
    async fn search(
        &self,
        request: SearchDataObjectRequest,
    ) -> StorageResult<SearchDataObjectResponse>;

    /// The backend this client talks to.
    fn backend(&self) -> BackendKind;
}

/// Entry point for data object operations.
#[derive(Clone)]
pub struct SdkClient {
    delegate: Arc<dyn DataObjectClient>,
}

impl fmt::Debug for SdkClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkClient")
            .field("backend", &self.delegate.backend())
            .finish_non_exhaustive()
    }
}

impl SdkClient {
    /// Wrap a backend implementation.
    #[must_use]
    pub fn new(delegate: Arc<dyn DataObjectClient>) -> Self {
        Self { delegate }
    }

    /// The backend selected at construction.
    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.delegate.backend()
    }

    /// Store a document.
    ///
    /// # Errors
    ///
    /// See [`StorageError`](crate::StorageError); a create-only put that finds
    /// an existing document fails with a conflict.
    pub async fn put_data_object(
        &self,
        request: PutDataObjectRequest,
    ) -> StorageResult<PutDataObjectResponse> {
        debug!(backend = %self.backend(), index = %request.index, "put_data_object");
        self.delegate.put(request).await
    }

    /// Read a document.
    ///
    /// # Errors
    ///
    /// Backend and transcoding failures. A missing document is not an error.
    pub async fn get_data_object(
        &self,
        request: GetDataObjectRequest,
    ) -> StorageResult<GetDataObjectResponse> {
        debug!(backend = %self.backend(), index = %request.index, "get_data_object");
        self.delegate.get(request).await
    }

    /// Update a document.
    ///
    /// # Errors
    ///
    /// Version conflicts, missing documents, backend and transcoding failures.
    pub async fn update_data_object(
        &self,
        request: UpdateDataObjectRequest,
    ) -> StorageResult<UpdateDataObjectResponse> {
        debug!(backend = %self.backend(), index = %request.index, "update_data_object");
        self.delegate.update(request).await
    }

    /// Delete a document.
    ///
    /// # Errors
    ///
    /// Backend failures only.
    pub async fn delete_data_object(
        &self,
        request: DeleteDataObjectRequest,
    ) -> StorageResult<DeleteDataObjectResponse> {
        debug!(backend = %self.backend(), index = %request.index, "delete_data_object");
        self.delegate.delete(request).await
    }

    /// Search documents.
    ///
    /// # Errors
    ///
    /// Whatever the search engine reports.
    pub async fn search_data_object(
        &self,
        request: SearchDataObjectRequest,
    ) -> StorageResult<SearchDataObjectResponse> {
        debug!(backend = %self.backend(), indices = ?request.indices, "search_data_object");
        self.delegate.search(request).await
    }
}

// ---------------------------------------------------------------------------
// Construction from configuration
// ---------------------------------------------------------------------------

#[cfg(feature = "config")]
mod from_config {
    use std::sync::Arc;
    use std::time::Duration;

    use docbridge_config::{StorageBackend, StorageSection, TableEngine};
    use tracing::info;

    use super::SdkClient;
    use crate::error::{StorageError, StorageResult};
    use crate::kv_adapter::KvDataObjectClient;
    use crate::native::NativeDataObjectClient;
    use crate::search::HttpSearchClient;
    use crate::table::{MemoryTableClient, TableClient};

    impl SdkClient {
        /// Build the client described by a `[storage]` config section.
        ///
        /// # Errors
        ///
        /// Returns [`StorageError::Configuration`] if an endpoint is invalid,
        /// the key-value backend lacks a remote search endpoint, or the table
        /// engine is unavailable in this build.
        pub fn from_config(section: &StorageSection) -> StorageResult<Self> {
            match section.backend {
                StorageBackend::Native => {
                    let client = NativeDataObjectClient::with_timeout(
                        &section.native.endpoint,
                        Duration::from_secs(section.native.timeout_secs),
                    )?;
                    info!(endpoint = %section.native.endpoint, "Using native storage backend");
                    Ok(Self::new(Arc::new(client)))
                },
                StorageBackend::Kv => {
                    let endpoint = section.remote_search.endpoint.as_deref().ok_or_else(|| {
                        StorageError::Configuration(
                            "storage.remote_search.endpoint is required for the kv backend".into(),
                        )
                    })?;
                    let search = HttpSearchClient::with_timeout(
                        endpoint,
                        Duration::from_secs(section.remote_search.timeout_secs),
                    )?;
                    let table = open_table(section)?;
                    info!(
                        engine = ?section.table.engine,
                        search_endpoint = %endpoint,
                        "Using key-value storage backend"
                    );
                    Ok(Self::new(Arc::new(KvDataObjectClient::new(
                        table,
                        Arc::new(search),
                    ))))
                },
            }
        }
    }

    fn open_table(section: &StorageSection) -> StorageResult<Arc<dyn TableClient>> {
        match section.table.engine {
            TableEngine::Memory => Ok(Arc::new(MemoryTableClient::new())),
            #[cfg(feature = "kv")]
            TableEngine::Surrealkv => {
                let path = section.table.path.as_deref().ok_or_else(|| {
                    StorageError::Configuration(
                        "storage.table.path is required for the surrealkv engine".into(),
                    )
                })?;
                let table = crate::table::SurrealKvTableClient::open(path).map_err(|e| {
                    StorageError::Configuration(format!("failed to open table store: {e}"))
                })?;
                Ok(Arc::new(table))
            },
            #[cfg(not(feature = "kv"))]
            TableEngine::Surrealkv => Err(StorageError::Configuration(
                "the surrealkv table engine requires the `kv` feature".into(),
            )),
        }
    }

}
