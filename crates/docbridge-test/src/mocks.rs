//! Mock implementations for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use docbridge_storage::error::{DocumentContext, StorageError, StorageResult};
use docbridge_storage::key::{ItemKey, tenant_or_default};
use docbridge_storage::privilege;
use docbridge_storage::table::{
    DeleteItemOutput, DeleteItemRequest, GetItemOutput, GetItemRequest, PutItemOutput,
    PutItemRequest, TableClient, TableError, TableResult, UpdateItemOutput, UpdateItemRequest,
};
use docbridge_storage::{SearchClient, SearchDataObjectRequest, SearchDataObjectResponse};

// ---------------------------------------------------------------------------
// MockSearchClient
// ---------------------------------------------------------------------------

/// Search engine stand-in that records every request it receives.
///
/// Answers with queued bodies in order, then with an empty hit list. Uses
/// `std::sync::Mutex` so builders work without a runtime.
#[derive(Debug, Clone, Default)]
pub struct MockSearchClient {
    responses: Arc<Mutex<VecDeque<Value>>>,
    requests: Arc<Mutex<Vec<SearchDataObjectRequest>>>,
    failure_status: Option<u16>,
}

impl MockSearchClient {
    /// Create a mock that answers every search with no hits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response body.
    #[must_use]
    pub fn with_response(self, body: Value) -> Self {
        if let Ok(mut guard) = self.responses.lock() {
            guard.push_back(body);
        }
        self
    }

    /// Fail every search with a backend error carrying `status`.
    #[must_use]
    pub fn failing_with_status(mut self, status: u16) -> Self {
        self.failure_status = Some(status);
        self
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<SearchDataObjectRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// The body returned when nothing is queued.
    #[must_use]
    pub fn empty_response() -> Value {
        json!({
            "took": 1,
            "timed_out": false,
            "hits": {
                "total": {"value": 0, "relation": "eq"},
                "hits": []
            }
        })
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn search(
        &self,
        request: SearchDataObjectRequest,
    ) -> StorageResult<SearchDataObjectResponse> {
        let context = DocumentContext::collection(
            request.indices.join(","),
            tenant_or_default(request.tenant_id.as_deref()),
        );
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request);
        }

        if let Some(status) = self.failure_status {
            return Err(StorageError::Backend {
                context,
                status,
                message: "mock search failure".to_owned(),
            });
        }

        let body = self
            .responses
            .lock()
            .ok()
            .and_then(|mut guard| guard.pop_front())
            .unwrap_or_else(Self::empty_response);
        Ok(SearchDataObjectResponse::new(body))
    }
}

// ---------------------------------------------------------------------------
// FailingTableClient
// ---------------------------------------------------------------------------

/// Table backend that fails every call with the same error.
#[derive(Debug)]
pub struct FailingTableClient {
    error: TableError,
    calls: AtomicUsize,
}

impl FailingTableClient {
    /// Fail with `error`.
    #[must_use]
    pub fn new(error: TableError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail as if the backend were unreachable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(TableError::Unavailable("connection refused".to_owned()))
    }

    /// Number of calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> TableResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

#[async_trait]
impl TableClient for FailingTableClient {
    async fn put_item(&self, _request: PutItemRequest) -> TableResult<PutItemOutput> {
        self.fail()
    }

    async fn get_item(&self, _request: GetItemRequest) -> TableResult<GetItemOutput> {
        self.fail()
    }

    async fn update_item(&self, _request: UpdateItemRequest) -> TableResult<UpdateItemOutput> {
        self.fail()
    }

    async fn delete_item(&self, _request: DeleteItemRequest) -> TableResult<DeleteItemOutput> {
        self.fail()
    }
}

// ---------------------------------------------------------------------------
// SpyTableClient
// ---------------------------------------------------------------------------

/// One call observed by a [`SpyTableClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCall {
    /// `put_item`, `get_item`, `update_item` or `delete_item`.
    pub operation: &'static str,
    /// Physical table addressed.
    pub table: String,
    /// Key addressed.
    pub key: ItemKey,
    /// Whether the call ran inside the adapter's privileged scope.
    pub privileged: bool,
}

/// Table backend wrapper that records calls before delegating.
pub struct SpyTableClient {
    inner: Arc<dyn TableClient>,
    calls: Mutex<Vec<TableCall>>,
}

impl std::fmt::Debug for SpyTableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpyTableClient")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

impl SpyTableClient {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn TableClient>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls observed so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<TableCall> {
        self.calls
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn record(&self, operation: &'static str, table: &str, key: &ItemKey) {
        let call = TableCall {
            operation,
            table: table.to_owned(),
            key: key.clone(),
            privileged: privilege::is_privileged(),
        };
        if let Ok(mut guard) = self.calls.lock() {
            guard.push(call);
        }
    }
}

#[async_trait]
impl TableClient for SpyTableClient {
    async fn put_item(&self, request: PutItemRequest) -> TableResult<PutItemOutput> {
        self.record("put_item", &request.table, &request.key);
        self.inner.put_item(request).await
    }

    async fn get_item(&self, request: GetItemRequest) -> TableResult<GetItemOutput> {
        self.record("get_item", &request.table, &request.key);
        self.inner.get_item(request).await
    }

    async fn update_item(&self, request: UpdateItemRequest) -> TableResult<UpdateItemOutput> {
        self.record("update_item", &request.table, &request.key);
        self.inner.update_item(request).await
    }

    async fn delete_item(&self, request: DeleteItemRequest) -> TableResult<DeleteItemOutput> {
        self.record("delete_item", &request.table, &request.key);
        self.inner.delete_item(request).await
    }
}
