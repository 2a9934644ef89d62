//! Data object store over a key-value table.
//!
//! [`KvDataObjectClient`] emulates document-store semantics on a table that
//! only offers point operations on flat attribute maps:
//!
//! - each collection maps to one table ([`table_for`])
//! - each document is one item keyed by `(tenant, id)` ([`ItemKey`])
//! - documents are transcoded to attribute maps ([`document_to_attributes`])
//! - existence and version checks are conditional writes ([`Condition`])
//! - every write advances the item's `_seq_no`, which is the sequence number
//!   reported back and expected by guarded updates
//!
//! Every operation is one table call (or one remote search call). Races on
//! the same document are decided by the table's conditional write; the
//! loser gets [`StorageError::Conflict`]. Nothing is retried here.
//!
//! Operations run as tasks on the configured executor, inside the
//! adapter's [`privileged`] scope, and the caller awaits the task handle.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use crate::attribute::{
    AttributeMap, AttributeValue, attributes_to_document, document_to_attributes,
};
use crate::client::{BackendKind, DataObjectClient};
use crate::condition::Condition;
use crate::error::{ConflictKind, DocumentContext, StorageError, StorageResult, TranscodeError};
use crate::key::{
    ItemKey, SEQ_NO_KEY, check_reserved, generate_id, strip_key_attributes, strip_reserved,
    table_for, tenant_or_default,
};
use crate::privilege::privileged;
use crate::request::{
    DeleteDataObjectRequest, DeleteDataObjectResponse, GetDataObjectRequest,
    GetDataObjectResponse, PutDataObjectRequest, PutDataObjectResponse, SearchDataObjectRequest,
    SearchDataObjectResponse, UpdateDataObjectRequest, UpdateDataObjectResponse,
};
use crate::response::{DocWriteResult, ExtraField, build_response};
use crate::search::{SearchClient, delegate_search};
use crate::table::{
    DeleteItemRequest, GetItemRequest, PutItemRequest, TableClient, TableError,
    UpdateItemRequest,
};

/// Data object client backed by a key-value table and a remote search engine.
#[derive(Clone)]
pub struct KvDataObjectClient {
    table: Arc<dyn TableClient>,
    search: Arc<dyn SearchClient>,
    executor: Option<Handle>,
}

impl std::fmt::Debug for KvDataObjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvDataObjectClient")
            .field("dedicated_executor", &self.executor.is_some())
            .finish_non_exhaustive()
    }
}

impl KvDataObjectClient {
    /// Create an adapter over `table`, delegating searches to `search`.
    ///
    /// Operations run on the runtime of whoever awaits them unless
    /// [`with_executor`](Self::with_executor) names another.
    #[must_use]
    pub fn new(table: Arc<dyn TableClient>, search: Arc<dyn SearchClient>) -> Self {
        Self {
            table,
            search,
            executor: None,
        }
    }

    /// Run backend calls on a dedicated runtime.
    #[must_use]
    pub fn with_executor(mut self, executor: Handle) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Spawn `operation` onto the executor under the adapter's own context
    /// and wait for it.
    async fn run<T, F>(&self, operation: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let task = privileged(operation);
        let handle = match &self.executor {
            Some(executor) => executor.spawn(task),
            None => Handle::try_current()
                .map_err(|e| StorageError::Internal(format!("no async runtime available: {e}")))?
                .spawn(task),
        };
        handle.await.map_err(|e| {
            error!(error = %e, "Data object task did not complete");
            StorageError::Internal(format!("data object task failed: {e}"))
        })?
    }
}

#[async_trait]
impl DataObjectClient for KvDataObjectClient {
    async fn put(&self, request: PutDataObjectRequest) -> StorageResult<PutDataObjectResponse> {
        self.run(put_item(Arc::clone(&self.table), request)).await
    }

    async fn get(&self, request: GetDataObjectRequest) -> StorageResult<GetDataObjectResponse> {
        self.run(get_item(Arc::clone(&self.table), request)).await
    }

    async fn update(
        &self,
        request: UpdateDataObjectRequest,
    ) -> StorageResult<UpdateDataObjectResponse> {
        self.run(update_item(Arc::clone(&self.table), request)).await
    }

    async fn delete(
        &self,
        request: DeleteDataObjectRequest,
    ) -> StorageResult<DeleteDataObjectResponse> {
        self.run(delete_item(Arc::clone(&self.table), request)).await
    }

    async fn search(
        &self,
        request: SearchDataObjectRequest,
    ) -> StorageResult<SearchDataObjectResponse> {
        let search = Arc::clone(&self.search);
        self.run(async move { delegate_search(search.as_ref(), request).await })
            .await
    }

    fn backend(&self) -> BackendKind {
        BackendKind::KeyValue
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

async fn put_item(
    table: Arc<dyn TableClient>,
    request: PutDataObjectRequest,
) -> StorageResult<PutDataObjectResponse> {
    let id = request.id.clone().unwrap_or_else(generate_id);
    let tenant = tenant_or_default(request.tenant_id.as_deref()).to_owned();
    let context = DocumentContext::new(&request.index, &tenant, &id);
    let table_name = table_for(&request.index)?;
    let key = ItemKey::new(request.tenant_id.as_deref(), &id)?;

    let mut item = transcode_document(&request.data_object, &context)?;
    strip_key_attributes(&mut item);
    check_reserved(&item).map_err(|source| transcode_error(&context, source))?;
    let condition = (!request.overwrite_if_exists).then(Condition::item_absent);

    debug!(
        collection = %request.index,
        tenant = %tenant,
        doc_id = %id,
        table = %table_name,
        condition = ?condition.as_ref().map(ToString::to_string),
        "Putting data object"
    );

    let output = table
        .put_item(PutItemRequest {
            table: table_name,
            key,
            item,
            condition,
            version_attribute: Some(SEQ_NO_KEY.to_owned()),
        })
        .await
        .map_err(|e| table_error(e, &context, ConflictKind::AlreadyExists))?;

    let seq_no = required_seq_no(&output.attributes, &context)?;
    let envelope = build_response(
        &request.index,
        &id,
        Some(request.data_object),
        &[ExtraField::Result(DocWriteResult::Created)],
    )
    .with_sequence(seq_no);
    Ok(PutDataObjectResponse::new(envelope))
}

async fn get_item(
    table: Arc<dyn TableClient>,
    request: GetDataObjectRequest,
) -> StorageResult<GetDataObjectResponse> {
    let tenant = tenant_or_default(request.tenant_id.as_deref()).to_owned();
    let context = DocumentContext::new(&request.index, &tenant, &request.id);
    let table_name = table_for(&request.index)?;
    let key = ItemKey::new(request.tenant_id.as_deref(), &request.id)?;

    debug!(
        collection = %request.index,
        tenant = %tenant,
        doc_id = %request.id,
        table = %table_name,
        "Getting data object"
    );

    let output = table
        .get_item(GetItemRequest {
            table: table_name,
            key,
            consistent_read: true,
        })
        .await
        .map_err(|e| table_error(e, &context, ConflictKind::VersionConflict))?;

    let Some(mut item) = output.item else {
        let envelope = build_response(&request.index, &request.id, None, &[ExtraField::Found(false)]);
        return Ok(GetDataObjectResponse::new(envelope));
    };

    let seq_no = stored_seq_no(&item, &context)?;
    strip_reserved(&mut item);
    let source = restore_document(&item, &context)?;
    let mut envelope = build_response(
        &request.index,
        &request.id,
        Some(source),
        &[ExtraField::Found(true)],
    );
    if let Some(seq_no) = seq_no {
        envelope = envelope.with_sequence(seq_no);
    }
    Ok(GetDataObjectResponse::new(envelope))
}

async fn update_item(
    table: Arc<dyn TableClient>,
    request: UpdateDataObjectRequest,
) -> StorageResult<UpdateDataObjectResponse> {
    let tenant = tenant_or_default(request.tenant_id.as_deref()).to_owned();
    let context = DocumentContext::new(&request.index, &tenant, &request.id);
    let table_name = table_for(&request.index)?;
    let key = ItemKey::new(request.tenant_id.as_deref(), &request.id)?;

    let mut updates = transcode_document(&request.data_object, &context)?;
    // Keys are immutable; the sequence number is ours to manage.
    strip_key_attributes(&mut updates);
    check_reserved(&updates).map_err(|source| transcode_error(&context, source))?;

    let mut condition = Condition::item_present();
    if let Some(expected) = request.if_seq_no {
        condition = condition.and(Condition::seq_no_equals(expected));
    }
    if request.if_primary_term.is_some() {
        debug!(doc_id = %request.id, "Ignoring if_primary_term: the table has a single primary term");
    }

    debug!(
        collection = %request.index,
        tenant = %tenant,
        doc_id = %request.id,
        table = %table_name,
        fields = updates.len(),
        condition = %condition,
        "Updating data object"
    );

    let output = table
        .update_item(UpdateItemRequest {
            table: table_name,
            key,
            updates,
            condition: Some(condition),
            version_attribute: Some(SEQ_NO_KEY.to_owned()),
        })
        .await
        .map_err(|e| table_error(e, &context, ConflictKind::VersionConflict))?;

    let mut item = output.attributes;
    let seq_no = required_seq_no(&item, &context)?;
    strip_reserved(&mut item);
    let source = restore_document(&item, &context)?;
    let envelope = build_response(
        &request.index,
        &request.id,
        Some(source),
        &[ExtraField::Result(DocWriteResult::Updated)],
    )
    .with_sequence(seq_no);
    Ok(UpdateDataObjectResponse::new(envelope))
}

async fn delete_item(
    table: Arc<dyn TableClient>,
    request: DeleteDataObjectRequest,
) -> StorageResult<DeleteDataObjectResponse> {
    let tenant = tenant_or_default(request.tenant_id.as_deref()).to_owned();
    let context = DocumentContext::new(&request.index, &tenant, &request.id);
    let table_name = table_for(&request.index)?;
    let key = ItemKey::new(request.tenant_id.as_deref(), &request.id)?;

    debug!(
        collection = %request.index,
        tenant = %tenant,
        doc_id = %request.id,
        table = %table_name,
        "Deleting data object"
    );

    let output = table
        .delete_item(DeleteItemRequest {
            table: table_name,
            key,
            condition: None,
        })
        .await
        .map_err(|e| table_error(e, &context, ConflictKind::VersionConflict))?;

    let envelope = build_response(
        &request.index,
        &request.id,
        None,
        &[ExtraField::Result(DocWriteResult::Deleted)],
    );
    // An unreadable sequence number falls back to the unassigned sentinel.
    let deleted_seq_no = output
        .previous
        .as_ref()
        .and_then(|item| item.get(SEQ_NO_KEY))
        .and_then(AttributeValue::as_i64)
        .and_then(|seq| seq.checked_add(1));
    let envelope = match deleted_seq_no {
        Some(seq_no) => envelope.with_sequence(seq_no),
        None => {
            if output.previous.is_some() {
                warn!(%context, "Deleted item carried no readable sequence number");
            }
            envelope
        },
    };
    Ok(DeleteDataObjectResponse::new(envelope))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn transcode_error(context: &DocumentContext, source: TranscodeError) -> StorageError {
    StorageError::Transcode {
        context: context.clone(),
        source,
    }
}

fn transcode_document(document: &Value, context: &DocumentContext) -> StorageResult<AttributeMap> {
    document_to_attributes(document).map_err(|source| transcode_error(context, source))
}

fn restore_document(item: &AttributeMap, context: &DocumentContext) -> StorageResult<Value> {
    attributes_to_document(item).map_err(|source| transcode_error(context, source))
}

/// The item's sequence number, if it has one. Items written before sequence
/// tracking have none.
fn stored_seq_no(item: &AttributeMap, context: &DocumentContext) -> StorageResult<Option<i64>> {
    item.get(SEQ_NO_KEY)
        .map(|value| {
            value.as_i64().ok_or_else(|| {
                transcode_error(
                    context,
                    TranscodeError::MalformedNumber {
                        value: format!("{SEQ_NO_KEY} ({})", value.type_name()),
                    },
                )
            })
        })
        .transpose()
}

/// The sequence number of an item this adapter just wrote.
fn required_seq_no(item: &AttributeMap, context: &DocumentContext) -> StorageResult<i64> {
    stored_seq_no(item, context)?.ok_or_else(|| {
        StorageError::Internal(format!(
            "table did not report {SEQ_NO_KEY} for written item {context}"
        ))
    })
}

/// Translate a table failure, attaching the document context.
///
/// A failed condition with a stored item is a conflict of `kind`; without
/// one the document does not exist.
fn table_error(err: TableError, context: &DocumentContext, kind: ConflictKind) -> StorageError {
    match err {
        TableError::ConditionalCheckFailed { existing: Some(_) } => {
            warn!(%context, %kind, "Conditional write rejected");
            StorageError::Conflict {
                context: context.clone(),
                kind,
            }
        },
        TableError::ConditionalCheckFailed { existing: None } => {
            warn!(%context, "Conditional write found no document");
            StorageError::DocumentMissing {
                context: context.clone(),
            }
        },
        TableError::Unavailable(message) => {
            error!(%context, %message, "Table backend unavailable");
            StorageError::BackendUnavailable {
                context: context.clone(),
                message,
            }
        },
        TableError::AccessDenied(message) => {
            error!(%context, %message, "Table backend denied access");
            StorageError::AccessDenied(format!("{context}: {message}"))
        },
        TableError::Internal(message) => {
            error!(%context, %message, "Table backend failed");
            StorageError::Internal(format!("{context}: {message}"))
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::key::{HASH_KEY, RANGE_KEY};
    use crate::request::SearchDataObjectResponse;
    use crate::response::{NOT_FOUND_VERSION, UNASSIGNED_SEQ_NO};
    use crate::table::MemoryTableClient;

    struct NoSearch;

    #[async_trait]
    impl SearchClient for NoSearch {
        async fn search(
            &self,
            request: SearchDataObjectRequest,
        ) -> StorageResult<SearchDataObjectResponse> {
            Ok(SearchDataObjectResponse::new(json!({ "indices": request.indices })))
        }
    }

    fn adapter() -> (KvDataObjectClient, Arc<MemoryTableClient>) {
        let table = Arc::new(MemoryTableClient::new().require_privileged());
        let client = KvDataObjectClient::new(table.clone(), Arc::new(NoSearch));
        (client, table)
    }

    #[tokio::test]
    async fn test_put_assigns_id_and_sequence() {
        let (client, _) = adapter();
        let doc = json!({"name": "model", "config": {"layers": [1, 2]}});
        let resp = client
            .put(PutDataObjectRequest::new(".ml.models", doc.clone()))
            .await
            .unwrap();
        assert!(uuid::Uuid::parse_str(resp.id()).is_ok());
        assert_eq!(resp.seq_no(), 0);
        assert_eq!(resp.result(), Some(DocWriteResult::Created));
        assert_eq!(resp.envelope().index, ".ml.models");
        assert_eq!(resp.envelope().source.as_ref(), Some(&doc));
    }

    #[tokio::test]
    async fn test_put_writes_key_attributes() {
        let (client, table) = adapter();
        client
            .put(
                PutDataObjectRequest::new("a.b", json!({"x": true}))
                    .with_id("d1")
                    .with_tenant_id("acme"),
            )
            .await
            .unwrap();
        let key = ItemKey::new(Some("acme"), "d1").unwrap();
        let item = table.raw_item("ab", &key).unwrap();
        assert_eq!(item[HASH_KEY].as_s(), Some("acme"));
        assert_eq!(item[RANGE_KEY].as_s(), Some("d1"));
        assert_eq!(item[SEQ_NO_KEY].as_i64(), Some(0));
    }

    #[tokio::test]
    async fn test_put_rejects_seq_no_attribute() {
        let (client, table) = adapter();
        let err = client
            .put(PutDataObjectRequest::new("c", json!({"_seq_no": 9})).with_id("d"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Transcode {
                source: TranscodeError::ReservedAttribute { ref name },
                ..
            } if name == SEQ_NO_KEY
        ));
        assert_eq!(table.item_count("c"), 0);
    }

    #[tokio::test]
    async fn test_put_key_attributes_yield_to_request() {
        let (client, table) = adapter();
        let resp = client
            .put(
                PutDataObjectRequest::new(
                    "c",
                    json!({"_id": "spoofed", "_tenant_id": "other", "name": "m"}),
                )
                .with_id("x")
                .with_tenant_id("acme"),
            )
            .await
            .unwrap();
        assert_eq!(resp.id(), "x");
        assert_eq!(resp.seq_no(), 0);

        let key = ItemKey::new(Some("acme"), "x").unwrap();
        let item = table.raw_item("c", &key).unwrap();
        assert_eq!(item[HASH_KEY].as_s(), Some("acme"));
        assert_eq!(item[RANGE_KEY].as_s(), Some("x"));
        assert!(table.raw_item("c", &ItemKey::new(Some("other"), "spoofed").unwrap()).is_none());

        let got = client
            .get(GetDataObjectRequest::new("c", "x").with_tenant_id("acme"))
            .await
            .unwrap();
        assert_eq!(got.source(), Some(&json!({"name": "m"})));
    }

    #[tokio::test]
    async fn test_put_rejects_non_object() {
        let (client, _) = adapter();
        let err = client
            .put(PutDataObjectRequest::new("c", json!([1, 2])))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.context().unwrap().collection, "c");
    }

    #[tokio::test]
    async fn test_create_only_put_conflicts() {
        let (client, table) = adapter();
        let put = PutDataObjectRequest::new("c", json!({"v": 1}))
            .with_id("d")
            .with_overwrite_if_exists(false);
        client.put(put.clone()).await.unwrap();
        let err = client.put(put).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Conflict {
                kind: ConflictKind::AlreadyExists,
                ..
            }
        ));
        assert_eq!(table.item_count("c"), 1);
    }

    #[tokio::test]
    async fn test_overwrite_advances_sequence() {
        let (client, _) = adapter();
        let put = PutDataObjectRequest::new("c", json!({"v": 1})).with_id("d");
        assert_eq!(client.put(put.clone()).await.unwrap().seq_no(), 0);
        assert_eq!(client.put(put).await.unwrap().seq_no(), 1);
    }

    #[tokio::test]
    async fn test_get_round_trip_strips_internal_attributes() {
        let (client, _) = adapter();
        let doc = json!({"name": "m", "n": null, "tags": ["a", 1, false]});
        client
            .put(PutDataObjectRequest::new("c", doc.clone()).with_id("d"))
            .await
            .unwrap();

        let resp = client
            .get(GetDataObjectRequest::new("c", "d"))
            .await
            .unwrap();
        assert!(resp.found());
        assert_eq!(resp.source(), Some(&doc));
        assert_eq!(resp.seq_no(), 0);
        assert_eq!(resp.envelope().version, 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_an_error() {
        let (client, _) = adapter();
        let resp = client
            .get(GetDataObjectRequest::new("c", "nope"))
            .await
            .unwrap();
        assert!(!resp.found());
        assert!(resp.source().is_none());
        assert_eq!(resp.seq_no(), UNASSIGNED_SEQ_NO);
        assert_eq!(resp.envelope().version, NOT_FOUND_VERSION);
    }

    #[tokio::test]
    async fn test_update_merges_and_reports_post_image() {
        let (client, _) = adapter();
        client
            .put(PutDataObjectRequest::new("c", json!({"a": 1, "b": 2})).with_id("d"))
            .await
            .unwrap();

        let resp = client
            .update(
                UpdateDataObjectRequest::new("c", "d", json!({"b": 3, "_id": "ignored"}))
                    .with_if_seq_no(0),
            )
            .await
            .unwrap();
        assert_eq!(resp.result(), Some(DocWriteResult::Updated));
        assert_eq!(resp.seq_no(), 1);
        assert_eq!(resp.source(), Some(&json!({"a": 1, "b": 3})));
        assert_eq!(resp.id(), "d");
    }

    #[tokio::test]
    async fn test_update_with_stale_sequence_conflicts() {
        let (client, _) = adapter();
        client
            .put(PutDataObjectRequest::new("c", json!({"a": 1})).with_id("d"))
            .await
            .unwrap();
        client
            .update(UpdateDataObjectRequest::new("c", "d", json!({"a": 2})).with_if_seq_no(0))
            .await
            .unwrap();

        let err = client
            .update(UpdateDataObjectRequest::new("c", "d", json!({"a": 3})).with_if_seq_no(0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Conflict {
                kind: ConflictKind::VersionConflict,
                ..
            }
        ));

        let current = client.get(GetDataObjectRequest::new("c", "d")).await.unwrap();
        assert_eq!(current.source(), Some(&json!({"a": 2})));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let (client, table) = adapter();
        let err = client
            .update(UpdateDataObjectRequest::new("c", "ghost", json!({"a": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DocumentMissing { .. }));
        assert_eq!(err.status_code(), 404);
        assert_eq!(table.item_count("c"), 0);
    }

    #[tokio::test]
    async fn test_update_rejects_sequence_override() {
        let (client, _) = adapter();
        client
            .put(PutDataObjectRequest::new("c", json!({"a": 1})).with_id("d"))
            .await
            .unwrap();
        let err = client
            .update(UpdateDataObjectRequest::new("c", "d", json!({"_seq_no": 100})))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Transcode { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (client, table) = adapter();
        client
            .put(PutDataObjectRequest::new("c", json!({"a": 1})).with_id("d"))
            .await
            .unwrap();

        let first = client
            .delete(DeleteDataObjectRequest::new("c", "d"))
            .await
            .unwrap();
        assert_eq!(first.result(), Some(DocWriteResult::Deleted));
        assert_eq!(first.seq_no(), 1);
        assert!(first.envelope().source.is_none());

        let second = client
            .delete(DeleteDataObjectRequest::new("c", "d"))
            .await
            .unwrap();
        assert_eq!(second.result(), Some(DocWriteResult::Deleted));
        assert_eq!(second.seq_no(), UNASSIGNED_SEQ_NO);
        assert_eq!(table.item_count("c"), 0);
    }

    #[tokio::test]
    async fn test_search_resolves_tables() {
        let (client, _) = adapter();
        let resp = client
            .search(SearchDataObjectRequest::new(["a.b", "c", ".d*"], json!({})))
            .await
            .unwrap();
        assert_eq!(resp.body(), &json!({"indices": ["ab", "c", "d*"]}));
    }

    #[tokio::test]
    async fn test_empty_tenant_rejected() {
        let (client, _) = adapter();
        let err = client
            .get(GetDataObjectRequest::new("c", "d").with_tenant_id(""))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidRequest(_)));
    }

    #[test]
    fn test_dedicated_executor() {
        let worker = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let caller = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let table = Arc::new(MemoryTableClient::new().require_privileged());
        let client = KvDataObjectClient::new(table, Arc::new(NoSearch))
            .with_executor(worker.handle().clone());
        let resp = caller.block_on(async {
            client
                .put(PutDataObjectRequest::new("c", json!({"a": 1})).with_id("d"))
                .await
        });
        assert_eq!(resp.unwrap().seq_no(), 0);
        worker.shutdown_background();
    }

    #[test]
    fn test_table_error_mapping() {
        let ctx = DocumentContext::new("c", "t", "d");
        let err = table_error(
            TableError::Unavailable("down".into()),
            &ctx,
            ConflictKind::VersionConflict,
        );
        assert!(err.is_retryable());
        assert_eq!(err.context(), Some(&ctx));

        let err = table_error(
            TableError::ConditionalCheckFailed {
                existing: Some(AttributeMap::new()),
            },
            &ctx,
            ConflictKind::AlreadyExists,
        );
        assert!(err.is_conflict());
        assert!(!err.is_retryable());
    }
}
