//! Table calls run inside the adapter's privileged scope.

use std::sync::Arc;

use docbridge_storage::privilege::{self, ExecutionContext};
use docbridge_storage::{
    DeleteDataObjectRequest, GetDataObjectRequest, KvDataObjectClient, MemoryTableClient,
    PutDataObjectRequest, SdkClient, UpdateDataObjectRequest,
};
use docbridge_telemetry::RequestContext;
use docbridge_test::{MockSearchClient, SpyTableClient, init_test_logging};
use serde_json::json;
use tracing::Instrument;

#[tokio::test]
async fn test_every_table_call_is_privileged() {
    init_test_logging();
    let spy = Arc::new(SpyTableClient::new(Arc::new(MemoryTableClient::new())));
    let client = SdkClient::new(Arc::new(KvDataObjectClient::new(
        spy.clone(),
        Arc::new(MockSearchClient::new()),
    )));

    let span = RequestContext::new("lifecycle")
        .with_collection("c")
        .with_tenant("alpha")
        .span();
    privilege::as_caller(Some("alice".to_owned()), async {
        assert!(!privilege::is_privileged());
        client
            .put_data_object(PutDataObjectRequest::new("c", json!({"a": 1})).with_id("x"))
            .await
            .unwrap();
        client
            .get_data_object(GetDataObjectRequest::new("c", "x"))
            .await
            .unwrap();
        client
            .update_data_object(UpdateDataObjectRequest::new("c", "x", json!({"a": 2})))
            .await
            .unwrap();
        client
            .delete_data_object(DeleteDataObjectRequest::new("c", "x"))
            .await
            .unwrap();
        assert_eq!(
            privilege::current_context(),
            ExecutionContext::Caller {
                principal: Some("alice".to_owned())
            }
        );
    })
    .instrument(span)
    .await;

    let calls = spy.calls();
    let operations: Vec<_> = calls.iter().map(|c| c.operation).collect();
    assert_eq!(
        operations,
        vec!["put_item", "get_item", "update_item", "delete_item"]
    );
    assert!(calls.iter().all(|c| c.privileged));
    assert!(calls.iter().all(|c| c.table == "c"));
}

#[tokio::test]
async fn test_strict_table_rejects_direct_callers() {
    use docbridge_storage::table::{GetItemRequest, TableClient, TableError};

    let table = MemoryTableClient::new().require_privileged();
    let err = table
        .get_item(GetItemRequest {
            table: "c".to_owned(),
            key: docbridge_storage::ItemKey::new(None, "x").unwrap(),
            consistent_read: true,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, TableError::AccessDenied(_)));

    // Through the adapter the same table answers normally.
    let client = SdkClient::new(Arc::new(KvDataObjectClient::new(
        Arc::new(table),
        Arc::new(MockSearchClient::new()),
    )));
    let get = client
        .get_data_object(GetDataObjectRequest::new("c", "x"))
        .await
        .unwrap();
    assert!(!get.found());
}
