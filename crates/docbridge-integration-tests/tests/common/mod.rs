//! Shared helpers for integration tests.

#![allow(dead_code)]

use docbridge_storage::{GetDataObjectRequest, SdkClient};
use docbridge_test::{KvHarness, init_test_logging};
use serde_json::Value;

/// A key-value harness with test logging installed.
pub fn kv() -> KvHarness {
    init_test_logging();
    KvHarness::new()
}

/// Fetch a document's source, or `None` if it does not exist.
pub async fn fetch(client: &SdkClient, collection: &str, tenant: &str, id: &str) -> Option<Value> {
    client
        .get_data_object(GetDataObjectRequest::new(collection, id).with_tenant_id(tenant))
        .await
        .unwrap()
        .source()
        .cloned()
}
