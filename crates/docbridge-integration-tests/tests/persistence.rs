//! Documents survive a restart of the on-disk table engine.

use std::sync::Arc;

use docbridge_storage::{
    GetDataObjectRequest, KvDataObjectClient, PutDataObjectRequest, SdkClient,
    SurrealKvTableClient, UpdateDataObjectRequest,
};
use docbridge_test::{MockSearchClient, init_test_logging, sample_connector};
use serde_json::json;

fn client_over(table: Arc<SurrealKvTableClient>) -> SdkClient {
    SdkClient::new(Arc::new(KvDataObjectClient::new(
        table,
        Arc::new(MockSearchClient::new()),
    )))
}

#[tokio::test]
async fn test_documents_and_sequence_survive_reopen() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();

    {
        let table = Arc::new(SurrealKvTableClient::open(dir.path()).unwrap());
        let client = client_over(table.clone());
        client
            .put_data_object(
                PutDataObjectRequest::new(".plugins-ml-connector", sample_connector())
                    .with_id("c-1")
                    .with_tenant_id("alpha"),
            )
            .await
            .unwrap();
        client
            .update_data_object(
                UpdateDataObjectRequest::new(".plugins-ml-connector", "c-1", json!({"version": 2}))
                    .with_tenant_id("alpha")
                    .with_if_seq_no(0),
            )
            .await
            .unwrap();
        table.close().await.unwrap();
    }

    let table = Arc::new(SurrealKvTableClient::open(dir.path()).unwrap());
    let client = client_over(table.clone());
    let get = client
        .get_data_object(
            GetDataObjectRequest::new(".plugins-ml-connector", "c-1").with_tenant_id("alpha"),
        )
        .await
        .unwrap();

    let mut expected = sample_connector();
    expected["version"] = json!(2);
    assert!(get.found());
    assert_eq!(get.source(), Some(&expected));
    assert_eq!(get.seq_no(), 1);
    table.close().await.unwrap();
}
