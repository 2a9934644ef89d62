//! Persistent table backend over an embedded `SurrealKV` tree.
//!
//! Each item is one tree entry keyed `"{table}\0{tenant}\0{id}"` whose value
//! is the JSON encoding of its attribute map. Conditional writes hold a
//! per-key async lock across the read, the condition check and the commit,
//! so two writers racing on one item serialise while writers on different
//! items never contend.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    DeleteItemOutput, DeleteItemRequest, GetItemOutput, GetItemRequest, PutItemOutput,
    PutItemRequest, TableClient, TableError, TableResult, UpdateItemOutput, UpdateItemRequest,
    build_put_item, build_updated_item, check_condition,
};
use crate::attribute::AttributeMap;
use crate::key::ItemKey;

/// Table service persisted in a local `SurrealKV` directory.
///
/// # Example
///
/// ```rust,ignore
/// use docbridge_storage::table::SurrealKvTableClient;
///
/// let tables = SurrealKvTableClient::open("./data/tables")?;
/// ```
pub struct SurrealKvTableClient {
    tree: surrealkv::Tree,
    item_locks: DashMap<Vec<u8>, Arc<Mutex<()>>>,
}

impl std::fmt::Debug for SurrealKvTableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrealKvTableClient")
            .field("locked_items", &self.item_locks.len())
            .finish_non_exhaustive()
    }
}

impl SurrealKvTableClient {
    /// Open (or create) a table store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Unavailable`] if the tree cannot be opened.
    pub fn open(path: impl AsRef<std::path::Path>) -> TableResult<Self> {
        let tree = surrealkv::TreeBuilder::new()
            .with_path(path.as_ref().to_path_buf())
            .build()
            .map_err(|e| TableError::Unavailable(e.to_string()))?;
        Ok(Self {
            tree,
            item_locks: DashMap::new(),
        })
    }

    /// Flush pending writes and close the tree.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Internal`] if the flush fails.
    pub async fn close(&self) -> TableResult<()> {
        self.tree.close().await.map_err(|ref e| map_kv_err(e))
    }

    fn read(&self, key: &[u8]) -> TableResult<Option<AttributeMap>> {
        let tx = self
            .tree
            .begin_with_mode(surrealkv::Mode::ReadOnly)
            .map_err(|ref e| map_kv_err(e))?;
        tx.get(key)
            .map_err(|ref e| map_kv_err(e))?
            .map(|bytes| decode_item(&bytes))
            .transpose()
    }

    async fn write(&self, key: &[u8], item: &AttributeMap) -> TableResult<()> {
        let bytes = serde_json::to_vec(item)
            .map_err(|e| TableError::Internal(format!("failed to encode item: {e}")))?;
        let mut tx = self.tree.begin().map_err(|ref e| map_kv_err(e))?;
        tx.set(key, &bytes).map_err(|ref e| map_kv_err(e))?;
        tx.commit().await.map_err(|ref e| map_kv_err(e))
    }

    fn lock_for(&self, key: &[u8]) -> Arc<Mutex<()>> {
        self.item_locks
            .entry(key.to_vec())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock entry once nobody else holds or waits on it.
    fn release(&self, key: &[u8], lock: Arc<Mutex<()>>) {
        drop(lock);
        self.item_locks.remove_if(key, |_, l| Arc::strong_count(l) == 1);
    }
}

fn map_kv_err(e: &surrealkv::Error) -> TableError {
    TableError::Internal(e.to_string())
}

fn decode_item(bytes: &[u8]) -> TableResult<AttributeMap> {
    serde_json::from_slice(bytes)
        .map_err(|e| TableError::Internal(format!("stored item is not a valid attribute map: {e}")))
}

/// Build `"{table}\0{tenant}\0{id}"`. No part may contain a null byte.
fn composite_key(table: &str, key: &ItemKey) -> TableResult<Vec<u8>> {
    let parts = [table, key.tenant(), key.id()];
    if parts.iter().any(|p| p.contains('\0')) {
        return Err(TableError::Internal(
            "table names and key values must not contain null bytes".into(),
        ));
    }
    Ok(parts.join("\0").into_bytes())
}

#[async_trait]
impl TableClient for SurrealKvTableClient {
    async fn put_item(&self, request: PutItemRequest) -> TableResult<PutItemOutput> {
        let ck = composite_key(&request.table, &request.key)?;
        let lock = self.lock_for(&ck);
        let result: TableResult<_> = async {
            let _guard = lock.lock().await;
            let previous = self.read(&ck)?;
            check_condition(request.condition.as_ref(), previous.as_ref())?;
            let item = build_put_item(&request, previous.as_ref())?;
            self.write(&ck, &item).await?;
            Ok(PutItemOutput {
                previous,
                attributes: item,
            })
        }
        .await;
        self.release(&ck, lock);
        debug!(table = %request.table, ok = result.is_ok(), "surrealkv put_item");
        result
    }

    async fn get_item(&self, request: GetItemRequest) -> TableResult<GetItemOutput> {
        let ck = composite_key(&request.table, &request.key)?;
        Ok(GetItemOutput {
            item: self.read(&ck)?,
        })
    }

    async fn update_item(&self, request: UpdateItemRequest) -> TableResult<UpdateItemOutput> {
        let ck = composite_key(&request.table, &request.key)?;
        let lock = self.lock_for(&ck);
        let result: TableResult<_> = async {
            let _guard = lock.lock().await;
            let previous = self.read(&ck)?;
            check_condition(request.condition.as_ref(), previous.as_ref())?;
            let item = build_updated_item(&request, previous.as_ref())?;
            self.write(&ck, &item).await?;
            Ok(UpdateItemOutput { attributes: item })
        }
        .await;
        self.release(&ck, lock);
        result
    }

    async fn delete_item(&self, request: DeleteItemRequest) -> TableResult<DeleteItemOutput> {
        let ck = composite_key(&request.table, &request.key)?;
        let lock = self.lock_for(&ck);
        let result: TableResult<_> = async {
            let _guard = lock.lock().await;
            let previous = self.read(&ck)?;
            check_condition(request.condition.as_ref(), previous.as_ref())?;
            if previous.is_some() {
                let mut tx = self.tree.begin().map_err(|ref e| map_kv_err(e))?;
                tx.delete(&ck).map_err(|ref e| map_kv_err(e))?;
                tx.commit().await.map_err(|ref e| map_kv_err(e))?;
            }
            Ok(DeleteItemOutput { previous })
        }
        .await;
        self.release(&ck, lock);
        result
    }
}
