//! In-memory table backend.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{
    DeleteItemOutput, DeleteItemRequest, GetItemOutput, GetItemRequest, PutItemOutput,
    PutItemRequest, TableClient, TableError, TableResult, UpdateItemOutput, UpdateItemRequest,
    build_put_item, build_updated_item, check_condition,
};
use crate::attribute::AttributeMap;
use crate::key::ItemKey;
use crate::privilege;

/// Full address of one item: table plus primary key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    table: String,
    key: ItemKey,
}

impl RecordKey {
    fn new(table: &str, key: &ItemKey) -> Self {
        Self {
            table: table.to_owned(),
            key: key.clone(),
        }
    }
}

/// In-memory table service for tests and ephemeral data.
///
/// Conditions are evaluated under the shard lock of the item's entry, so a
/// conditional write and the read it depends on are atomic with respect to
/// every other operation on the same key. Tables spring into existence on
/// first write.
#[derive(Debug, Default)]
pub struct MemoryTableClient {
    items: DashMap<RecordKey, AttributeMap>,
    require_privileged: bool,
}

impl MemoryTableClient {
    /// Create a new empty table service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject calls made outside [`privileged`](crate::privilege::privileged).
    #[must_use]
    pub fn require_privileged(mut self) -> Self {
        self.require_privileged = true;
        self
    }

    /// Number of items stored in `table`.
    #[must_use]
    pub fn item_count(&self, table: &str) -> usize {
        self.items.iter().filter(|e| e.key().table == table).count()
    }

    /// Raw stored item, bypassing the privilege check. Intended for tests.
    #[must_use]
    pub fn raw_item(&self, table: &str, key: &ItemKey) -> Option<AttributeMap> {
        self.items
            .get(&RecordKey::new(table, key))
            .map(|e| e.value().clone())
    }

    fn authorize(&self, operation: &str) -> TableResult<()> {
        if self.require_privileged && !privilege::is_privileged() {
            return Err(TableError::AccessDenied(format!(
                "{operation} requires the adapter's execution context"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TableClient for MemoryTableClient {
    async fn put_item(&self, request: PutItemRequest) -> TableResult<PutItemOutput> {
        self.authorize("put_item")?;
        match self.items.entry(RecordKey::new(&request.table, &request.key)) {
            Entry::Occupied(mut entry) => {
                check_condition(request.condition.as_ref(), Some(entry.get()))?;
                let item = build_put_item(&request, Some(entry.get()))?;
                let previous = entry.insert(item.clone());
                Ok(PutItemOutput {
                    previous: Some(previous),
                    attributes: item,
                })
            },
            Entry::Vacant(entry) => {
                check_condition(request.condition.as_ref(), None)?;
                let item = build_put_item(&request, None)?;
                entry.insert(item.clone());
                Ok(PutItemOutput {
                    previous: None,
                    attributes: item,
                })
            },
        }
    }

    async fn get_item(&self, request: GetItemRequest) -> TableResult<GetItemOutput> {
        self.authorize("get_item")?;
        let item = self
            .items
            .get(&RecordKey::new(&request.table, &request.key))
            .map(|e| e.value().clone());
        Ok(GetItemOutput { item })
    }

    async fn update_item(&self, request: UpdateItemRequest) -> TableResult<UpdateItemOutput> {
        self.authorize("update_item")?;
        match self.items.entry(RecordKey::new(&request.table, &request.key)) {
            Entry::Occupied(mut entry) => {
                check_condition(request.condition.as_ref(), Some(entry.get()))?;
                let item = build_updated_item(&request, Some(entry.get()))?;
                entry.insert(item.clone());
                Ok(UpdateItemOutput { attributes: item })
            },
            Entry::Vacant(entry) => {
                check_condition(request.condition.as_ref(), None)?;
                let item = build_updated_item(&request, None)?;
                entry.insert(item.clone());
                Ok(UpdateItemOutput { attributes: item })
            },
        }
    }

    async fn delete_item(&self, request: DeleteItemRequest) -> TableResult<DeleteItemOutput> {
        self.authorize("delete_item")?;
        match self.items.entry(RecordKey::new(&request.table, &request.key)) {
            Entry::Occupied(entry) => {
                check_condition(request.condition.as_ref(), Some(entry.get()))?;
                let (_, previous) = entry.remove_entry();
                Ok(DeleteItemOutput {
                    previous: Some(previous),
                })
            },
            Entry::Vacant(_) => {
                check_condition(request.condition.as_ref(), None)?;
                Ok(DeleteItemOutput { previous: None })
            },
        }
    }
}
