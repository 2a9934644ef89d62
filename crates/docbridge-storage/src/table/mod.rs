//! Key-value table client trait and implementations.
//!
//! The [`TableClient`] trait is the seam between the data object adapter and
//! a partitioned key-value table service. It offers exactly four point
//! operations, each addressed by an [`ItemKey`] within a named table:
//!
//! - conditional put (whole-item replace)
//! - conditional update (attribute-level PUT actions)
//! - get by key
//! - delete by key
//!
//! Implementations:
//!
//! - **In-memory** ([`MemoryTableClient`], always available): for tests and
//!   ephemeral deployments
//! - **`SurrealKV`** (`SurrealKvTableClient`, behind the `kv` feature):
//!   persistent, embedded
//!
//! # Version attribute
//!
//! Write requests may name a `version_attribute`. The backend advances that
//! numeric attribute atomically with the write: `0` when the write creates the
//! item, the stored value plus one otherwise. The adapter uses it to carry
//! sequence numbers, since the table does not version items on its own.

mod memory;
#[cfg(feature = "kv")]
mod surreal;

use async_trait::async_trait;

use crate::attribute::{AttributeMap, AttributeValue};
use crate::condition::Condition;
use crate::key::ItemKey;

pub use memory::MemoryTableClient;
#[cfg(feature = "kv")]
pub use surreal::SurrealKvTableClient;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by a table backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TableError {
    /// The write's condition did not hold. Carries the stored item, if any.
    #[error("conditional check failed")]
    ConditionalCheckFailed {
        /// Item stored at the key when the condition was evaluated.
        existing: Option<AttributeMap>,
    },

    /// The backend could not be reached.
    #[error("table backend unavailable: {0}")]
    Unavailable(String),

    /// The call was made outside the adapter's privileged scope.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Any other backend failure.
    #[error("table backend error: {0}")]
    Internal(String),
}

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

// ---------------------------------------------------------------------------
// Requests and outputs
// ---------------------------------------------------------------------------

/// Replace the whole item at a key.
#[derive(Debug, Clone)]
pub struct PutItemRequest {
    /// Target table.
    pub table: String,
    /// Key of the item.
    pub key: ItemKey,
    /// Non-key attributes to store.
    pub item: AttributeMap,
    /// Condition on the stored item.
    pub condition: Option<Condition>,
    /// Numeric attribute to advance with the write.
    pub version_attribute: Option<String>,
}

/// Output of [`TableClient::put_item`].
#[derive(Debug, Clone, PartialEq)]
pub struct PutItemOutput {
    /// The item as it was before the write.
    pub previous: Option<AttributeMap>,
    /// The item as stored, key and version attributes included.
    pub attributes: AttributeMap,
}

/// Point read.
#[derive(Debug, Clone)]
pub struct GetItemRequest {
    /// Target table.
    pub table: String,
    /// Key of the item.
    pub key: ItemKey,
    /// Request a strongly consistent read.
    pub consistent_read: bool,
}

/// Output of [`TableClient::get_item`].
#[derive(Debug, Clone, PartialEq)]
pub struct GetItemOutput {
    /// The stored item, key attributes included.
    pub item: Option<AttributeMap>,
}

/// Set individual attributes on an item.
#[derive(Debug, Clone)]
pub struct UpdateItemRequest {
    /// Target table.
    pub table: String,
    /// Key of the item.
    pub key: ItemKey,
    /// Attributes to PUT. Unlisted attributes keep their stored value.
    pub updates: AttributeMap,
    /// Condition on the stored item.
    pub condition: Option<Condition>,
    /// Numeric attribute to advance with the write.
    pub version_attribute: Option<String>,
}

/// Output of [`TableClient::update_item`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItemOutput {
    /// The item after the update.
    pub attributes: AttributeMap,
}

/// Remove the item at a key.
#[derive(Debug, Clone)]
pub struct DeleteItemRequest {
    /// Target table.
    pub table: String,
    /// Key of the item.
    pub key: ItemKey,
    /// Condition on the stored item.
    pub condition: Option<Condition>,
}

/// Output of [`TableClient::delete_item`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteItemOutput {
    /// The item that was removed, if there was one.
    pub previous: Option<AttributeMap>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Client for a partitioned key-value table service.
///
/// Handles are long-lived and shared across all concurrent operations, so
/// implementations must not keep per-request state.
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Replace the item at `request.key`, subject to `request.condition`.
    async fn put_item(&self, request: PutItemRequest) -> TableResult<PutItemOutput>;

    /// Read the item at `request.key`.
    async fn get_item(&self, request: GetItemRequest) -> TableResult<GetItemOutput>;

    /// Apply attribute PUTs to the item at `request.key`, creating it if
    /// absent (unless the condition forbids it).
    async fn update_item(&self, request: UpdateItemRequest) -> TableResult<UpdateItemOutput>;

    /// Delete the item at `request.key`. Deleting a missing item succeeds.
    async fn delete_item(&self, request: DeleteItemRequest) -> TableResult<DeleteItemOutput>;
}

// ---------------------------------------------------------------------------
// Shared write helpers
// ---------------------------------------------------------------------------

/// Check `condition` against `existing`, failing with the stored item.
pub(crate) fn check_condition(
    condition: Option<&Condition>,
    existing: Option<&AttributeMap>,
) -> TableResult<()> {
    match condition {
        Some(c) if !c.evaluate(existing) => Err(TableError::ConditionalCheckFailed {
            existing: existing.cloned(),
        }),
        _ => Ok(()),
    }
}

/// Advance `attribute` in `target` relative to the previously stored item.
pub(crate) fn advance_version(
    target: &mut AttributeMap,
    previous: Option<&AttributeMap>,
    attribute: &str,
) -> TableResult<()> {
    let next = match previous.and_then(|p| p.get(attribute)) {
        None => 0,
        Some(stored) => stored
            .as_i64()
            .and_then(|v| v.checked_add(1))
            .ok_or_else(|| {
                TableError::Internal(format!(
                    "version attribute {attribute} holds a non-integral {} value",
                    stored.type_name()
                ))
            })?,
    };
    target.insert(attribute.to_owned(), AttributeValue::n(next));
    Ok(())
}

/// Build the full item for a put: key attributes win over document fields.
pub(crate) fn build_put_item(
    request: &PutItemRequest,
    previous: Option<&AttributeMap>,
) -> TableResult<AttributeMap> {
    let mut item = request.item.clone();
    item.extend(request.key.to_attributes());
    if let Some(attr) = &request.version_attribute {
        advance_version(&mut item, previous, attr)?;
    }
    Ok(item)
}

/// Build the updated item: stored attributes overlaid with the PUT set.
pub(crate) fn build_updated_item(
    request: &UpdateItemRequest,
    previous: Option<&AttributeMap>,
) -> TableResult<AttributeMap> {
    let mut item = previous.cloned().unwrap_or_default();
    item.extend(request.updates.clone());
    item.extend(request.key.to_attributes());
    if let Some(attr) = &request.version_attribute {
        advance_version(&mut item, previous, attr)?;
    }
    Ok(item)
}
