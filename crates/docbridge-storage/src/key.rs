//! Table naming and item keys.
//!
//! Every logical collection maps to one physical table. Items in that table
//! are keyed by `(tenant, document id)`: the tenant is the partition key and
//! the document id is the sort key, so two tenants may reuse the same id.

use crate::attribute::{AttributeMap, AttributeValue};
use crate::error::{StorageError, StorageResult, TranscodeError};

/// Tenant substituted when a request does not name one.
pub const DEFAULT_TENANT: &str = "DEFAULT_TENANT";

/// Partition key attribute (tenant).
pub const HASH_KEY: &str = "_tenant_id";

/// Sort key attribute (document id).
pub const RANGE_KEY: &str = "_id";

/// Sequence number attribute used for optimistic concurrency.
pub const SEQ_NO_KEY: &str = "_seq_no";

/// Attribute names the adapter manages itself. Key attributes in caller
/// documents are overridden by the request; `_seq_no` is rejected.
pub const RESERVED_ATTRIBUTES: [&str; 3] = [HASH_KEY, RANGE_KEY, SEQ_NO_KEY];

/// Derive the physical table name for a collection.
///
/// Table names only allow `[A-Za-z0-9_-]`, so separators such as `.` are
/// removed. The mapping is pure: the same collection always lands in the
/// same table, and applying it twice changes nothing.
#[must_use]
pub fn resolve_table(collection: &str) -> String {
    collection
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Like [`resolve_table`], but rejects collections that resolve to nothing.
///
/// # Errors
///
/// Returns [`StorageError::InvalidRequest`] if no legal characters remain.
pub fn table_for(collection: &str) -> StorageResult<String> {
    let table = resolve_table(collection);
    if table.is_empty() {
        return Err(StorageError::InvalidRequest(format!(
            "collection {collection:?} does not map to a valid table name"
        )));
    }
    Ok(table)
}

/// Derive the remote index name (or pattern) searched for a collection.
///
/// Same mapping as [`resolve_table`], except that `*` wildcards survive so
/// index patterns still match every mirrored table.
///
/// # Errors
///
/// Returns [`StorageError::InvalidRequest`] if nothing remains.
pub fn index_for(collection: &str) -> StorageResult<String> {
    let index: String = collection
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '*'))
        .collect();
    if index.is_empty() {
        return Err(StorageError::InvalidRequest(format!(
            "collection {collection:?} does not map to a valid index name"
        )));
    }
    Ok(index)
}

/// Generate a fresh document id.
#[must_use]
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The two-part primary key of one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    /// Partition key value (tenant).
    pub partition_key: String,
    /// Sort key value (document id).
    pub sort_key: String,
}

impl ItemKey {
    /// Build the key for `id` within `tenant` (or the default tenant).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidRequest`] if `id` is empty or `tenant`
    /// is explicitly given as an empty string.
    pub fn new(tenant: Option<&str>, id: &str) -> StorageResult<Self> {
        if id.is_empty() {
            return Err(StorageError::InvalidRequest(
                "document id must not be empty".into(),
            ));
        }
        let partition_key = match tenant {
            Some("") => {
                return Err(StorageError::InvalidRequest(
                    "tenant id must not be empty".into(),
                ));
            },
            Some(t) => t.to_owned(),
            None => DEFAULT_TENANT.to_owned(),
        };
        Ok(Self {
            partition_key,
            sort_key: id.to_owned(),
        })
    }

    /// The tenant this key belongs to.
    #[must_use]
    pub fn tenant(&self) -> &str {
        &self.partition_key
    }

    /// The document id this key addresses.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.sort_key
    }

    /// Both key attributes, ready to merge into an item.
    #[must_use]
    pub fn to_attributes(&self) -> AttributeMap {
        let mut attrs = AttributeMap::new();
        attrs.insert(HASH_KEY.to_owned(), AttributeValue::s(&self.partition_key));
        attrs.insert(RANGE_KEY.to_owned(), AttributeValue::s(&self.sort_key));
        attrs
    }
}

/// Resolve the tenant a request runs under.
#[must_use]
pub fn tenant_or_default(tenant: Option<&str>) -> &str {
    tenant.unwrap_or(DEFAULT_TENANT)
}

/// Reject caller documents that set adapter-managed attributes.
///
/// # Errors
///
/// Returns [`TranscodeError::ReservedAttribute`] naming the first offender.
pub fn check_reserved(attributes: &AttributeMap) -> Result<(), TranscodeError> {
    match RESERVED_ATTRIBUTES
        .iter()
        .find(|name| attributes.contains_key(**name))
    {
        Some(name) => Err(TranscodeError::ReservedAttribute {
            name: (*name).to_owned(),
        }),
        None => Ok(()),
    }
}

/// Drop key attributes from a caller document. The request's own tenant and
/// id always win over whatever the document claims.
pub fn strip_key_attributes(attributes: &mut AttributeMap) {
    attributes.remove(HASH_KEY);
    attributes.remove(RANGE_KEY);
}

/// Remove adapter-managed attributes from a stored item.
pub fn strip_reserved(attributes: &mut AttributeMap) {
    for name in RESERVED_ATTRIBUTES {
        attributes.remove(name);
    }
}
