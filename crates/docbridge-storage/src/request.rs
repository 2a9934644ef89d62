//! Data object requests and responses.
//!
//! Requests are built with `new` plus `with_*` setters. Single-document
//! responses wrap a [`ResponseEnvelope`]; search responses wrap the engine's
//! JSON verbatim.

use serde_json::Value;

use crate::response::{DocWriteResult, ResponseEnvelope};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Store a data object.
#[derive(Debug, Clone, PartialEq)]
pub struct PutDataObjectRequest {
    /// Target collection.
    pub index: String,
    /// Document id. Generated when absent.
    pub id: Option<String>,
    /// Tenant scope. The default tenant when absent.
    pub tenant_id: Option<String>,
    /// Document body. Must be a JSON object.
    pub data_object: Value,
    /// Replace an existing document at the same id. Defaults to `true`.
    pub overwrite_if_exists: bool,
}

impl PutDataObjectRequest {
    /// Create a put request for `data_object` in `index`.
    #[must_use]
    pub fn new(index: impl Into<String>, data_object: Value) -> Self {
        Self {
            index: index.into(),
            id: None,
            tenant_id: None,
            data_object,
            overwrite_if_exists: true,
        }
    }

    /// Use a fixed document id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Scope the request to a tenant.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set whether an existing document may be replaced.
    #[must_use]
    pub fn with_overwrite_if_exists(mut self, overwrite: bool) -> Self {
        self.overwrite_if_exists = overwrite;
        self
    }
}

/// Read a data object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetDataObjectRequest {
    /// Target collection.
    pub index: String,
    /// Document id.
    pub id: String,
    /// Tenant scope.
    pub tenant_id: Option<String>,
}

impl GetDataObjectRequest {
    /// Create a get request for `id` in `index`.
    #[must_use]
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            tenant_id: None,
        }
    }

    /// Scope the request to a tenant.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

/// Partially update a data object.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDataObjectRequest {
    /// Target collection.
    pub index: String,
    /// Document id.
    pub id: String,
    /// Tenant scope.
    pub tenant_id: Option<String>,
    /// Top-level fields to set. Must be a JSON object.
    pub data_object: Value,
    /// Apply only if the stored sequence number equals this value.
    pub if_seq_no: Option<i64>,
    /// Primary term paired with `if_seq_no`. Only the native engine checks it.
    pub if_primary_term: Option<i64>,
}

impl UpdateDataObjectRequest {
    /// Create an update request setting `data_object`'s fields on `id`.
    #[must_use]
    pub fn new(index: impl Into<String>, id: impl Into<String>, data_object: Value) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            tenant_id: None,
            data_object,
            if_seq_no: None,
            if_primary_term: None,
        }
    }

    /// Scope the request to a tenant.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Guard the update with an expected sequence number.
    #[must_use]
    pub fn with_if_seq_no(mut self, seq_no: i64) -> Self {
        self.if_seq_no = Some(seq_no);
        self
    }

    /// Pair the sequence number guard with a primary term.
    #[must_use]
    pub fn with_if_primary_term(mut self, primary_term: i64) -> Self {
        self.if_primary_term = Some(primary_term);
        self
    }
}

/// Delete a data object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteDataObjectRequest {
    /// Target collection.
    pub index: String,
    /// Document id.
    pub id: String,
    /// Tenant scope.
    pub tenant_id: Option<String>,
}

impl DeleteDataObjectRequest {
    /// Create a delete request for `id` in `index`.
    #[must_use]
    pub fn new(index: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            id: id.into(),
            tenant_id: None,
        }
    }

    /// Scope the request to a tenant.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

/// Run a query against one or more collections.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDataObjectRequest {
    /// Collections to search.
    pub indices: Vec<String>,
    /// Tenant scope, forwarded to the engine untouched.
    pub tenant_id: Option<String>,
    /// Search body in the engine's query DSL.
    pub query: Value,
}

impl SearchDataObjectRequest {
    /// Create a search request over `indices`.
    #[must_use]
    pub fn new<I, S>(indices: I, query: Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indices: indices.into_iter().map(Into::into).collect(),
            tenant_id: None,
            query,
        }
    }

    /// Scope the request to a tenant.
    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Result of a put.
#[derive(Debug, Clone, PartialEq)]
pub struct PutDataObjectResponse {
    envelope: ResponseEnvelope,
}

impl PutDataObjectResponse {
    /// Wrap an envelope.
    #[must_use]
    pub fn new(envelope: ResponseEnvelope) -> Self {
        Self { envelope }
    }

    /// Id the document was stored under.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.envelope.id
    }

    /// Sequence number assigned by the write.
    #[must_use]
    pub fn seq_no(&self) -> i64 {
        self.envelope.seq_no
    }

    /// Write outcome.
    #[must_use]
    pub fn result(&self) -> Option<DocWriteResult> {
        self.envelope.result
    }

    /// Full response envelope.
    #[must_use]
    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }
}

/// Result of a get.
#[derive(Debug, Clone, PartialEq)]
pub struct GetDataObjectResponse {
    envelope: ResponseEnvelope,
}

impl GetDataObjectResponse {
    /// Wrap an envelope.
    #[must_use]
    pub fn new(envelope: ResponseEnvelope) -> Self {
        Self { envelope }
    }

    /// Requested id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.envelope.id
    }

    /// Whether the document exists.
    #[must_use]
    pub fn found(&self) -> bool {
        self.envelope.is_found()
    }

    /// Stored document body, when found.
    #[must_use]
    pub fn source(&self) -> Option<&Value> {
        self.envelope.source.as_ref()
    }

    /// Current sequence number, for a later guarded update.
    #[must_use]
    pub fn seq_no(&self) -> i64 {
        self.envelope.seq_no
    }

    /// Full response envelope.
    #[must_use]
    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }
}

/// Result of an update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateDataObjectResponse {
    envelope: ResponseEnvelope,
}

impl UpdateDataObjectResponse {
    /// Wrap an envelope.
    #[must_use]
    pub fn new(envelope: ResponseEnvelope) -> Self {
        Self { envelope }
    }

    /// Updated id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.envelope.id
    }

    /// Sequence number after the update.
    #[must_use]
    pub fn seq_no(&self) -> i64 {
        self.envelope.seq_no
    }

    /// Write outcome.
    #[must_use]
    pub fn result(&self) -> Option<DocWriteResult> {
        self.envelope.result
    }

    /// Document after the update, when the backend reports it.
    #[must_use]
    pub fn source(&self) -> Option<&Value> {
        self.envelope.source.as_ref()
    }

    /// Full response envelope.
    #[must_use]
    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }
}

/// Result of a delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteDataObjectResponse {
    envelope: ResponseEnvelope,
}

impl DeleteDataObjectResponse {
    /// Wrap an envelope.
    #[must_use]
    pub fn new(envelope: ResponseEnvelope) -> Self {
        Self { envelope }
    }

    /// Deleted id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.envelope.id
    }

    /// Sequence number of the delete, or the unassigned sentinel.
    #[must_use]
    pub fn seq_no(&self) -> i64 {
        self.envelope.seq_no
    }

    /// Write outcome.
    #[must_use]
    pub fn result(&self) -> Option<DocWriteResult> {
        self.envelope.result
    }

    /// Full response envelope.
    #[must_use]
    pub fn envelope(&self) -> &ResponseEnvelope {
        &self.envelope
    }
}

/// Result of a search, exactly as the engine returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDataObjectResponse {
    body: Value,
}

impl SearchDataObjectResponse {
    /// Wrap a raw engine response.
    #[must_use]
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    /// The raw response body.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consume the response, returning the raw body.
    #[must_use]
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Entries of `hits.hits`, empty if the body has none.
    #[must_use]
    pub fn hits(&self) -> &[Value] {
        self.body
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// `hits.total.value`, or a bare numeric `hits.total`.
    #[must_use]
    pub fn total_hits(&self) -> Option<u64> {
        let total = self.body.pointer("/hits/total")?;
        total
            .get("value")
            .and_then(Value::as_u64)
            .or_else(|| total.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::response::{ExtraField, build_response};

    #[test]
    fn test_put_request_defaults() {
        let req = PutDataObjectRequest::new("models", json!({"a": 1}));
        assert!(req.overwrite_if_exists);
        assert!(req.id.is_none());
        assert!(req.tenant_id.is_none());

        let req = req
            .with_id("x")
            .with_tenant_id("acme")
            .with_overwrite_if_exists(false);
        assert_eq!(req.id.as_deref(), Some("x"));
        assert_eq!(req.tenant_id.as_deref(), Some("acme"));
        assert!(!req.overwrite_if_exists);
    }

    #[test]
    fn test_update_request_guards() {
        let req = UpdateDataObjectRequest::new("models", "x", json!({}))
            .with_if_seq_no(3)
            .with_if_primary_term(1);
        assert_eq!(req.if_seq_no, Some(3));
        assert_eq!(req.if_primary_term, Some(1));
    }

    #[test]
    fn test_search_request_collects_indices() {
        let req = SearchDataObjectRequest::new(["a.b", "c"], json!({"query": {"match_all": {}}}));
        assert_eq!(req.indices, vec!["a.b".to_owned(), "c".to_owned()]);
    }

    #[test]
    fn test_get_response_accessors() {
        let env = build_response("m", "x", Some(json!({"k": "v"})), &[ExtraField::Found(true)]);
        let resp = GetDataObjectResponse::new(env);
        assert_eq!(resp.id(), "x");
        assert!(resp.found());
        assert_eq!(resp.source().unwrap()["k"], "v");
    }

    #[test]
    fn test_search_response_hits() {
        let resp = SearchDataObjectResponse::new(json!({
            "hits": {"total": {"value": 2, "relation": "eq"}, "hits": [{"_id": "a"}, {"_id": "b"}]}
        }));
        assert_eq!(resp.hits().len(), 2);
        assert_eq!(resp.total_hits(), Some(2));

        let empty = SearchDataObjectResponse::new(json!({"took": 1}));
        assert!(empty.hits().is_empty());
        assert_eq!(empty.total_hits(), None);
    }
}
