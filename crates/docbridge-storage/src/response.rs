//! Document-store shaped response envelopes.
//!
//! Both backends answer with a [`ResponseEnvelope`]. The native engine's JSON
//! deserializes into it directly; the key-value adapter synthesizes one with
//! [`build_response`], filling metadata the table cannot report with the
//! engine's own "unassigned" sentinels.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StorageError, StorageResult};

/// Primary term reported when none is tracked.
pub const UNASSIGNED_PRIMARY_TERM: i64 = 0;

/// Sequence number reported when none is tracked.
pub const UNASSIGNED_SEQ_NO: i64 = -2;

/// Version reported when none is tracked.
pub const NOT_FOUND_VERSION: i64 = -1;

/// Primary term reported alongside a tracked sequence number. The table has
/// a single writer lineage, so it never changes.
pub const TRACKED_PRIMARY_TERM: i64 = 1;

fn unassigned_primary_term() -> i64 {
    UNASSIGNED_PRIMARY_TERM
}

fn unassigned_seq_no() -> i64 {
    UNASSIGNED_SEQ_NO
}

fn not_found_version() -> i64 {
    NOT_FOUND_VERSION
}

/// Shard bookkeeping block. Always zeroed for synthesized responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardInfo {
    /// Shards the operation should have run on.
    #[serde(default)]
    pub total: u32,
    /// Shards it succeeded on.
    #[serde(default)]
    pub successful: u32,
    /// Shards it failed on.
    #[serde(default)]
    pub failed: u32,
}

/// Outcome reported by write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocWriteResult {
    /// A new document was stored.
    Created,
    /// An existing document was changed.
    Updated,
    /// The document was removed (or was already absent).
    Deleted,
    /// The engine found nothing to delete.
    NotFound,
    /// Nothing changed.
    Noop,
}

impl DocWriteResult {
    /// Wire name of the result.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::NotFound => "not_found",
            Self::Noop => "noop",
        }
    }
}

impl fmt::Display for DocWriteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation-specific field merged into a synthesized envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraField {
    /// `"result": ...`
    Result(DocWriteResult),
    /// `"found": ...`
    Found(bool),
}

/// The response returned for every single-document operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Collection the document belongs to.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Primary term of the write, or [`UNASSIGNED_PRIMARY_TERM`].
    #[serde(rename = "_primary_term", default = "unassigned_primary_term")]
    pub primary_term: i64,
    /// Sequence number of the write, or [`UNASSIGNED_SEQ_NO`].
    #[serde(rename = "_seq_no", default = "unassigned_seq_no")]
    pub seq_no: i64,
    /// Document version, or [`NOT_FOUND_VERSION`].
    #[serde(rename = "_version", default = "not_found_version")]
    pub version: i64,
    /// Shard bookkeeping, absent on native reads.
    #[serde(rename = "_shards", default, skip_serializing_if = "Option::is_none")]
    pub shards: Option<ShardInfo>,
    /// Write outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<DocWriteResult>,
    /// Read outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
    /// Document body.
    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

impl ResponseEnvelope {
    /// Replace the sentinel metadata with a tracked sequence number.
    #[must_use]
    pub fn with_sequence(mut self, seq_no: i64) -> Self {
        self.seq_no = seq_no;
        self.primary_term = TRACKED_PRIMARY_TERM;
        self.version = seq_no.saturating_add(1);
        self
    }

    /// Whether a read found the document. Writes report `false`.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.found.unwrap_or(false)
    }

    /// Whether the envelope carries a tracked sequence number.
    #[must_use]
    pub fn has_sequence(&self) -> bool {
        self.seq_no >= 0
    }

    /// Serialize to the engine's wire shape.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`] if the body cannot be serialized.
    pub fn to_json(&self) -> StorageResult<Value> {
        serde_json::to_value(self)
            .map_err(|e| StorageError::Internal(format!("failed to serialize response: {e}")))
    }

    /// Parse an engine response.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`] if the JSON lacks `_index` or `_id`
    /// or has mistyped metadata.
    pub fn from_json(value: Value) -> StorageResult<Self> {
        serde_json::from_value(value)
            .map_err(|e| StorageError::Internal(format!("malformed engine response: {e}")))
    }
}

/// Synthesize an envelope for a key-value outcome.
///
/// Metadata the table cannot report is set to the unassigned sentinels;
/// chain [`ResponseEnvelope::with_sequence`] when a sequence number is known.
#[must_use]
pub fn build_response(
    collection: &str,
    id: &str,
    source: Option<Value>,
    extras: &[ExtraField],
) -> ResponseEnvelope {
    let mut envelope = ResponseEnvelope {
        index: collection.to_owned(),
        id: id.to_owned(),
        primary_term: UNASSIGNED_PRIMARY_TERM,
        seq_no: UNASSIGNED_SEQ_NO,
        version: NOT_FOUND_VERSION,
        shards: Some(ShardInfo::default()),
        result: None,
        found: None,
        source,
    };
    for extra in extras {
        match *extra {
            ExtraField::Result(result) => envelope.result = Some(result),
            ExtraField::Found(found) => envelope.found = Some(found),
        }
    }
    envelope
}
