//! Storage error types.
//!
//! Every error raised on behalf of a single data object carries a
//! [`DocumentContext`] so the caller can tell which (collection, tenant, id)
//! the failure belongs to. Callers branch on the variant, not the message:
//!
//! | Variant | Meaning | Typical remediation |
//! |---------|---------|---------------------|
//! | [`StorageError::Conflict`] | Lost a race or the record already exists | Refetch, then retry |
//! | [`StorageError::Transcode`] | Input (or stored data) is not representable | Fix the document |
//! | [`StorageError::BackendUnavailable`] | Transport or backend is down | Retry later |

use std::fmt;

/// Identity of the data object an error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    /// Logical collection (index) name as supplied by the caller.
    pub collection: String,
    /// Tenant scope, after default substitution.
    pub tenant: String,
    /// Document id, when the operation addresses a single document.
    pub id: Option<String>,
}

impl DocumentContext {
    /// Build a context for a single document.
    #[must_use]
    pub fn new(
        collection: impl Into<String>,
        tenant: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            tenant: tenant.into(),
            id: Some(id.into()),
        }
    }

    /// Build a context that addresses a collection rather than one document.
    #[must_use]
    pub fn collection(collection: impl Into<String>, tenant: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            tenant: tenant.into(),
            id: None,
        }
    }
}

impl fmt::Display for DocumentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.collection)?;
        write!(f, " tenant={}", self.tenant)?;
        if let Some(id) = &self.id {
            write!(f, " id={id}")?;
        }
        Ok(())
    }
}

/// Why a conditional write was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// A create-only put found an existing record at the key.
    AlreadyExists,
    /// The stored sequence number did not match the expected one.
    VersionConflict,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists => f.write_str("document already exists"),
            Self::VersionConflict => f.write_str("document version conflict"),
        }
    }
}

/// A document could not be converted to or from the attribute model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscodeError {
    /// The top-level document was not a JSON object.
    #[error("data object must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A number is outside the backend's numeric domain.
    #[error("number {value} cannot be stored: {reason}")]
    UnsupportedNumber {
        /// Number as written in the document.
        value: String,
        /// Which limit it violates.
        reason: String,
    },

    /// A stored number attribute could not be parsed back.
    #[error("stored number {value:?} is malformed")]
    MalformedNumber {
        /// Raw attribute text.
        value: String,
    },

    /// The document uses an attribute name the adapter manages itself.
    #[error("attribute {name:?} is reserved")]
    ReservedAttribute {
        /// Offending attribute name.
        name: String,
    },

    /// The payload was not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

/// Errors from data object operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The document cannot be represented in (or read back from) the backend.
    #[error("failed to transcode data object {context}: {source}")]
    Transcode {
        /// Document the failure belongs to.
        context: DocumentContext,
        /// Underlying transcoding failure.
        #[source]
        source: TranscodeError,
    },

    /// An existence or sequence-number condition was violated.
    #[error("{kind} for data object {context}")]
    Conflict {
        /// Document the failure belongs to.
        context: DocumentContext,
        /// Which condition failed.
        kind: ConflictKind,
    },

    /// An update targeted a document that does not exist.
    #[error("data object {context} does not exist")]
    DocumentMissing {
        /// Document the failure belongs to.
        context: DocumentContext,
    },

    /// The request itself is malformed (empty id, empty collection, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The backend could not be reached.
    #[error("backend unavailable for {context}: {message}")]
    BackendUnavailable {
        /// Document or collection the call was made for.
        context: DocumentContext,
        /// Transport-level description.
        message: String,
    },

    /// The backend answered with an error status.
    #[error("backend error for {context} (status {status}): {message}")]
    Backend {
        /// Document or collection the call was made for.
        context: DocumentContext,
        /// HTTP-style status code reported by the backend.
        status: u16,
        /// Backend-provided description.
        message: String,
    },

    /// The backend refused the call under the current execution context.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// An unexpected internal failure (worker panic, malformed response).
    #[error("internal error: {0}")]
    Internal(String),

    /// The client could not be built from its configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Whether this is an existence or version conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Whether retrying the same request later could succeed.
    ///
    /// Conflicts are not retryable as-is: the caller must refetch first.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::BackendUnavailable { .. } => true,
            Self::Backend { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// HTTP-style status code matching the native engine's error statuses.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Transcode { .. } | Self::InvalidRequest(_) => 400,
            Self::AccessDenied(_) => 403,
            Self::DocumentMissing { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::BackendUnavailable { .. } => 503,
            Self::Backend { status, .. } => *status,
            Self::Internal(_) | Self::Configuration(_) => 500,
        }
    }

    /// The document context attached to this error, if any.
    #[must_use]
    pub fn context(&self) -> Option<&DocumentContext> {
        match self {
            Self::Transcode { context, .. }
            | Self::Conflict { context, .. }
            | Self::DocumentMissing { context }
            | Self::BackendUnavailable { context, .. }
            | Self::Backend { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = DocumentContext::new("ml-models", "acme", "doc-1");
        assert_eq!(ctx.to_string(), "[ml-models] tenant=acme id=doc-1");

        let ctx = DocumentContext::collection("ml-models", "acme");
        assert_eq!(ctx.to_string(), "[ml-models] tenant=acme");
    }

    #[test]
    fn test_conflict_message_names_document() {
        let err = StorageError::Conflict {
            context: DocumentContext::new("idx", "t", "1"),
            kind: ConflictKind::VersionConflict,
        };
        assert_eq!(
            err.to_string(),
            "document version conflict for data object [idx] tenant=t id=1"
        );
        assert!(err.is_conflict());
        assert!(!err.is_retryable());
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_status_codes_distinguish_failures() {
        let ctx = DocumentContext::new("idx", "t", "1");
        let transcode = StorageError::Transcode {
            context: ctx.clone(),
            source: TranscodeError::NotAnObject { found: "array" },
        };
        let down = StorageError::BackendUnavailable {
            context: ctx.clone(),
            message: "connection refused".into(),
        };
        let missing = StorageError::DocumentMissing { context: ctx };

        assert_eq!(transcode.status_code(), 400);
        assert_eq!(down.status_code(), 503);
        assert_eq!(missing.status_code(), 404);
        assert!(down.is_retryable());
        assert!(!transcode.is_retryable());
    }

    #[test]
    fn test_backend_retryable_only_for_server_errors() {
        let ctx = DocumentContext::collection("idx", "t");
        let throttled = StorageError::Backend {
            context: ctx.clone(),
            status: 429,
            message: "slow down".into(),
        };
        let bad = StorageError::Backend {
            context: ctx,
            status: 400,
            message: "parse failure".into(),
        };
        assert!(throttled.is_retryable());
        assert!(!bad.is_retryable());
        assert!(bad.context().is_some());
    }
}
