//! Request context for correlating data object operations.

use std::time::Instant;

use uuid::Uuid;

/// Identity of one data object operation, carried into its tracing span.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: Uuid,
    /// Correlation ID shared by related requests.
    pub correlation_id: Uuid,
    /// Operation being performed (`put`, `get`, `search`, ...).
    pub operation: String,
    /// Target collection.
    pub collection: Option<String>,
    /// Tenant the operation is scoped to.
    pub tenant_id: Option<String>,
    /// Target document.
    pub document_id: Option<String>,
    started_at: Instant,
}

impl RequestContext {
    /// Create a new request context.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        Self {
            request_id: id,
            correlation_id: id,
            operation: operation.into(),
            collection: None,
            tenant_id: None,
            document_id: None,
            started_at: Instant::now(),
        }
    }

    /// Create a follow-up context in the same correlation group, targeting
    /// the same collection and tenant.
    #[must_use]
    pub fn child(&self, operation: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            correlation_id: self.correlation_id,
            operation: operation.into(),
            collection: self.collection.clone(),
            tenant_id: self.tenant_id.clone(),
            document_id: None,
            started_at: Instant::now(),
        }
    }

    /// Set the collection.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Set the tenant.
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the document id.
    #[must_use]
    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// Milliseconds since the context was created.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Create a tracing span with this context.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "data_object",
            request_id = %self.request_id,
            correlation_id = %self.correlation_id,
            operation = %self.operation,
            collection = self.collection.as_deref(),
            tenant = self.tenant_id.as_deref(),
            id = self.document_id.as_deref(),
        )
    }
}

/// Guard that enters a request span and logs its duration when dropped.
pub struct RequestGuard {
    context: RequestContext,
    _span: tracing::span::EnteredSpan,
}

impl RequestGuard {
    /// Enter `context`'s span.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("Request started");
        Self {
            context,
            _span: span,
        }
    }

    /// Get the request context.
    #[must_use]
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.context.elapsed_ms(), "Request completed");
    }
}
