//! Search delegation to a remote engine.
//!
//! The key-value table cannot answer queries, so searches skip it entirely.
//! [`delegate_search`] rewrites collection names to the index names the
//! engine's replicated tables use (wildcards included) and hands the request to a
//! [`SearchClient`]. Keeping the engine in sync with the table is somebody
//! else's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{DocumentContext, StorageResult};
use crate::http;
use crate::key::{index_for, tenant_or_default};
use crate::request::{SearchDataObjectRequest, SearchDataObjectResponse};

/// Remote search engine.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Execute `request` and return the engine's response verbatim.
    async fn search(
        &self,
        request: SearchDataObjectRequest,
    ) -> StorageResult<SearchDataObjectResponse>;
}

/// Map every collection (or collection pattern) in `request` to its index.
///
/// # Errors
///
/// Returns [`StorageError::InvalidRequest`](crate::StorageError::InvalidRequest)
/// if a collection resolves to an empty index name.
pub fn resolve_search_indices(
    mut request: SearchDataObjectRequest,
) -> StorageResult<SearchDataObjectRequest> {
    request.indices = request
        .indices
        .iter()
        .map(String::as_str)
        .map(index_for)
        .collect::<StorageResult<_>>()?;
    Ok(request)
}

/// Forward `request` to `client` after resolving table names. The tenant and
/// query pass through unchanged and the response is returned as-is.
///
/// # Errors
///
/// Propagates resolution failures and whatever `client` reports.
pub async fn delegate_search(
    client: &dyn SearchClient,
    request: SearchDataObjectRequest,
) -> StorageResult<SearchDataObjectResponse> {
    let request = resolve_search_indices(request)?;
    debug!(indices = ?request.indices, tenant = ?request.tenant_id, "Delegating search");
    client.search(request).await
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Search client speaking the engine's `_search` REST endpoint.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: Client,
    endpoint: Url,
}

impl HttpSearchClient {
    /// Create a client for the engine at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`](crate::StorageError::Configuration)
    /// if the endpoint is not an http(s) URL.
    pub fn new(endpoint: &str) -> StorageResult<Self> {
        Self::with_client(endpoint, http::build_client(None)?)
    }

    /// Create a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> StorageResult<Self> {
        Self::with_client(endpoint, http::build_client(Some(timeout))?)
    }

    /// Create a client reusing an existing connection pool.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_client(endpoint: &str, client: Client) -> StorageResult<Self> {
        Ok(Self {
            client,
            endpoint: http::parse_endpoint(endpoint)?,
        })
    }

    /// The engine base URL.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// `{endpoint}/{indices}/_search`, or `{endpoint}/_search` for no indices.
    fn search_url(&self, indices: &[String]) -> StorageResult<Url> {
        if indices.is_empty() {
            return http::join_segments(&self.endpoint, &["_search"]);
        }
        let joined = indices.join(",");
        http::join_segments(&self.endpoint, &[&joined, "_search"])
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(
        &self,
        request: SearchDataObjectRequest,
    ) -> StorageResult<SearchDataObjectResponse> {
        let context = DocumentContext::collection(
            request.indices.join(","),
            tenant_or_default(request.tenant_id.as_deref()),
        );
        let url = self.search_url(&request.indices)?;
        debug!(url = %url, "Sending search request");

        let response = self
            .client
            .post(url)
            .json(&request.query)
            .send()
            .await
            .map_err(|e| http::transport_error(context.clone(), &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                warn!(status = %status, error = %e, "Failed to read search error body");
                http::transport_error(context.clone(), &e)
            })?;
            error!(status = %status, body = %body, "Search request failed");
            return Err(http::status_error(context, status.as_u16(), &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| http::transport_error(context, &e))?;
        Ok(SearchDataObjectResponse::new(body))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::error::StorageError;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<SearchDataObjectRequest>>,
    }

    #[async_trait]
    impl SearchClient for Recorder {
        async fn search(
            &self,
            request: SearchDataObjectRequest,
        ) -> StorageResult<SearchDataObjectResponse> {
            self.seen.lock().unwrap().push(request);
            Ok(SearchDataObjectResponse::new(json!({"hits": {"hits": []}})))
        }
    }

    #[tokio::test]
    async fn test_delegate_rewrites_indices_only() {
        let recorder = Recorder::default();
        let query = json!({"query": {"term": {"name": "x"}}});
        let request = SearchDataObjectRequest::new(["a.b", "c"], query.clone()).with_tenant_id("t");

        let response = delegate_search(&recorder, request).await.unwrap();
        assert_eq!(response.body(), &json!({"hits": {"hits": []}}));

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].indices, vec!["ab".to_owned(), "c".to_owned()]);
        assert_eq!(seen[0].tenant_id.as_deref(), Some("t"));
        assert_eq!(seen[0].query, query);
    }

    #[tokio::test]
    async fn test_delegate_keeps_index_patterns() {
        let recorder = Recorder::default();
        let request = SearchDataObjectRequest::new([".plugins-ml-model*", "*"], json!({}));
        delegate_search(&recorder, request).await.unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            seen[0].indices,
            vec!["plugins-ml-model*".to_owned(), "*".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_delegate_rejects_unresolvable_index() {
        let recorder = Recorder::default();
        let request = SearchDataObjectRequest::new(["..."], json!({}));
        let err = delegate_search(&recorder, request).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidRequest(_)));
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_search_url() {
        let client = HttpSearchClient::new("http://localhost:9200").unwrap();
        let url = client
            .search_url(&["ab".to_owned(), "c".to_owned()])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/ab,c/_search");
        assert_eq!(
            client.search_url(&[]).unwrap().as_str(),
            "http://localhost:9200/_search"
        );
    }

    #[tokio::test]
    async fn test_truncated_error_body_is_unavailable() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await.unwrap();
            // Promise more body than is sent, then hang up.
            socket
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let client = HttpSearchClient::with_timeout(&format!("http://{addr}"), Duration::from_secs(5))
            .unwrap();
        let err = client
            .search(SearchDataObjectRequest::new(["c"], json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::BackendUnavailable { .. }), "{err:?}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_unavailable() {
        // Port 9 (discard) is closed on test hosts; the connect fails fast.
        let client =
            HttpSearchClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client
            .search(SearchDataObjectRequest::new(["c"], json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::BackendUnavailable { .. }));
        assert!(err.is_retryable());
    }
}
