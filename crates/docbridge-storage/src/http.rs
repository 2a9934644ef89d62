//! Shared plumbing for the engine's REST API.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{DocumentContext, StorageError, StorageResult};

/// Parse and sanity-check an engine endpoint.
pub(crate) fn parse_endpoint(endpoint: &str) -> StorageResult<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| StorageError::Configuration(format!("invalid endpoint {endpoint:?}: {e}")))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(StorageError::Configuration(format!(
            "endpoint {endpoint:?} must be an http(s) base URL"
        )));
    }
    Ok(url)
}

/// Build an HTTP client with an optional overall request timeout.
pub(crate) fn build_client(timeout: Option<Duration>) -> StorageResult<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| StorageError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> StorageResult<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| StorageError::Configuration(format!("{base} cannot be a base URL")))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

/// Map a transport failure (connect, timeout, body read).
pub(crate) fn transport_error(context: DocumentContext, err: &reqwest::Error) -> StorageError {
    if err.is_decode() {
        return StorageError::Internal(format!("malformed engine response for {context}: {err}"));
    }
    StorageError::BackendUnavailable {
        context,
        message: err.to_string(),
    }
}

/// Map an error status to [`StorageError::Backend`], preferring the engine's
/// own `error.reason` over the raw body.
pub(crate) fn status_error(context: DocumentContext, status: u16, body: &str) -> StorageError {
    StorageError::Backend {
        context,
        status,
        message: error_reason(body).unwrap_or_else(|| body.to_owned()),
    }
}

/// Extract `error.reason` (or a string `error`) from an engine error body.
pub(crate) fn error_reason(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    error
        .get("reason")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        assert!(parse_endpoint("http://localhost:9200").is_ok());
        assert!(parse_endpoint("https://search.internal/prefix/").is_ok());
        assert!(matches!(
            parse_endpoint("ftp://host"),
            Err(StorageError::Configuration(_))
        ));
        assert!(parse_endpoint("not a url").is_err());
    }

    #[test]
    fn test_join_segments_encodes() {
        let base = parse_endpoint("http://localhost:9200/").unwrap();
        let url = join_segments(&base, &["my index", "_doc", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/my%20index/_doc/a%2Fb");

        let prefixed = parse_endpoint("http://proxy/engine").unwrap();
        let url = join_segments(&prefixed, &["models", "_search"]).unwrap();
        assert_eq!(url.as_str(), "http://proxy/engine/models/_search");
    }

    #[test]
    fn test_error_reason() {
        let body = r#"{"error":{"type":"version_conflict_engine_exception","reason":"[x]: version conflict"},"status":409}"#;
        assert_eq!(error_reason(body).as_deref(), Some("[x]: version conflict"));
        assert_eq!(error_reason(r#"{"error":"boom"}"#).as_deref(), Some("boom"));
        assert_eq!(error_reason("<html>"), None);
    }

    #[test]
    fn test_status_error_falls_back_to_body() {
        let err = status_error(DocumentContext::collection("c", "t"), 502, "bad gateway");
        assert!(matches!(err, StorageError::Backend { status: 502, ref message, .. } if message == "bad gateway"));
        assert!(err.is_retryable());
    }
}
