//! Data object client for the native search engine.
//!
//! Talks to the engine's document REST API directly. Responses already have
//! the envelope shape, so they are parsed rather than synthesized. Tenants
//! are not part of the engine's document address and are only carried in
//! error context.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use tracing::{debug, error, warn};
use url::Url;

use crate::client::{BackendKind, DataObjectClient};
use crate::error::{ConflictKind, DocumentContext, StorageError, StorageResult};
use crate::http;
use crate::key::tenant_or_default;
use crate::request::{
    DeleteDataObjectRequest, DeleteDataObjectResponse, GetDataObjectRequest,
    GetDataObjectResponse, PutDataObjectRequest, PutDataObjectResponse, SearchDataObjectRequest,
    SearchDataObjectResponse, UpdateDataObjectRequest, UpdateDataObjectResponse,
};
use crate::response::{DocWriteResult, ExtraField, ResponseEnvelope, build_response};
use crate::search::{HttpSearchClient, SearchClient};

/// Data object client for a native engine cluster.
#[derive(Debug, Clone)]
pub struct NativeDataObjectClient {
    client: Client,
    endpoint: Url,
    search: HttpSearchClient,
}

impl NativeDataObjectClient {
    /// Create a client for the engine at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] if the endpoint is not an
    /// http(s) URL.
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
            endpoint: http::parse_endpoint(endpoint)?,
            search: HttpSearchClient::with_client(endpoint, client.clone())?,
            client,
        })
    }

    /// `PUT /{index}/_doc/{id}`, or `POST /{index}/_doc` when the engine
    /// should pick the id.
    fn put_request(&self, request: &PutDataObjectRequest) -> StorageResult<RequestBuilder> {
        let builder = match &request.id {
            Some(id) => {
                let mut url = http::join_segments(&self.endpoint, &[&request.index, "_doc", id])?;
                if !request.overwrite_if_exists {
                    url.query_pairs_mut().append_pair("op_type", "create");
                }
                self.client.put(url)
            },
            None => {
                let url = http::join_segments(&self.endpoint, &[&request.index, "_doc"])?;
                self.client.post(url)
            },
        };
        Ok(builder.json(&request.data_object))
    }

    fn doc_url(&self, index: &str, id: &str) -> StorageResult<Url> {
        http::join_segments(&self.endpoint, &[index, "_doc", id])
    }

    /// `POST /{index}/_update/{id}` with a partial `doc` body.
    fn update_request(&self, request: &UpdateDataObjectRequest) -> StorageResult<RequestBuilder> {
        let mut url = http::join_segments(&self.endpoint, &[&request.index, "_update", &request.id])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(seq_no) = request.if_seq_no {
                query.append_pair("if_seq_no", &seq_no.to_string());
            }
            if let Some(term) = request.if_primary_term {
                query.append_pair("if_primary_term", &term.to_string());
            }
        }
        Ok(self
            .client
            .post(url)
            .json(&json!({ "doc": request.data_object })))
    }

    /// Send a request and return the status and raw body.
    async fn send(
        builder: RequestBuilder,
        context: &DocumentContext,
    ) -> StorageResult<(u16, String)> {
        let response = builder
            .send()
            .await
            .map_err(|e| http::transport_error(context.clone(), &e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| http::transport_error(context.clone(), &e))?;
        Ok((status, body))
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn parse_envelope(body: &str) -> StorageResult<ResponseEnvelope> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| StorageError::Internal(format!("engine response is not JSON: {e}")))?;
    ResponseEnvelope::from_json(value)
}

fn failure(context: &DocumentContext, status: u16, body: &str) -> StorageError {
    error!(%context, status, body, "Engine request failed");
    http::status_error(context.clone(), status, body)
}

fn parse_put(status: u16, body: &str, context: &DocumentContext) -> StorageResult<ResponseEnvelope> {
    match status {
        s if is_success(s) => parse_envelope(body),
        409 => {
            warn!(%context, "Document already exists");
            Err(StorageError::Conflict {
                context: context.clone(),
                kind: ConflictKind::AlreadyExists,
            })
        },
        s => Err(failure(context, s, body)),
    }
}

/// A 404 is a normal miss. Missing indices answer with an error body, which
/// is reported as a miss too.
fn parse_get(
    status: u16,
    body: &str,
    index: &str,
    id: &str,
    context: &DocumentContext,
) -> StorageResult<ResponseEnvelope> {
    match status {
        s if is_success(s) => parse_envelope(body),
        404 => Ok(parse_envelope(body)
            .unwrap_or_else(|_| build_response(index, id, None, &[ExtraField::Found(false)]))),
        s => Err(failure(context, s, body)),
    }
}

fn parse_update(
    status: u16,
    body: &str,
    context: &DocumentContext,
) -> StorageResult<ResponseEnvelope> {
    match status {
        s if is_success(s) => parse_envelope(body),
        409 => {
            warn!(%context, "Document version conflict");
            Err(StorageError::Conflict {
                context: context.clone(),
                kind: ConflictKind::VersionConflict,
            })
        },
        404 => Err(StorageError::DocumentMissing {
            context: context.clone(),
        }),
        s => Err(failure(context, s, body)),
    }
}

fn parse_delete(
    status: u16,
    body: &str,
    index: &str,
    id: &str,
    context: &DocumentContext,
) -> StorageResult<ResponseEnvelope> {
    match status {
        s if is_success(s) => parse_envelope(body),
        404 => Ok(parse_envelope(body).unwrap_or_else(|_| {
            build_response(index, id, None, &[ExtraField::Result(DocWriteResult::NotFound)])
        })),
        s => Err(failure(context, s, body)),
    }
}

#[async_trait]
impl DataObjectClient for NativeDataObjectClient {
    async fn put(&self, request: PutDataObjectRequest) -> StorageResult<PutDataObjectResponse> {
        let context = DocumentContext {
            collection: request.index.clone(),
            tenant: tenant_or_default(request.tenant_id.as_deref()).to_owned(),
            id: request.id.clone(),
        };
        if !request.data_object.is_object() {
            return Err(StorageError::InvalidRequest(format!(
                "data object for {context} must be a JSON object"
            )));
        }
        debug!(%context, overwrite = request.overwrite_if_exists, "Native put");
        let (status, body) = Self::send(self.put_request(&request)?, &context).await?;
        parse_put(status, &body, &context).map(PutDataObjectResponse::new)
    }

    async fn get(&self, request: GetDataObjectRequest) -> StorageResult<GetDataObjectResponse> {
        let context = DocumentContext::new(
            &request.index,
            tenant_or_default(request.tenant_id.as_deref()),
            &request.id,
        );
        debug!(%context, "Native get");
        let url = self.doc_url(&request.index, &request.id)?;
        let (status, body) = Self::send(self.client.get(url), &context).await?;
        parse_get(status, &body, &request.index, &request.id, &context)
            .map(GetDataObjectResponse::new)
    }

    async fn update(
        &self,
        request: UpdateDataObjectRequest,
    ) -> StorageResult<UpdateDataObjectResponse> {
        let context = DocumentContext::new(
            &request.index,
            tenant_or_default(request.tenant_id.as_deref()),
            &request.id,
        );
        debug!(%context, if_seq_no = ?request.if_seq_no, "Native update");
        let (status, body) = Self::send(self.update_request(&request)?, &context).await?;
        parse_update(status, &body, &context).map(UpdateDataObjectResponse::new)
    }

    async fn delete(
        &self,
        request: DeleteDataObjectRequest,
    ) -> StorageResult<DeleteDataObjectResponse> {
        let context = DocumentContext::new(
            &request.index,
            tenant_or_default(request.tenant_id.as_deref()),
            &request.id,
        );
        debug!(%context, "Native delete");
        let url = self.doc_url(&request.index, &request.id)?;
        let (status, body) = Self::send(self.client.delete(url), &context).await?;
        parse_delete(status, &body, &request.index, &request.id, &context)
            .map(DeleteDataObjectResponse::new)
    }

    async fn search(
        &self,
        request: SearchDataObjectRequest,
    ) -> StorageResult<SearchDataObjectResponse> {
        self.search.search(request).await
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Native
    }
}
