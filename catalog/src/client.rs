//! HTTP client for the Elasticsearch REST API

use base64::Engine;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;
use url::Url;

use crate::config::{AuthConfig, ElasticsearchConfig};
use crate::error::{Error, Result};
use crate::query::Query;
use crate::response::{
    BulkResponse, CountResponse, DeleteByQueryResponse, ErrorResponse, GetResponse,
    SearchResponse, WriteResponse,
};

/// `GET /` response
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInfo {
    pub name: String,
    pub cluster_name: String,
    pub version: ClusterVersion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterVersion {
    pub number: String,
}

/// Thin async client; clones share one connection pool
#[derive(Debug, Clone)]
pub struct ElasticClient {
    client: Client,
    base_url: Url,
    auth: Option<AuthConfig>,
}

impl ElasticClient {
    pub fn new(config: &ElasticsearchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("'{}' cannot be used as a base URL", config.url)));
        }
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url,
            auth: config.auth.clone(),
        })
    }

    /// Client with default settings for `url`
    pub fn from_url(url: &str) -> Result<Self> {
        Self::new(&ElasticsearchConfig {
            url: url.to_string(),
            ..ElasticsearchConfig::default()
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL for the given path segments; each segment is percent-encoded
    pub fn url_for(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let req = self.client.request(method, self.url_for(segments));
        match &self.auth {
            Some(AuthConfig::Basic { username, password }) => {
                req.basic_auth(username, Some(password))
            }
            Some(AuthConfig::ApiKey { id, api_key }) => {
                let token = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", id, api_key));
                req.header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", token))
            }
            None => req,
        }
    }

    async fn send(&self, op: &'static str, req: RequestBuilder) -> Result<Response> {
        let start = Instant::now();
        let result = req.send().await;

        metrics::counter!("catalog_es_requests_total", "op" => op).increment(1);
        metrics::histogram!("catalog_es_request_duration_seconds", "op" => op)
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(resp) => {
                tracing::debug!(op, status = resp.status().as_u16(), url = %resp.url(), "ES request");
                Ok(resp)
            }
            Err(e) => {
                metrics::counter!("catalog_es_request_errors_total", "op" => op).increment(1);
                tracing::debug!(op, error = %e, "ES request failed");
                Err(e.into())
            }
        }
    }

    /// Pass through 2xx responses; turn anything else into an error
    async fn check(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(decode_error(status, &body))
    }

    /// Check the status, then decode the JSON body
    async fn decode<R: DeserializeOwned>(resp: Response) -> Result<R> {
        let body = Self::check(resp).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Cluster name and version
    pub async fn ping(&self) -> Result<ClusterInfo> {
        let resp = self.send("ping", self.request(Method::GET, &[])).await?;
        Self::decode(resp).await
    }

    /// Create an index. Returns false if it already exists.
    pub async fn create_index(&self, index: &str, body: &Value) -> Result<bool> {
        let req = self.request(Method::PUT, &[index]).json(body);
        let resp = self.send("create_index", req).await?;
        match Self::check(resp).await {
            Ok(_) => {
                tracing::info!("Created index '{}'", index);
                Ok(true)
            }
            Err(Error::Api { error_type, .. })
                if error_type == "resource_already_exists_exception"
                    || error_type == "index_already_exists_exception" =>
            {
                tracing::debug!("Index '{}' already exists", index);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete an index. Returns false if it did not exist.
    pub async fn delete_index(&self, index: &str) -> Result<bool> {
        let resp = self.send("delete_index", self.request(Method::DELETE, &[index])).await?;
        match Self::check(resp).await {
            Ok(_) => {
                tracing::info!("Deleted index '{}'", index);
                Ok(true)
            }
            Err(Error::IndexNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn index_exists(&self, index: &str) -> Result<bool> {
        let resp = self.send("index_exists", self.request(Method::HEAD, &[index])).await?;
        exists_from_status(resp.status())
    }

    pub async fn put_mapping(&self, index: &str, body: &Value) -> Result<()> {
        let req = self.request(Method::PUT, &[index, "_mapping"]).json(body);
        let resp = self.send("put_mapping", req).await?;
        Self::check(resp).await?;
        tracing::info!("Updated mapping of '{}'", index);
        Ok(())
    }

    /// Raw `GET /{index}/_mapping` body
    pub async fn get_mapping(&self, index: &str) -> Result<Value> {
        let req = self.request(Method::GET, &[index, "_mapping"]);
        let resp = self.send("get_mapping", req).await?;
        Self::decode(resp).await
    }

    /// Make recent writes visible to search
    pub async fn refresh(&self, index: &str) -> Result<()> {
        let req = self.request(Method::POST, &[index, "_refresh"]);
        let resp = self.send("refresh", req).await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Create or replace one document
    pub async fn index_document<T: Serialize + ?Sized>(
        &self,
        index: &str,
        id: &str,
        doc: &T,
    ) -> Result<WriteResponse> {
        let req = self.request(Method::PUT, &[index, "_doc", id]).json(doc);
        let resp = self.send("index", req).await?;
        Self::decode(resp).await
    }

    /// Create or replace many documents in one `_bulk` request
    pub async fn bulk_index<T: Serialize + Sync>(
        &self,
        index: &str,
        docs: &[(String, &T)],
    ) -> Result<BulkResponse> {
        if docs.is_empty() {
            return Ok(BulkResponse {
                took: 0,
                errors: false,
                items: Vec::new(),
            });
        }

        let body = bulk_body(index, docs)?;
        let req = self
            .request(Method::POST, &["_bulk"])
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        let resp = self.send("bulk", req).await?;
        let bulk: BulkResponse = Self::decode(resp).await?;
        tracing::debug!("Bulk indexed {} document(s) into '{}'", docs.len(), index);
        bulk.into_result()
    }

    /// Fetch a document by id; `None` if the index has no such document
    pub async fn get_document<T: DeserializeOwned>(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<T>> {
        let resp = self
            .send("get", self.request(Method::GET, &[index, "_doc", id]))
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::NOT_FOUND {
            // A missing document still answers with a get body; a missing index does not
            if let Ok(get) = serde_json::from_str::<GetResponse<Value>>(&body) {
                if !get.found {
                    return Ok(None);
                }
            }
        }
        if !status.is_success() {
            return Err(decode_error(status, &body));
        }

        let get: GetResponse<T> = serde_json::from_str(&body)?;
        Ok(if get.found { get.source } else { None })
    }

    pub async fn document_exists(&self, index: &str, id: &str) -> Result<bool> {
        let req = self.request(Method::HEAD, &[index, "_doc", id]);
        let resp = self.send("exists", req).await?;
        exists_from_status(resp.status())
    }

    /// Delete by id. Returns false if the document did not exist.
    pub async fn delete_document(&self, index: &str, id: &str) -> Result<bool> {
        let req = self.request(Method::DELETE, &[index, "_doc", id]);
        let resp = self.send("delete", req).await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::NOT_FOUND {
            if let Ok(write) = serde_json::from_str::<WriteResponse>(&body) {
                if write.result == "not_found" {
                    return Ok(false);
                }
            }
        }
        if !status.is_success() {
            return Err(decode_error(status, &body));
        }
        Ok(true)
    }

    /// Delete every document matching `query`; returns the number deleted.
    /// Documents the service failed to delete make the call fail with [`Error::Bulk`].
    pub async fn delete_by_query(&self, index: &str, query: &Query) -> Result<u64> {
        let req = self
            .request(Method::POST, &[index, "_delete_by_query"])
            .json(&json!({ "query": query }));
        let resp = self.send("delete_by_query", req).await?;
        let result: DeleteByQueryResponse = Self::decode(resp).await?;

        let failed = result.failed_documents();
        if !failed.is_empty() {
            tracing::warn!(
                "Delete by query on '{}' removed {} document(s) and failed on {}",
                index,
                result.deleted,
                failed.len()
            );
            return Err(Error::Bulk { failed });
        }
        Ok(result.deleted)
    }

    /// Number of documents matching `query`, or all documents
    pub async fn count(&self, index: &str, query: Option<&Query>) -> Result<u64> {
        let mut req = self.request(Method::POST, &[index, "_count"]);
        if let Some(q) = query {
            req = req.json(&json!({ "query": q }));
        }
        let resp = self.send("count", req).await?;
        let count: CountResponse = Self::decode(resp).await?;
        Ok(count.count)
    }

    pub async fn search<T: DeserializeOwned>(
        &self,
        index: &str,
        body: &Value,
    ) -> Result<SearchResponse<T>> {
        let req = self.request(Method::POST, &[index, "_search"]).json(body);
        let resp = self.send("search", req).await?;
        Self::decode(resp).await
    }
}

fn exists_from_status(status: StatusCode) -> Result<bool> {
    match status {
        s if s.is_success() => Ok(true),
        StatusCode::NOT_FOUND => Ok(false),
        s => Err(decode_error(s, "")),
    }
}

/// Decode an error body, falling back to the raw text
pub(crate) fn decode_error(status: StatusCode, body: &str) -> Error {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => err.into_error(status.as_u16()),
        Err(_) => Error::Api {
            status: status.as_u16(),
            error_type: "http_error".to_string(),
            reason: if body.is_empty() {
                status.canonical_reason().unwrap_or("unknown").to_string()
            } else {
                body.to_string()
            },
        },
    }
}

/// NDJSON body for a `_bulk` index request
pub fn bulk_body<T: Serialize>(index: &str, docs: &[(String, &T)]) -> Result<String> {
    let mut body = String::new();
    for (id, doc) in docs {
        let action = json!({ "index": { "_index": index, "_id": id } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(doc)?);
        body.push('\n');
    }
    Ok(body)
}
