//! Typed search service responses

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{BulkFailure, Error};
use crate::mapping::Document;

/// `POST /{index}/_search` response
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default)]
    pub took: u64,
    #[serde(default)]
    pub timed_out: bool,
    pub hits: HitsResponse<T>,
    #[serde(default)]
    pub aggregations: Option<HashMap<String, AggregationResult>>,
}

impl<T> SearchResponse<T> {
    pub fn total(&self) -> u64 {
        self.hits.total.as_ref().map(TotalHits::value).unwrap_or(0)
    }

    /// Sources of all hits that carried one, in hit order
    pub fn into_sources(self) -> Vec<T> {
        self.hits
            .hits
            .into_iter()
            .filter_map(|hit| hit.source)
            .collect()
    }

    pub fn take_aggregations(&mut self) -> HashMap<String, AggregationResult> {
        self.aggregations.take().unwrap_or_default()
    }
}

impl<T: Document> SearchResponse<T> {
    /// Like [`into_sources`](Self::into_sources), with each document's id taken from `_id`
    pub fn into_documents(self) -> Vec<T> {
        self.hits
            .hits
            .into_iter()
            .filter_map(|hit| {
                let mut doc = hit.source?;
                doc.set_document_id(&hit.id);
                Some(doc)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitsResponse<T> {
    #[serde(default)]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub max_score: Option<f64>,
    #[serde(default = "Vec::new")]
    pub hits: Vec<Hit<T>>,
}

/// Hit count; 6.x answers with a bare number, 7.x with an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Object { value: u64, relation: TotalRelation },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            Self::Count(v) => *v,
            Self::Object { value, .. } => *value,
        }
    }

    /// True when the count is a lower bound rather than exact
    pub fn is_lower_bound(&self) -> bool {
        matches!(
            self,
            Self::Object {
                relation: TotalRelation::Gte,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    Eq,
    Gte,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hit<T> {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default = "Option::default")]
    pub source: Option<T>,
    #[serde(default)]
    pub sort: Option<Vec<Value>>,
}

/// Result of one named aggregation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AggregationResult {
    Buckets {
        #[serde(default)]
        doc_count_error_upper_bound: Option<u64>,
        #[serde(default)]
        sum_other_doc_count: Option<u64>,
        buckets: Vec<Bucket>,
    },
    Stats {
        count: u64,
        min: Option<f64>,
        max: Option<f64>,
        avg: Option<f64>,
        sum: Option<f64>,
    },
    Value {
        value: Option<f64>,
        #[serde(default)]
        value_as_string: Option<String>,
    },
}

impl AggregationResult {
    pub fn buckets(&self) -> Option<&[Bucket]> {
        match self {
            Self::Buckets { buckets, .. } => Some(buckets),
            _ => None,
        }
    }

    /// Single metric value (avg, sum, min, max, value_count, cardinality)
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value { value, .. } => *value,
            _ => None,
        }
    }
}

/// One aggregation bucket with its nested results
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Bucket {
    pub key: Value,
    #[serde(default)]
    pub key_as_string: Option<String>,
    pub doc_count: u64,
    #[serde(flatten)]
    pub aggregations: HashMap<String, AggregationResult>,
}

impl Bucket {
    /// Bucket key as text; string keys are returned without quotes
    pub fn key_as_string(&self) -> String {
        if let Some(s) = &self.key_as_string {
            return s.clone();
        }
        match &self.key {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn aggregation(&self, name: &str) -> Option<&AggregationResult> {
        self.aggregations.get(name)
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.aggregation(name).and_then(AggregationResult::value)
    }
}

/// `POST /{index}/_count` response
#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// `GET /{index}/_doc/{id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct GetResponse<T> {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub found: bool,
    #[serde(rename = "_source", default = "Option::default")]
    pub source: Option<T>,
}

/// Response to single-document writes and deletes
#[derive(Debug, Clone, Deserialize)]
pub struct WriteResponse {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version", default)]
    pub version: Option<u64>,
    pub result: String,
}

/// `POST /{index}/_delete_by_query` response
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteByQueryResponse {
    #[serde(default)]
    pub deleted: u64,
    #[serde(default)]
    pub failures: Vec<Value>,
}

impl DeleteByQueryResponse {
    /// Failures reported per document, or per shard when no id is given
    pub fn failed_documents(&self) -> Vec<BulkFailure> {
        self.failures
            .iter()
            .map(|f| {
                let cause = f
                    .get("cause")
                    .and_then(|c| serde_json::from_value::<ErrorCause>(c.clone()).ok());
                BulkFailure {
                    id: f
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    reason: match cause {
                        Some(cause) => cause.to_string(),
                        None => f.to_string(),
                    },
                }
            })
            .collect()
    }
}

/// `POST /_bulk` response
#[derive(Debug, Clone, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub took: u64,
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItemResult>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkItemResult {
    #[serde(rename = "_index", default)]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorCause>,
}

impl BulkResponse {
    /// Items the service rejected, in request order
    pub fn failures(&self) -> Vec<BulkFailure> {
        self.items
            .iter()
            .flat_map(|item| item.values())
            .filter_map(|r| {
                r.error.as_ref().map(|e| BulkFailure {
                    id: r.id.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    pub fn into_result(self) -> crate::Result<Self> {
        if !self.errors {
            return Ok(self);
        }
        let failed = self.failures();
        tracing::warn!("Bulk request rejected {} item(s)", failed.len());
        Err(Error::Bulk { failed })
    }
}

/// Error body returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    #[serde(default)]
    pub status: Option<u16>,
}

/// Older services answer with a plain string, newer ones with a structured cause
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorBody {
    Cause(ErrorCause),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorCause {
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub index: Option<String>,
}

impl std::fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {}", self.error_type, reason),
            None => f.write_str(&self.error_type),
        }
    }
}

impl ErrorResponse {
    /// Map an error body to the crate error
    pub fn into_error(self, status: u16) -> Error {
        match self.error {
            ErrorBody::Cause(cause) => {
                if cause.error_type == "index_not_found_exception" {
                    let index = cause
                        .index
                        .or(cause.reason)
                        .unwrap_or_else(|| "unknown".to_string());
                    return Error::IndexNotFound(index);
                }
                Error::Api {
                    status,
                    error_type: cause.error_type,
                    reason: cause.reason.unwrap_or_default(),
                }
            }
            ErrorBody::Message(reason) => Error::Api {
                status,
                error_type: "error".to_string(),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Doc {
        title: String,
    }

    #[test]
    fn test_search_response_7x() {
        let body = json!({
            "took": 3,
            "timed_out": false,
            "_shards": {"total": 1, "successful": 1, "skipped": 0, "failed": 0},
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "max_score": 1.2,
                "hits": [
                    {"_index": "item", "_id": "1", "_score": 1.2, "_source": {"title": "a"}},
                    {"_index": "item", "_id": "2", "_score": 0.4, "_source": {"title": "b"}}
                ]
            }
        });
        let resp: SearchResponse<Doc> = serde_json::from_value(body).unwrap();
        assert_eq!(resp.total(), 2);
        assert_eq!(resp.hits.hits[0].id, "1");
        assert_eq!(
            resp.into_sources(),
            vec![Doc { title: "a".into() }, Doc { title: "b".into() }]
        );
    }

    #[test]
    fn test_search_response_6x_total() {
        let body = json!({
            "took": 1,
            "timed_out": false,
            "hits": {"total": 7, "max_score": null, "hits": []}
        });
        let resp: SearchResponse<Doc> = serde_json::from_value(body).unwrap();
        assert_eq!(resp.total(), 7);
        assert!(!resp.hits.total.unwrap().is_lower_bound());
    }

    #[test]
    fn test_hits_without_source_are_skipped() {
        let body = json!({
            "hits": {
                "total": {"value": 10000, "relation": "gte"},
                "hits": [{"_index": "item", "_id": "1", "_score": null}]
            }
        });
        let resp: SearchResponse<Doc> = serde_json::from_value(body).unwrap();
        assert!(resp.hits.total.as_ref().unwrap().is_lower_bound());
        assert_eq!(resp.total(), 10000);
        assert!(resp.into_sources().is_empty());
    }

    #[test]
    fn test_terms_with_avg_sub_aggregation() {
        let body = json!({
            "took": 2,
            "timed_out": false,
            "hits": {"total": {"value": 5, "relation": "eq"}, "hits": []},
            "aggregations": {
                "brands": {
                    "doc_count_error_upper_bound": 0,
                    "sum_other_doc_count": 0,
                    "buckets": [
                        {"key": "华为", "doc_count": 2, "priceAvg": {"value": 3649.0}},
                        {"key": "小米", "doc_count": 2, "priceAvg": {"value": 3799.0}},
                        {"key": "锤子", "doc_count": 1, "priceAvg": {"value": 3699.0}}
                    ]
                },
                "maxPrice": {"value": 4499.0}
            }
        });
        let mut resp: SearchResponse<Doc> = serde_json::from_value(body).unwrap();
        let aggs = resp.take_aggregations();

        let buckets = aggs["brands"].buckets().unwrap();
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].key_as_string(), "华为");
        assert_eq!(buckets[0].doc_count, 2);
        assert_eq!(buckets[0].value("priceAvg"), Some(3649.0));
        assert_eq!(buckets[2].value("missing"), None);

        assert_eq!(aggs["maxPrice"].value(), Some(4499.0));
        assert!(aggs["maxPrice"].buckets().is_none());
    }

    #[test]
    fn test_stats_is_not_mistaken_for_value() {
        let result: AggregationResult = serde_json::from_value(json!({
            "count": 5, "min": 2799.0, "max": 4499.0, "avg": 3719.0, "sum": 18595.0
        }))
        .unwrap();
        assert!(matches!(result, AggregationResult::Stats { count: 5, .. }));
    }

    #[test]
    fn test_numeric_bucket_key() {
        let bucket: Bucket = serde_json::from_value(json!({"key": 3, "doc_count": 1})).unwrap();
        assert_eq!(bucket.key_as_string(), "3");
        assert!(bucket.aggregations.is_empty());
    }

    #[test]
    fn test_bulk_failures() {
        let resp: BulkResponse = serde_json::from_value(json!({
            "took": 4,
            "errors": true,
            "items": [
                {"index": {"_index": "item", "_id": "1", "status": 201, "result": "created"}},
                {"index": {"_index": "item", "_id": "2", "status": 400,
                    "error": {"type": "mapper_parsing_exception", "reason": "failed to parse field [price]"}}}
            ]
        }))
        .unwrap();

        let failed = resp.failures();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, "2");
        assert!(failed[0].reason.starts_with("mapper_parsing_exception"));

        match resp.into_result().unwrap_err() {
            Error::Bulk { failed } => assert_eq!(failed.len(), 1),
            other => panic!("Expected Bulk, got {other:?}"),
        }
    }

    #[test]
    fn test_error_mapping() {
        let missing: ErrorResponse = serde_json::from_value(json!({
            "error": {
                "root_cause": [],
                "type": "index_not_found_exception",
                "reason": "no such index [item]",
                "index": "item"
            },
            "status": 404
        }))
        .unwrap();
        assert!(matches!(missing.into_error(404), Error::IndexNotFound(i) if i == "item"));

        let parse: ErrorResponse = serde_json::from_value(json!({
            "error": {"type": "parsing_exception", "reason": "unknown query [matc]"},
            "status": 400
        }))
        .unwrap();
        match parse.into_error(400) {
            Error::Api {
                status,
                error_type,
                reason,
            } => {
                assert_eq!(status, 400);
                assert_eq!(error_type, "parsing_exception");
                assert_eq!(reason, "unknown query [matc]");
            }
            other => panic!("Expected Api, got {other:?}"),
        }

        let legacy: ErrorResponse =
            serde_json::from_value(json!({"error": "IndexMissingException[[item] missing]", "status": 404}))
                .unwrap();
        assert!(matches!(legacy.into_error(404), Error::Api { status: 404, .. }));
    }

    #[test]
    fn test_delete_by_query_failures() {
        let resp: DeleteByQueryResponse = serde_json::from_value(json!({
            "took": 12,
            "deleted": 3,
            "failures": [
                {"index": "item", "id": "4", "status": 409,
                 "cause": {"type": "version_conflict_engine_exception", "reason": "version conflict"}},
                {"shard": 0, "reason": {"type": "node_closed"}}
            ]
        }))
        .unwrap();

        let failed = resp.failed_documents();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].id, "4");
        assert_eq!(failed[0].reason, "version_conflict_engine_exception: version conflict");
        assert!(failed[1].id.is_empty());
        assert!(failed[1].reason.contains("node_closed"));
    }
}
