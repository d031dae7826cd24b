//! Native search query assembly

use serde_json::{json, Map, Value};

use super::aggregation::Aggregation;
use super::dsl::{BoolQuery, Query};
use super::sort::Order;
use crate::error::{Error, Result};
use crate::page::PageRequest;

/// Which `_source` fields the search returns
#[derive(Debug, Clone, PartialEq)]
pub enum SourceFilter {
    /// Return no source at all; hits carry only ids and scores
    None,
    Fields {
        includes: Vec<String>,
        excludes: Vec<String>,
    },
}

impl SourceFilter {
    pub fn none() -> Self {
        SourceFilter::None
    }

    pub fn includes<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        SourceFilter::Fields {
            includes: fields.into_iter().map(Into::into).collect(),
            excludes: Vec::new(),
        }
    }

    pub fn excludes<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        SourceFilter::Fields {
            includes: Vec::new(),
            excludes: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            SourceFilter::None => Value::Bool(false),
            SourceFilter::Fields { includes, excludes } => {
                let mut obj = Map::new();
                if !includes.is_empty() {
                    obj.insert("includes".into(), json!(includes));
                }
                if !excludes.is_empty() {
                    obj.insert("excludes".into(), json!(excludes));
                }
                Value::Object(obj)
            }
        }
    }
}

/// A fully assembled search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: Query,
    pub filter: Option<Query>,
    pub sorts: Vec<Order>,
    pub pageable: Option<PageRequest>,
    pub source_filter: Option<SourceFilter>,
    pub aggregations: Vec<Aggregation>,
    pub min_score: Option<f32>,
    pub track_total_hits: bool,
}

impl SearchQuery {
    pub fn builder() -> SearchQueryBuilder {
        SearchQueryBuilder::new()
    }

    /// The requested page, or the default first page of ten
    pub fn page_request(&self) -> PageRequest {
        self.pageable.clone().unwrap_or_default()
    }

    /// Copy of this query asking for a different page
    pub fn with_page(&self, pageable: PageRequest) -> Self {
        let mut q = self.clone();
        q.pageable = Some(pageable);
        q
    }

    /// The clause sent as `query`, with any filter folded into a bool query
    pub fn effective_query(&self) -> Query {
        match &self.filter {
            Some(filter) => BoolQuery::new()
                .must(self.query.clone())
                .filter(filter.clone())
                .into(),
            None => self.query.clone(),
        }
    }

    /// Body for `POST /{index}/_search`
    pub fn to_body(&self) -> Value {
        let page = self.page_request();
        let mut body = Map::new();

        body.insert("query".into(), self.effective_query().to_json());
        body.insert("from".into(), json!(page.offset()));
        body.insert("size".into(), json!(page.size));

        // Page sort first, then explicit sorts
        let sort: Vec<Value> = page
            .sort
            .orders()
            .iter()
            .chain(self.sorts.iter())
            .map(Order::to_json)
            .collect();
        if !sort.is_empty() {
            body.insert("sort".into(), Value::Array(sort));
        }

        if let Some(source) = &self.source_filter {
            body.insert("_source".into(), source.to_json());
        }
        if !self.aggregations.is_empty() {
            body.insert("aggs".into(), Aggregation::to_json_map(&self.aggregations));
        }
        if let Some(min_score) = self.min_score {
            body.insert("min_score".into(), json!(min_score));
        }
        if self.track_total_hits {
            body.insert("track_total_hits".into(), Value::Bool(true));
        }

        Value::Object(body)
    }
}

/// Builder for [`SearchQuery`]
///
/// ```
/// use catalog::{PageRequest, Query, SearchQueryBuilder};
///
/// let query = SearchQueryBuilder::new()
///     .with_query(Query::match_query("category", "手机"))
///     .with_pageable(PageRequest::of(0, 3))
///     .build()
///     .unwrap();
/// assert_eq!(query.to_body()["size"], 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchQueryBuilder {
    query: Option<Query>,
    filter: Option<Query>,
    sorts: Vec<Order>,
    pageable: Option<PageRequest>,
    source_filter: Option<SourceFilter>,
    aggregations: Vec<Aggregation>,
    min_score: Option<f32>,
    track_total_hits: Option<bool>,
}

impl SearchQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Non-scoring clause applied on top of the query
    pub fn with_filter(mut self, filter: Query) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sort(mut self, order: Order) -> Self {
        self.sorts.push(order);
        self
    }

    pub fn with_pageable(mut self, pageable: PageRequest) -> Self {
        self.pageable = Some(pageable);
        self
    }

    pub fn with_source_filter(mut self, filter: SourceFilter) -> Self {
        self.source_filter = Some(filter);
        self
    }

    pub fn add_aggregation(mut self, agg: Aggregation) -> Self {
        self.aggregations.push(agg);
        self
    }

    pub fn with_min_score(mut self, score: f32) -> Self {
        self.min_score = Some(score);
        self
    }

    pub fn track_total_hits(mut self, track: bool) -> Self {
        self.track_total_hits = Some(track);
        self
    }

    pub fn build(self) -> Result<SearchQuery> {
        if let Some(page) = &self.pageable {
            if page.size == 0 {
                return Err(Error::InvalidQuery("page size must be at least 1".into()));
            }
        }
        for agg in &self.aggregations {
            agg.validate()?;
        }
        if let Some(order) = self.sorts.iter().find(|o| o.property.is_empty()) {
            return Err(Error::InvalidQuery(format!(
                "sort on empty field ({})",
                order.direction.as_str()
            )));
        }

        Ok(SearchQuery {
            query: self.query.unwrap_or_else(Query::match_all),
            filter: self.filter,
            sorts: self.sorts,
            pageable: self.pageable,
            source_filter: self.source_filter,
            aggregations: self.aggregations,
            min_score: self.min_score,
            track_total_hits: self.track_total_hits.unwrap_or(true),
        })
    }
}
