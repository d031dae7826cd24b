//! Query DSL types
//!
//! Field-keyed queries serialize as `{"match": {"title": {...}}}`, the same
//! shape the search service accepts, so a built query can be sent as-is.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A query clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Match every document
    MatchAll(MatchAllQuery),

    /// Analyzed full-text match
    Match(BTreeMap<String, MatchQuery>),

    /// Exact value, not analyzed
    Term(BTreeMap<String, TermQuery>),

    /// Any of several exact values
    Terms(BTreeMap<String, Vec<Value>>),

    /// Bounded range on a numeric, date or keyword field
    Range(BTreeMap<String, RangeQuery>),

    /// Boolean combination of clauses
    Bool(BoolQuery),

    /// Documents by `_id`
    Ids(IdsQuery),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchAllQuery {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchQuery {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,
}

impl RangeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gt(mut self, v: impl Into<Value>) -> Self {
        self.gt = Some(v.into());
        self
    }

    pub fn gte(mut self, v: impl Into<Value>) -> Self {
        self.gte = Some(v.into());
        self
    }

    pub fn lt(mut self, v: impl Into<Value>) -> Self {
        self.lt = Some(v.into());
        self
    }

    pub fn lte(mut self, v: impl Into<Value>) -> Self {
        self.lte = Some(v.into());
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.gt.is_none() && self.gte.is_none() && self.lt.is_none() && self.lte.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<u32>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must(mut self, q: Query) -> Self {
        self.must.push(q);
        self
    }

    pub fn should(mut self, q: Query) -> Self {
        self.should.push(q);
        self
    }

    pub fn must_not(mut self, q: Query) -> Self {
        self.must_not.push(q);
        self
    }

    pub fn filter(mut self, q: Query) -> Self {
        self.filter.push(q);
        self
    }

    pub fn minimum_should_match(mut self, n: u32) -> Self {
        self.minimum_should_match = Some(n);
        self
    }
}

impl From<BoolQuery> for Query {
    fn from(b: BoolQuery) -> Self {
        Query::Bool(b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdsQuery {
    pub values: Vec<String>,
}

impl Query {
    pub fn match_all() -> Self {
        Query::MatchAll(MatchAllQuery::default())
    }

    pub fn match_query(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self::match_with_operator(field, text, None)
    }

    pub fn match_with_operator(
        field: impl Into<String>,
        text: impl Into<String>,
        operator: Option<Operator>,
    ) -> Self {
        let q = MatchQuery {
            query: text.into(),
            operator,
        };
        Query::Match(BTreeMap::from([(field.into(), q)]))
    }

    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let q = TermQuery {
            value: value.into(),
            boost: None,
        };
        Query::Term(BTreeMap::from([(field.into(), q)]))
    }

    pub fn terms<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Query::Terms(BTreeMap::from([(field.into(), values)]))
    }

    pub fn range(field: impl Into<String>, range: RangeQuery) -> Self {
        Query::Range(BTreeMap::from([(field.into(), range)]))
    }

    /// Inclusive on both ends
    pub fn between(field: impl Into<String>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Self::range(field, RangeQuery::new().gte(from).lte(to))
    }

    pub fn ids<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Query::Ids(IdsQuery {
            values: ids.into_iter().map(Into::into).collect(),
        })
    }

    pub fn to_json(&self) -> Value {
        // Every variant is plain data; serialization cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
