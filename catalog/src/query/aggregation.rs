use serde_json::{json, Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum AggregationKind {
    /// One bucket per distinct value
    Terms { size: Option<usize> },
    Avg,
    Sum,
    Min,
    Max,
    ValueCount,
    Cardinality,
}

impl AggregationKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Terms { .. } => "terms",
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::ValueCount => "value_count",
            Self::Cardinality => "cardinality",
        }
    }

    pub fn is_bucket(&self) -> bool {
        matches!(self, Self::Terms { .. })
    }
}

/// A named aggregation, optionally with nested sub-aggregations
///
/// ```
/// use catalog::Aggregation;
///
/// let agg = Aggregation::terms("brands")
///     .field("brand")
///     .sub_aggregation(Aggregation::avg("priceAvg").field("price"));
/// assert_eq!(agg.name, "brands");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub name: String,
    pub field: String,
    pub kind: AggregationKind,
    pub sub_aggregations: Vec<Aggregation>,
}

impl Aggregation {
    fn new(name: impl Into<String>, kind: AggregationKind) -> Self {
        Self {
            name: name.into(),
            field: String::new(),
            kind,
            sub_aggregations: Vec::new(),
        }
    }

    pub fn terms(name: impl Into<String>) -> Self {
        Self::new(name, AggregationKind::Terms { size: None })
    }

    pub fn avg(name: impl Into<String>) -> Self {
        Self::new(name, AggregationKind::Avg)
    }

    pub fn sum(name: impl Into<String>) -> Self {
        Self::new(name, AggregationKind::Sum)
    }

    pub fn min(name: impl Into<String>) -> Self {
        Self::new(name, AggregationKind::Min)
    }

    pub fn max(name: impl Into<String>) -> Self {
        Self::new(name, AggregationKind::Max)
    }

    pub fn value_count(name: impl Into<String>) -> Self {
        Self::new(name, AggregationKind::ValueCount)
    }

    pub fn cardinality(name: impl Into<String>) -> Self {
        Self::new(name, AggregationKind::Cardinality)
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Number of buckets to return. Ignored for metric aggregations.
    pub fn size(mut self, size: usize) -> Self {
        if let AggregationKind::Terms { size: s } = &mut self.kind {
            *s = Some(size);
        }
        self
    }

    pub fn sub_aggregation(mut self, agg: Aggregation) -> Self {
        self.sub_aggregations.push(agg);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::InvalidQuery("aggregation name is empty".into()));
        }
        if self.field.is_empty() {
            return Err(Error::InvalidQuery(format!(
                "aggregation '{}' has no field",
                self.name
            )));
        }
        if !self.kind.is_bucket() && !self.sub_aggregations.is_empty() {
            return Err(Error::InvalidQuery(format!(
                "metric aggregation '{}' cannot have sub-aggregations",
                self.name
            )));
        }
        self.sub_aggregations.iter().try_for_each(Aggregation::validate)
    }

    /// Body of this aggregation, without its name
    pub fn to_json(&self) -> Value {
        let mut params = Map::new();
        params.insert("field".into(), Value::String(self.field.clone()));
        if let AggregationKind::Terms { size: Some(size) } = self.kind {
            params.insert("size".into(), json!(size));
        }

        let mut body = Map::new();
        body.insert(self.kind.name().into(), Value::Object(params));
        if !self.sub_aggregations.is_empty() {
            body.insert("aggs".into(), Self::to_json_map(&self.sub_aggregations));
        }
        Value::Object(body)
    }

    /// `{name: body, ...}` for a list of sibling aggregations
    pub fn to_json_map(aggs: &[Aggregation]) -> Value {
        let map: Map<String, Value> = aggs
            .iter()
            .map(|a| (a.name.clone(), a.to_json()))
            .collect();
        Value::Object(map)
    }
}
