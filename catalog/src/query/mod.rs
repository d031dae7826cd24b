//! Elasticsearch request building
//!
//! Only the request side lives here; result decoding is in [`crate::response`].

pub mod aggregation;
pub mod builder;
pub mod dsl;
pub mod sort;

pub use aggregation::{Aggregation, AggregationKind};
pub use builder::{SearchQuery, SearchQueryBuilder, SourceFilter};
pub use dsl::{BoolQuery, MatchQuery, Operator, Query, RangeQuery, TermQuery};
pub use sort::{Direction, Order, Sort};
