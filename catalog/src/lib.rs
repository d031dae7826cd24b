//! catalog: typed Elasticsearch object mapping for a product catalog
//!
//! Documents declare their index layout through [`Document::mapping`], and
//! every read or write goes through the search service's HTTP/JSON API:
//!
//! - [`IndexTemplate`] creates indices and pushes mappings
//! - [`ElasticsearchRepository`] saves, fetches, counts and deletes documents
//! - [`SearchQueryBuilder`] assembles match/term/range queries with sorting,
//!   paging, source filtering and aggregations
//!
//! Nothing is indexed, scored or aggregated locally.

pub mod client;
pub mod config;
pub mod error;
pub mod mapping;
pub mod model;
pub mod page;
pub mod query;
pub mod repository;
pub mod response;
pub mod template;

pub use client::ElasticClient;
pub use config::Config;
pub use error::{Error, Result};
pub use mapping::{Document, DocumentMapping, FieldMapping, FieldType, IndexSettings};
pub use model::Item;
pub use page::{AggregatedPage, Page, PageRequest};
pub use query::{
    Aggregation, BoolQuery, Direction, Order, Query, SearchQuery, SearchQueryBuilder, Sort,
    SourceFilter,
};
pub use repository::{ElasticsearchRepository, ItemRepository, Repository};
pub use template::IndexTemplate;
