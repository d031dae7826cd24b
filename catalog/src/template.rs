//! Typed index administration and queries
//!
//! Everything here is keyed by a [`Document`] type: the index name, settings
//! and field mappings all come from [`Document::mapping`].

use std::collections::HashMap;

use crate::client::ElasticClient;
use crate::error::Result;
use crate::mapping::{diff_mappings, parse_mapping_response, Document, FieldMapping, MappingMismatch};
use crate::page::{AggregatedPage, Page};
use crate::query::{Query, SearchQuery};

#[derive(Debug, Clone)]
pub struct IndexTemplate {
    client: ElasticClient,
}

impl IndexTemplate {
    pub fn new(client: ElasticClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ElasticClient {
        &self.client
    }

    /// Create the index with the document's shard and replica settings.
    /// Returns false if it already exists.
    pub async fn create_index<T: Document>(&self) -> Result<bool> {
        let mapping = T::mapping();
        mapping.validate()?;
        let body = serde_json::json!({ "settings": mapping.settings_body() });
        self.client.create_index(&mapping.index_name, &body).await
    }

    /// Create the index with settings and mappings in a single request
    pub async fn create_index_with_mapping<T: Document>(&self) -> Result<bool> {
        let mapping = T::mapping();
        mapping.validate()?;
        self.client
            .create_index(&mapping.index_name, &mapping.create_index_body())
            .await
    }

    /// Push the document's field mappings to its index
    pub async fn put_mapping<T: Document>(&self) -> Result<bool> {
        let mapping = T::mapping();
        mapping.validate()?;
        self.client
            .put_mapping(&mapping.index_name, &mapping.mapping_body())
            .await?;
        Ok(true)
    }

    pub async fn delete_index<T: Document>(&self) -> Result<bool> {
        self.client.delete_index(&T::index_name()).await
    }

    pub async fn index_exists<T: Document>(&self) -> Result<bool> {
        self.client.index_exists(&T::index_name()).await
    }

    /// Field mappings currently live in the document's index
    pub async fn get_mapping<T: Document>(&self) -> Result<HashMap<String, FieldMapping>> {
        let index = T::index_name();
        let body = self.client.get_mapping(&index).await?;
        parse_mapping_response(&index, body)
    }

    /// Differences between the declared mapping and the live one
    pub async fn verify_mapping<T: Document>(&self) -> Result<Vec<MappingMismatch>> {
        let live = self.get_mapping::<T>().await?;
        let mismatches = diff_mappings(&T::mapping(), &live);
        for m in &mismatches {
            tracing::warn!("Mapping drift in '{}': {}", T::index_name(), m);
        }
        Ok(mismatches)
    }

    pub async fn refresh<T: Document>(&self) -> Result<()> {
        self.client.refresh(&T::index_name()).await
    }

    pub async fn count<T: Document>(&self, query: Option<&Query>) -> Result<u64> {
        self.client.count(&T::index_name(), query).await
    }

    /// Run a native search query and return the requested page with its aggregations
    pub async fn query_for_page<T: Document>(&self, query: &SearchQuery) -> Result<AggregatedPage<T>> {
        let index = T::index_name();
        let mut response = self.client.search::<T>(&index, &query.to_body()).await?;

        let total = response.total();
        let aggregations = response.take_aggregations();
        let content = response.into_documents();
        tracing::debug!(
            "Search on '{}' matched {} document(s), returned {}",
            index,
            total,
            content.len()
        );

        let page = Page::new(content, query.page_request(), total);
        Ok(AggregatedPage::new(page, aggregations))
    }
}
