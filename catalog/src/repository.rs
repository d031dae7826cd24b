//! CRUD repository over one document type

use async_trait::async_trait;
use std::marker::PhantomData;

use crate::client::ElasticClient;
use crate::config::ElasticsearchConfig;
use crate::error::{Error, Result};
use crate::mapping::Document;
use crate::model::Item;
use crate::page::{AggregatedPage, Page, PageRequest};
use crate::query::{Query, SearchQuery, SearchQueryBuilder, Sort};
use crate::template::IndexTemplate;

/// Repository operations for a document type
#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    /// Insert or replace the document under its id
    async fn save(&self, entity: &T) -> Result<()>;

    /// Insert or replace every document in one bulk request; returns how many were written
    async fn save_all(&self, entities: &[T]) -> Result<usize>;

    async fn find_by_id(&self, id: &str) -> Result<Option<T>>;

    async fn exists_by_id(&self, id: &str) -> Result<bool>;

    async fn find_all(&self) -> Result<Vec<T>>;

    async fn find_all_sorted(&self, sort: Sort) -> Result<Vec<T>>;

    async fn find_all_paged(&self, pageable: PageRequest) -> Result<Page<T>>;

    async fn find_all_by_id(&self, ids: &[String]) -> Result<Vec<T>>;

    async fn count(&self) -> Result<u64>;

    async fn delete_by_id(&self, id: &str) -> Result<bool>;

    async fn delete(&self, entity: &T) -> Result<bool>;

    /// Remove every document but keep the index; returns the number removed.
    /// Fails with [`Error::Bulk`] if any matching document could not be removed.
    async fn delete_all(&self) -> Result<u64>;

    /// Every document matching `query`
    async fn search(&self, query: Query) -> Result<Vec<T>>;

    /// Exactly the page, sort, source filter and aggregations `query` asks for
    async fn search_page(&self, query: &SearchQuery) -> Result<AggregatedPage<T>>;
}

/// [`Repository`] backed by the document's Elasticsearch index
#[derive(Debug, Clone)]
pub struct ElasticsearchRepository<T> {
    template: IndexTemplate,
    refresh_on_write: bool,
    _marker: PhantomData<fn() -> T>,
}

pub type ItemRepository = ElasticsearchRepository<Item>;

impl<T: Document> ElasticsearchRepository<T> {
    pub fn new(template: IndexTemplate) -> Self {
        Self {
            template,
            refresh_on_write: true,
            _marker: PhantomData,
        }
    }

    pub fn from_config(config: &ElasticsearchConfig) -> Result<Self> {
        let template = IndexTemplate::new(ElasticClient::new(config)?);
        Ok(Self::new(template).with_refresh_on_write(config.refresh_on_write))
    }

    pub fn with_refresh_on_write(mut self, refresh: bool) -> Self {
        self.refresh_on_write = refresh;
        self
    }

    pub fn template(&self) -> &IndexTemplate {
        &self.template
    }

    fn index(&self) -> String {
        T::index_name()
    }

    async fn refresh_after_write(&self) -> Result<()> {
        if self.refresh_on_write {
            self.template.refresh::<T>().await?;
        }
        Ok(())
    }

    /// Count, then fetch every match in a single page
    pub async fn search_all(&self, query: Query, sort: Sort) -> Result<Vec<T>> {
        let total = self.template.count::<T>(Some(&query)).await?;
        if total == 0 {
            return Ok(Vec::new());
        }
        let size = usize::try_from(total)
            .map_err(|_| Error::InvalidQuery(format!("{} results do not fit in one page", total)))?;

        let search = SearchQueryBuilder::new()
            .with_query(query)
            .with_pageable(PageRequest::of_sorted(0, size, sort))
            .build()?;
        let page = self.template.query_for_page::<T>(&search).await?;
        Ok(page.into_page().into_content())
    }
}

#[async_trait]
impl<T: Document> Repository<T> for ElasticsearchRepository<T> {
    async fn save(&self, entity: &T) -> Result<()> {
        let id = entity.document_id();
        self.template
            .client()
            .index_document(&self.index(), &id, entity)
            .await?;
        tracing::debug!("Saved document '{}' to '{}'", id, self.index());
        self.refresh_after_write().await
    }

    async fn save_all(&self, entities: &[T]) -> Result<usize> {
        if entities.is_empty() {
            return Ok(0);
        }
        let docs: Vec<(String, &T)> = entities.iter().map(|e| (e.document_id(), e)).collect();
        self.template.client().bulk_index(&self.index(), &docs).await?;
        self.refresh_after_write().await?;
        Ok(docs.len())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.template.client().get_document(&self.index(), id).await
    }

    async fn exists_by_id(&self, id: &str) -> Result<bool> {
        self.template.client().document_exists(&self.index(), id).await
    }

    async fn find_all(&self) -> Result<Vec<T>> {
        self.search_all(Query::match_all(), Sort::unsorted()).await
    }

    async fn find_all_sorted(&self, sort: Sort) -> Result<Vec<T>> {
        self.search_all(Query::match_all(), sort).await
    }

    async fn find_all_paged(&self, pageable: PageRequest) -> Result<Page<T>> {
        let search = SearchQueryBuilder::new().with_pageable(pageable).build()?;
        Ok(self.template.query_for_page::<T>(&search).await?.into_page())
    }

    async fn find_all_by_id(&self, ids: &[String]) -> Result<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.search_all(Query::ids(ids.iter().cloned()), Sort::unsorted())
            .await
    }

    async fn count(&self) -> Result<u64> {
        self.template.count::<T>(None).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let deleted = self
            .template
            .client()
            .delete_document(&self.index(), id)
            .await?;
        if deleted {
            self.refresh_after_write().await?;
        }
        Ok(deleted)
    }

    async fn delete(&self, entity: &T) -> Result<bool> {
        self.delete_by_id(&entity.document_id()).await
    }

    async fn delete_all(&self) -> Result<u64> {
        let deleted = self
            .template
            .client()
            .delete_by_query(&self.index(), &Query::match_all())
            .await?;
        self.refresh_after_write().await?;
        Ok(deleted)
    }

    async fn search(&self, query: Query) -> Result<Vec<T>> {
        self.search_all(query, Sort::unsorted()).await
    }

    async fn search_page(&self, query: &SearchQuery) -> Result<AggregatedPage<T>> {
        self.template.query_for_page::<T>(query).await
    }
}

/// Finders derived from item field names
impl ElasticsearchRepository<Item> {
    /// Items priced within `[min, max]`
    pub async fn find_by_price_between(&self, min: f64, max: f64) -> Result<Vec<Item>> {
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::InvalidQuery(format!(
                "price bounds must be finite: [{}, {}]",
                min, max
            )));
        }
        if min > max {
            return Err(Error::InvalidQuery(format!(
                "price range is empty: {} > {}",
                min, max
            )));
        }
        self.search_all(Query::between("price", min, max), Sort::unsorted())
            .await
    }

    /// Full-text match on the analyzed title
    pub async fn find_by_title(&self, title: &str) -> Result<Vec<Item>> {
        self.search_all(Query::match_query("title", title), Sort::unsorted())
            .await
    }

    pub async fn find_by_brand(&self, brand: &str) -> Result<Vec<Item>> {
        self.search_all(Query::term("brand", brand), Sort::unsorted())
            .await
    }

    pub async fn find_by_category(&self, category: &str) -> Result<Vec<Item>> {
        self.search_all(Query::term("category", category), Sort::unsorted())
            .await
    }

    pub async fn find_by_category_order_by_price_desc(&self, category: &str) -> Result<Vec<Item>> {
        self.search_all(
            Query::term("category", category),
            Sort::by(crate::query::Direction::Desc, &["price"]),
        )
        .await
    }
}
