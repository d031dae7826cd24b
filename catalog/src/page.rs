//! Paging primitives

use std::collections::HashMap;

use crate::query::Sort;
use crate::response::{AggregationResult, Bucket};

/// Default page size when a search names no page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Zero-based page request
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub sort: Sort,
}

impl PageRequest {
    pub fn of(page: usize, size: usize) -> Self {
        Self::of_sorted(page, size, Sort::unsorted())
    }

    pub fn of_sorted(page: usize, size: usize, sort: Sort) -> Self {
        Self { page, size, sort }
    }

    pub fn first(size: usize) -> Self {
        Self::of(0, size)
    }

    /// Index of the first document on this page
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    pub fn next(&self) -> Self {
        Self::of_sorted(self.page + 1, self.size, self.sort.clone())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::of(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the total match count
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    content: Vec<T>,
    total_elements: u64,
    pageable: Option<PageRequest>,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, pageable: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            total_elements,
            pageable: Some(pageable),
        }
    }

    /// A page holding every result
    pub fn unpaged(content: Vec<T>) -> Self {
        let total_elements = content.len() as u64;
        Self {
            content,
            total_elements,
            pageable: None,
        }
    }

    pub fn empty() -> Self {
        Self::unpaged(Vec::new())
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// Requested page size, or the content length when unpaged
    pub fn size(&self) -> usize {
        match &self.pageable {
            Some(p) => p.size,
            None => self.content.len(),
        }
    }

    /// Zero-based page number
    pub fn number(&self) -> usize {
        self.pageable.as_ref().map(|p| p.page).unwrap_or(0)
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn pageable(&self) -> Option<&PageRequest> {
        self.pageable.as_ref()
    }

    /// A zero size counts as a single page
    pub fn total_pages(&self) -> usize {
        let size = self.size();
        if size == 0 {
            1
        } else {
            self.total_elements.div_ceil(size as u64) as usize
        }
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.number() + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number() > 0
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.content.iter()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            pageable: self.pageable,
        }
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.content.iter()
    }
}

/// A page together with the aggregations computed for the same search
#[derive(Debug, Clone)]
pub struct AggregatedPage<T> {
    pub page: Page<T>,
    pub aggregations: HashMap<String, AggregationResult>,
}

impl<T> AggregatedPage<T> {
    pub fn new(page: Page<T>, aggregations: HashMap<String, AggregationResult>) -> Self {
        Self { page, aggregations }
    }

    pub fn has_aggregations(&self) -> bool {
        !self.aggregations.is_empty()
    }

    pub fn aggregation(&self, name: &str) -> Option<&AggregationResult> {
        self.aggregations.get(name)
    }

    /// Buckets of a bucket aggregation, `None` if absent or not bucketed
    pub fn terms(&self, name: &str) -> Option<&[Bucket]> {
        self.aggregation(name).and_then(AggregationResult::buckets)
    }

    pub fn into_page(self) -> Page<T> {
        self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::of(0, 3).offset(), 0);
        assert_eq!(PageRequest::of(2, 3).offset(), 6);
        assert_eq!(PageRequest::of(2, 3).next().page, 3);
    }

    #[test]
    fn test_page_arithmetic() {
        let page = Page::new(vec![1, 2, 3], PageRequest::of(0, 3), 5);
        assert_eq!(page.total_elements(), 5);
        assert_eq!(page.total_pages(), 2);
        assert_eq!(page.size(), 3);
        assert_eq!(page.number(), 0);
        assert_eq!(page.number_of_elements(), 3);
        assert!(page.has_next());
        assert!(page.is_first());
        assert!(!page.is_last());

        let last = Page::new(vec![4, 5], PageRequest::of(1, 3), 5);
        assert!(last.is_last());
        assert!(last.has_previous());
    }

    #[test]
    fn test_exact_multiple() {
        let page = Page::new(vec![1, 2], PageRequest::of(0, 2), 4);
        assert_eq!(page.total_pages(), 2);
    }

    #[test]
    fn test_unpaged() {
        let page = Page::unpaged(vec!["a", "b"]);
        assert_eq!(page.total_pages(), 1);
        assert_eq!(page.size(), 2);
        assert!(page.is_last());

        let empty: Page<i32> = Page::empty();
        assert_eq!(empty.total_pages(), 1);
        assert!(!empty.has_content());
    }

    #[test]
    fn test_map_keeps_totals() {
        let page = Page::new(vec![1, 2], PageRequest::of(1, 2), 7).map(|n| n * 10);
        assert_eq!(page.content(), &[10, 20]);
        assert_eq!(page.total_elements(), 7);
        assert_eq!(page.number(), 1);
        assert_eq!(page.total_pages(), 4);
    }
}
