use anyhow::Result;
use catalog::{
    Direction, Item, ItemRepository, Order, Page, PageRequest, Query, Repository,
    SearchQueryBuilder, Sort,
};

fn print_items<'a>(items: impl IntoIterator<Item = &'a Item>) {
    for item in items {
        println!("{}", item);
    }
}

pub async fn run_find_all(repo: &ItemRepository) -> Result<()> {
    let items = repo
        .find_all_sorted(Sort::by(Direction::Desc, &["price"]))
        .await?;
    print_items(&items);
    Ok(())
}

pub async fn run_price_between(repo: &ItemRepository, min: f64, max: f64) -> Result<()> {
    let items = repo.find_by_price_between(min, max).await?;
    for item in &items {
        println!("item = {}", item);
    }
    Ok(())
}

pub async fn run_match(repo: &ItemRepository, field: &str, text: &str) -> Result<()> {
    let items = repo.search(Query::match_query(field, text)).await?;
    print_items(&items);
    Ok(())
}

/// Title match through a native query; only the totals are printed
pub async fn run_native(repo: &ItemRepository, text: &str) -> Result<()> {
    let query = SearchQueryBuilder::new()
        .with_query(Query::match_query("title", text))
        .build()?;
    let page = repo.search_page(&query).await?.into_page();

    println!("{}", page.total_elements());
    println!("{}", page.total_pages());
    Ok(())
}

pub async fn run_page(repo: &ItemRepository, category: &str, page: usize, size: usize) -> Result<()> {
    let query = SearchQueryBuilder::new()
        .with_query(Query::match_query("category", category))
        .with_pageable(PageRequest::of(page, size))
        .build()?;
    let result = repo.search_page(&query).await?.into_page();

    print_page_summary(&result);
    print_items(&result);
    Ok(())
}

pub async fn run_sort(repo: &ItemRepository, category: &str) -> Result<()> {
    let query = SearchQueryBuilder::new()
        .with_query(Query::term("category", category))
        .with_sort(Order::desc("price"))
        .build()?;
    let page = repo.search_page(&query).await?.into_page();

    println!("Total elements: {}", page.total_elements());
    print_items(&page);
    Ok(())
}

fn print_page_summary(page: &Page<Item>) {
    println!("Total elements: {}", page.total_elements());
    println!("Total pages:    {}", page.total_pages());
    println!("Page size:      {}", page.size());
    println!("Current page:   {}", page.number());
}
