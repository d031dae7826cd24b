use anyhow::{Context, Result};
use catalog::query::SourceFilter;
use catalog::{Aggregation, AggregatedPage, Item, ItemRepository, Repository, SearchQueryBuilder};

const BRANDS: &str = "brands";
const PRICE_AVG: &str = "priceAvg";

async fn brand_buckets(repo: &ItemRepository, with_average: bool) -> Result<AggregatedPage<Item>> {
    let mut brands = Aggregation::terms(BRANDS).field("brand");
    if with_average {
        brands = brands.sub_aggregation(Aggregation::avg(PRICE_AVG).field("price"));
    }

    let query = SearchQueryBuilder::new()
        .with_source_filter(SourceFilter::none())
        .add_aggregation(brands)
        .build()?;
    Ok(repo.search_page(&query).await?)
}

/// Item count per brand
pub async fn run_agg(repo: &ItemRepository) -> Result<()> {
    let result = brand_buckets(repo, false).await?;
    let buckets = result
        .terms(BRANDS)
        .context("Response has no brands aggregation")?;

    for bucket in buckets {
        println!("{}", bucket.key_as_string());
        println!("{}", bucket.doc_count);
    }
    Ok(())
}

/// Item count and average price per brand
pub async fn run_sub_agg(repo: &ItemRepository) -> Result<()> {
    let result = brand_buckets(repo, true).await?;
    let buckets = result
        .terms(BRANDS)
        .context("Response has no brands aggregation")?;

    for bucket in buckets {
        println!("{}, {} item(s)", bucket.key_as_string(), bucket.doc_count);
        match bucket.value(PRICE_AVG) {
            Some(avg) => println!("Average price: {}", avg),
            None => println!("Average price: n/a"),
        }
    }
    Ok(())
}
