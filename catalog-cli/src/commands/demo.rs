use anyhow::Result;
use catalog::ItemRepository;

use super::{aggregate, documents, index, search};

fn section(title: &str) {
    println!();
    println!("{}", title);
    println!("{}", "=".repeat(title.chars().count()));
}

/// Recreate the item index and walk through every example
pub async fn run_demo(repo: &ItemRepository) -> Result<()> {
    let info = repo.template().client().ping().await?;
    println!(
        "Connected to '{}' (Elasticsearch {})",
        info.cluster_name, info.version.number
    );

    section("Create index");
    index::run_delete_index(repo).await?;
    index::run_create_index(repo).await?;

    section("Index one item");
    documents::run_index(repo).await?;

    section("Index a list");
    documents::run_index_list(repo).await?;

    section("All items by price");
    search::run_find_all(repo).await?;

    section("Price between 2000 and 3500");
    search::run_price_between(repo, 2000.0, 3500.0).await?;

    section("Match title");
    search::run_match(repo, "title", "小米").await?;

    section("Native query");
    search::run_native(repo, "小米").await?;

    section("Paged query");
    search::run_page(repo, "手机", 0, 3).await?;

    section("Sorted query");
    search::run_sort(repo, "手机").await?;

    section("Brand aggregation");
    aggregate::run_agg(repo).await?;

    section("Average price per brand");
    aggregate::run_sub_agg(repo).await?;

    Ok(())
}
