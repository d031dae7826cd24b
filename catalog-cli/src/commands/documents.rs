use anyhow::Result;
use catalog::model::{sample_items, single_item};
use catalog::{ItemRepository, Repository};

pub async fn run_index(repo: &ItemRepository) -> Result<()> {
    let item = single_item();
    repo.save(&item).await?;
    println!("Indexed {}", item);
    Ok(())
}

/// Bulk index the five sample phones
pub async fn run_index_list(repo: &ItemRepository) -> Result<()> {
    let written = repo.save_all(&sample_items()).await?;
    println!("Indexed {} item(s)", written);
    Ok(())
}

pub async fn run_get(repo: &ItemRepository, id: &str) -> Result<()> {
    match repo.find_by_id(id).await? {
        Some(item) => println!("{}", item),
        None => println!("No item with id {}", id),
    }
    Ok(())
}

pub async fn run_delete(repo: &ItemRepository, id: &str) -> Result<()> {
    if repo.delete_by_id(id).await? {
        println!("Deleted item {}", id);
    } else {
        println!("No item with id {}", id);
    }
    Ok(())
}

pub async fn run_count(repo: &ItemRepository) -> Result<()> {
    println!("{}", repo.count().await?);
    Ok(())
}
