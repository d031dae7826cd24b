use anyhow::Result;
use catalog::{Item, ItemRepository};

/// Create the item index, then push its field mappings
pub async fn run_create_index(repo: &ItemRepository) -> Result<()> {
    let template = repo.template();

    if template.create_index::<Item>().await? {
        println!("Created index '{}'", catalog::model::ITEM_INDEX);
    } else {
        println!("Index '{}' already exists", catalog::model::ITEM_INDEX);
    }
    template.put_mapping::<Item>().await?;
    println!("Mapping applied");

    Ok(())
}

pub async fn run_delete_index(repo: &ItemRepository) -> Result<()> {
    if repo.template().delete_index::<Item>().await? {
        println!("Deleted index '{}'", catalog::model::ITEM_INDEX);
    } else {
        println!("Index '{}' does not exist", catalog::model::ITEM_INDEX);
    }
    Ok(())
}

pub async fn run_verify_mapping(repo: &ItemRepository) -> Result<()> {
    let mismatches = repo.template().verify_mapping::<Item>().await?;

    if mismatches.is_empty() {
        println!("Mapping of '{}' is up to date", catalog::model::ITEM_INDEX);
        return Ok(());
    }

    println!("Mapping of '{}' differs:", catalog::model::ITEM_INDEX);
    for m in &mismatches {
        println!("  {}", m);
    }
    anyhow::bail!("{} mapping mismatch(es)", mismatches.len());
}
