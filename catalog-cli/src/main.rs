use anyhow::{Context, Result};
use catalog::config::Config;
use catalog::ItemRepository;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(about = "Catalog CLI - item index administration and example queries")]
#[command(version)]
struct Cli {
    /// Configuration file path (created with defaults if missing)
    #[arg(short, long, default_value = "catalog.toml", global = true)]
    config: String,

    /// Elasticsearch URL (overrides config)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the item index and push its field mappings
    CreateIndex,

    /// Delete the item index
    DeleteIndex,

    /// Index a single item
    Index,

    /// Bulk index the sample items
    IndexList,

    /// List every item, most expensive first
    FindAll,

    /// Fetch one item by id
    Get { id: String },

    /// Delete one item by id
    Delete { id: String },

    /// Count indexed items
    Count,

    /// Items priced within an inclusive range
    PriceBetween {
        #[arg(long, default_value = "2000")]
        min: f64,

        #[arg(long, default_value = "3500")]
        max: f64,
    },

    /// Full-text match on one field
    Match {
        #[arg(long, default_value = "title")]
        field: String,

        #[arg(long, default_value = "小米")]
        text: String,
    },

    /// Native title query, printing totals only
    Native {
        #[arg(long, default_value = "小米")]
        text: String,
    },

    /// One page of a category
    Page {
        #[arg(long, default_value = "手机")]
        category: String,

        #[arg(long, default_value = "0")]
        page: usize,

        #[arg(long, default_value = "3")]
        size: usize,
    },

    /// A category sorted by price, descending
    Sort {
        #[arg(long, default_value = "手机")]
        category: String,
    },

    /// Item counts per brand
    Agg,

    /// Item counts and average price per brand
    SubAgg,

    /// Compare the live index mapping with the item mapping
    VerifyMapping,

    /// Run every example in order against a fresh index
    Demo,
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let json = config.observability.log_format == "json";

    if let Some(log_file) = &config.logging.file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file));
        if json {
            builder.json().init();
        } else {
            builder.init();
        }
    } else {
        // Stderr keeps stdout for command output
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        if json {
            builder.json().init();
        } else {
            builder.init();
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_create(Path::new(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if let Some(url) = cli.url {
        config.elasticsearch.url = url;
        config.validate()?;
    }

    init_logging(&config)?;
    tracing::debug!("Using Elasticsearch at {}", config.elasticsearch.url);

    let repo = ItemRepository::from_config(&config.elasticsearch)?;

    match cli.command {
        Commands::CreateIndex => commands::run_create_index(&repo).await?,
        Commands::DeleteIndex => commands::run_delete_index(&repo).await?,
        Commands::Index => commands::run_index(&repo).await?,
        Commands::IndexList => commands::run_index_list(&repo).await?,
        Commands::FindAll => commands::run_find_all(&repo).await?,
        Commands::Get { id } => commands::run_get(&repo, &id).await?,
        Commands::Delete { id } => commands::run_delete(&repo, &id).await?,
        Commands::Count => commands::run_count(&repo).await?,
        Commands::PriceBetween { min, max } => {
            commands::run_price_between(&repo, min, max).await?
        }
        Commands::Match { field, text } => commands::run_match(&repo, &field, &text).await?,
        Commands::Native { text } => commands::run_native(&repo, &text).await?,
        Commands::Page {
            category,
            page,
            size,
        } => commands::run_page(&repo, &category, page, size).await?,
        Commands::Sort { category } => commands::run_sort(&repo, &category).await?,
        Commands::Agg => commands::run_agg(&repo).await?,
        Commands::SubAgg => commands::run_sub_agg(&repo).await?,
        Commands::VerifyMapping => commands::run_verify_mapping(&repo).await?,
        Commands::Demo => commands::run_demo(&repo).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_page_defaults() {
        let cli = Cli::parse_from(["catalog", "page"]);
        match cli.command {
            Commands::Page {
                category,
                page,
                size,
            } => {
                assert_eq!(category, "手机");
                assert_eq!(page, 0);
                assert_eq!(size, 3);
            }
            other => panic!("Expected page command, got {other:?}"),
        }
        assert_eq!(cli.config, "catalog.toml");
        assert!(cli.url.is_none());
    }

    #[test]
    fn test_global_url_after_subcommand() {
        let cli = Cli::parse_from([
            "catalog",
            "price-between",
            "--min",
            "1000",
            "--url",
            "http://es:9200",
        ]);
        assert_eq!(cli.url.as_deref(), Some("http://es:9200"));
        assert!(matches!(
            cli.command,
            Commands::PriceBetween { min, max } if min == 1000.0 && max == 3500.0
        ));
    }
}
