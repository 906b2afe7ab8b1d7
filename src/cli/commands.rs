//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::catalog::{CatalogEntity, CatalogStore, Collection, Customer, MenuItem, Order, OrderItem};
use crate::config::Config;
use crate::executor::QueryEngine;
use crate::observability::{Logger, MetricsRegistry};
use crate::planner::QueryDescriptor;
use crate::projection::ShapeRegistry;
use crate::rest_api::{parse_query, RestError, RestServer};

use super::args::{Command, QueryOptions};
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Query {
            config,
            collection,
            options,
        } => query(&config, &collection, &options),
    }
}

/// Loads config, applies its log level, and loads the seed catalog
fn boot(config_path: &Path) -> CliResult<(Config, CatalogStore)> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.log_level);

    let store = match &config.seed_path {
        Some(path) => CatalogStore::load(path)?,
        None => CatalogStore::empty(),
    };

    Ok((config, store))
}

/// Start the HTTP server and block until shutdown
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let (mut config, store) = boot(config_path)?;
    if let Some(port) = port {
        config.port = port;
        config.validate()?;
    }

    let server = RestServer::new(config, store)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })?;

    Ok(())
}

/// Execute one query and print the envelope
pub fn query(config_path: &Path, collection: &str, options: &QueryOptions) -> CliResult<()> {
    let (config, store) = boot(config_path)?;

    let collection: Collection = collection
        .parse()
        .map_err(|_| RestError::CollectionNotFound(collection.to_string()))?;
    let descriptor = parse_query(&options.to_params(), config.max_top)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    let envelope = rt.block_on(async {
        match collection {
            Collection::Customers => execute::<Customer>(&store, &descriptor).await,
            Collection::MenuItems => execute::<MenuItem>(&store, &descriptor).await,
            Collection::Orders => execute::<Order>(&store, &descriptor).await,
            Collection::OrderItems => execute::<OrderItem>(&store, &descriptor).await,
        }
    })?;

    write_json(&envelope)
}

async fn execute<E: CatalogEntity>(
    store: &CatalogStore,
    descriptor: &QueryDescriptor,
) -> CliResult<Value> {
    let engine: QueryEngine<E> =
        QueryEngine::with_registries(ShapeRegistry::global(), Arc::new(MetricsRegistry::new()));
    let linked = descriptor.expand().is_some_and(|e| !e.is_empty());

    let envelope = engine
        .execute(store.query::<E>(linked), descriptor, &CancellationToken::new())
        .await
        .map_err(RestError::from)?;

    Ok(serde_json::to_value(&envelope)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use std::fs;
    use tempfile::TempDir;

    const SEED: &str = r#"{
        "menuItems": [
            {"id": 1, "createdOn": "2024-01-01T00:00:00Z", "updatedOn": "2024-01-01T00:00:00Z",
             "itemName": "Soup", "price": 6.0},
            {"id": 2, "createdOn": "2024-01-01T00:00:00Z", "updatedOn": "2024-01-01T00:00:00Z",
             "itemName": "Steak", "price": 24.0, "category": "main"}
        ]
    }"#;

    fn setup() -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("seed.json"), SEED).unwrap();
        let config = dir.path().join("aeroquery.json");
        fs::write(&config, r#"{"seed_path": "seed.json", "log_level": "error"}"#).unwrap();
        (dir, config)
    }

    #[test]
    fn test_boot_loads_seed() {
        let (_dir, config) = setup();
        let (_, store) = boot(&config).unwrap();
        assert_eq!(store.len(Collection::MenuItems), 2);
    }

    #[test]
    fn test_execute_projects_menu_items() {
        let (_dir, config) = setup();
        let (_, store) = boot(&config).unwrap();
        let descriptor = parse_query(
            &QueryOptions {
                filter: Some("price gt 10".into()),
                select: Some("itemName".into()),
                ..QueryOptions::default()
            }
            .to_params(),
            config_max_top(),
        )
        .unwrap();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let value = rt.block_on(execute::<MenuItem>(&store, &descriptor)).unwrap();
        assert_eq!(value, serde_json::json!({"items": [{"itemname": "Steak"}]}));
    }

    #[test]
    fn test_unknown_collection_fails() {
        let (_dir, config) = setup();
        let err = query(&config, "tables", &QueryOptions::default()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::QueryFailed);
    }

    fn config_max_top() -> usize {
        Config::default().max_top
    }
}
