use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use report_builder::api;
use report_builder::config::Config;
use report_builder::dispatcher::QueryDispatcher;
use report_builder::warehouse::{self, demo_catalog};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize warehouse
    let warehouse = warehouse::connect(&config.warehouse).await?;

    info!("Initializing warehouse schema...");
    warehouse.init().await?;
    info!("Warehouse schema initialized successfully");

    if config.seed_demo {
        if warehouse.is_empty().await? {
            info!("Seeding demo report catalog");
            warehouse.seed(&demo_catalog()).await?;
        } else {
            info!("Warehouse already holds a catalog, skipping demo seed");
        }
    }

    let dispatcher = Arc::new(QueryDispatcher::new(Arc::clone(&warehouse)));
    let api_router = api::create_api_router(dispatcher);

    // Start API server
    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - Query endpoint available at http://{}/api/query", api_addr);

    axum::serve(api_listener, api_router).await?;

    Ok(())
}
