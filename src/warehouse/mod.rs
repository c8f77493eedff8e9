pub mod demo;
pub mod postgres;
pub mod rows;
pub mod sqlite;
pub mod trait_def;

pub use demo::{demo_catalog, CatalogSeed};
pub use postgres::PostgresWarehouse;
pub use sqlite::SqliteWarehouse;
pub use trait_def::Warehouse;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::{DatabaseBackend, WarehouseConfig};

/// Open a pool against the configured backend.
pub async fn connect(config: &WarehouseConfig) -> Result<Arc<dyn Warehouse>> {
    let warehouse: Arc<dyn Warehouse> = match config.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite warehouse ({:?} credentials)", config.source);
            Arc::new(SqliteWarehouse::new(&config.url, config.max_connections).await?)
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL warehouse ({:?} credentials)", config.source);
            Arc::new(PostgresWarehouse::new(&config.url, config.max_connections).await?)
        }
    };

    Ok(warehouse)
}
