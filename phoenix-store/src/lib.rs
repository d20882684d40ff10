pub mod app_config;
pub mod database;
pub mod memory_repo;
pub mod postgres_repo;
pub mod seed;

use phoenix_core::AirlineRepository;
use std::sync::Arc;
use tracing::{info, warn};

pub use app_config::Config;
pub use database::DbClient;
pub use memory_repo::InMemoryRepository;
pub use postgres_repo::PostgresRepository;

/// Postgres when a URL is configured, otherwise a fresh in-memory store.
pub async fn open_repository(
    cfg: &app_config::DatabaseConfig,
) -> Result<Arc<dyn AirlineRepository>, sqlx::Error> {
    match &cfg.url {
        Some(url) => {
            let client = DbClient::connect(cfg, url).await?;
            info!("Connected to Postgres");
            Ok(Arc::new(PostgresRepository::new(client.pool)))
        }
        None => {
            warn!("No database.url configured, using the in-memory repository");
            Ok(Arc::new(InMemoryRepository::new()))
        }
    }
}
