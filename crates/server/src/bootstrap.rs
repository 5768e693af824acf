use tenderflow_core::config::AppConfig;
use tenderflow_core::quorum::QuorumEngine;
use tenderflow_core::services::{BidService, TenderService};
use tenderflow_db::{connect, migrations, sql_stores, DbPool};
use thiserror::Error;
use tracing::info;

use crate::api::ApiState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub api: ApiState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

/// Connects, migrates, and wires the services for an already loaded configuration.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        max_connections = config.database.max_connections,
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let stores = sql_stores(db_pool.clone());
    let quorum = QuorumEngine::new(config.decisions.max_quorum);
    let api = ApiState {
        tenders: TenderService::new(stores.clone()),
        bids: BidService::new(stores, quorum),
        pages: config.pagination.settings(),
    };
    info!(
        event_name = "system.bootstrap.services_ready",
        max_quorum = quorum.max_quorum(),
        "services wired"
    );

    Ok(Application { config, db_pool, api })
}
