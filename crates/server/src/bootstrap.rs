use std::sync::Arc;

use deskvoice_agent::AssistantRuntime;
use deskvoice_core::config::{AppConfig, ConfigError, LoadOptions};
use deskvoice_db::{connect_with_config, migrations, seed_knowledge, DbPool, RepositoryError, SqlServiceDesk};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub desk: Arc<SqlServiceDesk>,
    pub assistant: AssistantRuntime,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("knowledge seeding failed: {0}")]
    Seed(#[source] RepositoryError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let seeded = seed_knowledge(&db_pool).await.map_err(BootstrapError::Seed)?;
    info!(
        event_name = "system.bootstrap.knowledge_ready",
        correlation_id = "bootstrap",
        seeded,
        "knowledge base ready"
    );

    let desk = Arc::new(SqlServiceDesk::new(db_pool.clone()));
    let assistant = AssistantRuntime::new(desk.clone());

    Ok(Application { config, db_pool, desk, assistant })
}
