//! Composition root: builds the engine and its adapters from configuration.

use std::sync::Arc;

use tracing::info;

use crate::adapter::outbound::executor::{DryRunExecutor, SignalFileExecutor};
use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations, DbPool};
use crate::adapter::outbound::sqlite::performance::SqlitePerformanceSource;
use crate::adapter::outbound::sqlite::store::SqliteConfigurationStore;
use crate::application::engine::{Engine, EngineDeps};
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::clock::SystemClock;
use crate::port::outbound::executor::StrategyExecutor;
use crate::port::outbound::notifier::{LogNotifier, NotifierRegistry};

/// Open the database and bring its schema up to date.
///
/// # Errors
///
/// Returns an error if the pool cannot be created or a migration fails.
pub fn open_database(config: &Config) -> Result<DbPool> {
    let pool = create_pool(&config.database)?;
    run_migrations(&pool)?;
    Ok(pool)
}

/// Notifiers every engine gets.
#[must_use]
pub fn build_notifier_registry() -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry
}

/// Signal files when a directory is configured, otherwise a dry run.
#[must_use]
pub fn build_executor(config: &Config) -> Arc<dyn StrategyExecutor> {
    match &config.execution.signals_dir {
        Some(dir) => {
            info!(dir = %dir, "Reading strategy signals from files");
            Arc::new(SignalFileExecutor::new(dir))
        }
        None => {
            info!("No signal directory configured - dry run");
            Arc::new(DryRunExecutor)
        }
    }
}

/// Wire an engine over the configured SQLite database. Nothing is loaded yet;
/// call [`Engine::restore`] or [`Engine::initialize`] next.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub fn build_engine(config: &Config) -> Result<Arc<Engine>> {
    let pool = open_database(config)?;
    let deps = EngineDeps {
        performance: Arc::new(SqlitePerformanceSource::new(pool.clone())),
        executor: build_executor(config),
        store: Arc::new(SqliteConfigurationStore::new(pool)),
        notifiers: Arc::new(build_notifier_registry()),
        clock: Arc::new(SystemClock),
    };
    info!(database = %config.database, "Engine wired");
    Ok(Arc::new(Engine::new(config.engine_config(), deps)))
}
