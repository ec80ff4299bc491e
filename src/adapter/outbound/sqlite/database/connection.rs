//! Database connection management using Diesel ORM.
//!
//! Every pooled connection gets a busy timeout and foreign-key enforcement
//! so the engine's loop and CLI invocations can share one database file.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::error::{Error, Result};

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const POOL_SIZE: u32 = 5;

/// Applies per-connection pragmas when the pool opens a connection.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), diesel::r2d2::Error> {
        diesel::sql_query(format!("PRAGMA busy_timeout = {}", self.busy_timeout_ms))
            .execute(conn)
            .and_then(|_| diesel::sql_query("PRAGMA foreign_keys = ON").execute(conn))
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Create a connection pool for the given database path or URL.
///
/// A `sqlite://` prefix is accepted and stripped.
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    let path = database_url.strip_prefix("sqlite://").unwrap_or(database_url);
    let manager = ConnectionManager::<SqliteConnection>::new(path);
    Pool::builder()
        .max_size(POOL_SIZE)
        .connection_customizer(Box::new(SqlitePragmas {
            busy_timeout_ms: 5_000,
        }))
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}

/// Run all pending database migrations.
///
/// # Errors
/// Returns an error if migrations fail.
pub fn run_migrations(pool: &DbPool) -> Result<()> {
    let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::Database(e.to_string()))?;
    if !applied.is_empty() {
        tracing::info!(count = applied.len(), "Applied database migrations");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(diesel::QueryableByName)]
    struct TableName {
        #[diesel(sql_type = diesel::sql_types::Text)]
        name: String,
    }

    #[derive(diesel::QueryableByName)]
    struct PragmaValue {
        #[diesel(sql_type = diesel::sql_types::BigInt)]
        timeout: i64,
    }

    fn temp_pool() -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("engine.db").display());
        let pool = create_pool(&url).unwrap();
        (dir, pool)
    }

    #[test]
    fn migrations_create_engine_tables() {
        let (_dir, pool) = temp_pool();
        run_migrations(&pool).unwrap();

        let mut conn = pool.get().unwrap();
        let tables: Vec<String> = diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' \
             AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name",
        )
        .load::<TableName>(&mut conn)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();

        assert_eq!(
            tables,
            vec![
                "alerts",
                "configuration_history",
                "kill_switch_events",
                "lifecycle_events",
                "performance_records",
                "strategies",
                "update_triggers",
            ]
        );
    }

    #[test]
    fn migrations_are_idempotent() {
        let (_dir, pool) = temp_pool();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();
    }

    #[test]
    fn pooled_connections_carry_busy_timeout() {
        let (_dir, pool) = temp_pool();
        let mut conn = pool.get().unwrap();
        let value: Vec<PragmaValue> = diesel::sql_query("PRAGMA busy_timeout")
            .load(&mut conn)
            .unwrap();
        assert_eq!(value[0].timeout, 5_000);
    }

    #[test]
    fn pool_shares_one_file_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let (_dir, pool) = temp_pool();
        run_migrations(&pool).unwrap();
        let pool = Arc::new(pool);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let mut conn = pool.get().unwrap();
                    let tables: Vec<TableName> =
                        diesel::sql_query("SELECT name FROM sqlite_master WHERE name = 'strategies'")
                            .load(&mut conn)
                            .unwrap();
                    assert_eq!(tables.len(), 1);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
