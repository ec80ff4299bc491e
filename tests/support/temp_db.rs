//! Temporary SQLite database for integration tests.

use stratagem::adapter::outbound::sqlite::database::connection::{
    create_pool, run_migrations, DbPool,
};

/// A migrated database file that disappears with the value.
pub struct TempDb {
    _dir: tempfile::TempDir,
    url: String,
    pool: DbPool,
}

impl TempDb {
    pub fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let url = dir.path().join("stratagem.db").display().to_string();
        let pool = create_pool(&url).expect("create sqlite pool");
        run_migrations(&pool).expect("run migrations");
        Self {
            _dir: dir,
            url,
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}
