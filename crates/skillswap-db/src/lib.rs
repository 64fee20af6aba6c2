pub mod migrations;
pub mod models;
pub mod queries;
pub mod seed;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

pub struct Database {
    conn: Connection,
    schema_version: i64,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {} (schema v{})", path.display(), db.schema_version);
        Ok(db)
    }

    /// Fresh private database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let db = Self::init(Connection::open_in_memory()?)?;
        debug!("In-memory database ready (schema v{})", db.schema_version);
        Ok(db)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Cascades on user_skills, reviews and sessions depend on this.
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let schema_version = migrations::run(&conn)?;
        Ok(Self {
            conn,
            schema_version,
        })
    }

    pub fn schema_version(&self) -> i64 {
        self.schema_version
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        f(&self.conn)
    }
}
