use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;
use tracing::debug;

use skillswap_core::AppState;
use skillswap_db::Database;

use crate::cli::Cli;
use crate::session::SessionFile;

/// Settings resolved from flags, the environment and `.env`.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub session_file: PathBuf,
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            db_path: cli.db.clone(),
            session_file: cli.session_file.clone(),
            session_ttl: Duration::hours(cli.session_ttl_hours),
        }
    }

    /// Opens the database, applying any pending migrations.
    pub fn open_state(&self) -> Result<AppState> {
        let db = Database::open(&self.db_path)
            .with_context(|| format!("failed to open database at {}", self.db_path.display()))?;
        debug!(path = %self.db_path.display(), version = db.schema_version(), "Database ready");
        Ok(AppState::new(db).with_session_ttl(self.session_ttl))
    }

    pub fn session_file(&self) -> SessionFile {
        SessionFile::new(&self.session_file)
    }
}
