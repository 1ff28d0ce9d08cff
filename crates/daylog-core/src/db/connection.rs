//! libSQL database handle

use std::path::Path;

use libsql::{Builder, Connection};

use super::migrations;
use crate::error::Result;

/// Best-effort tuning. In-memory databases reject WAL, so failures are ignored.
const TUNING_PRAGMAS: [&str; 2] = ["PRAGMA journal_mode = WAL", "PRAGMA synchronous = NORMAL"];

/// A migrated libSQL database with one open connection.
pub struct Database {
    _db: libsql::Database,
    conn: Connection,
}

impl Database {
    /// Open or create the database file at `path`, creating missing parent
    /// directories.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)?,
            _ => {}
        }
        Self::connect(&path.to_string_lossy()).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        Self::connect(":memory:").await
    }

    async fn connect(location: &str) -> Result<Self> {
        let db = Builder::new_local(location).build().await?;
        let conn = db.connect()?;

        for pragma in TUNING_PRAGMAS {
            if let Err(error) = conn.execute(pragma, ()).await {
                tracing::debug!("Skipping `{pragma}` on {location}: {error}");
            }
        }
        migrations::run(&conn).await?;

        tracing::debug!("Database ready at {location}");
        Ok(Self { _db: db, conn })
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
