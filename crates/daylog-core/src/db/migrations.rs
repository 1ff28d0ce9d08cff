//! Schema migrations for the libSQL remote store.

use crate::error::Result;
use libsql::Connection;

struct Migration {
    version: i64,
    name: &'static str,
    statements: &'static [&'static str],
}

/// Ordered schema history. Each step runs in its own transaction.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "entries and trash",
        statements: &[
            // `document` holds the stored (wire) form; the scalar columns
            // mirror what lookups and ordering need.
            "CREATE TABLE entries (
                user_id TEXT NOT NULL,
                id TEXT NOT NULL,
                document TEXT NOT NULL,
                last_updated_ms INTEGER NOT NULL,
                is_public INTEGER NOT NULL DEFAULT 0,
                public_id TEXT,
                PRIMARY KEY (user_id, id)
            )",
            "CREATE INDEX idx_entries_user ON entries(user_id)",
            "CREATE TABLE trash (
                user_id TEXT NOT NULL,
                id TEXT NOT NULL,
                document TEXT NOT NULL,
                deleted_at_ms INTEGER NOT NULL,
                PRIMARY KEY (user_id, id)
            )",
        ],
    },
    Migration {
        version: 2,
        name: "public shares and comments",
        statements: &[
            "CREATE TABLE public_shares (
                token TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                entry_id TEXT NOT NULL
            )",
            "CREATE INDEX idx_public_shares_entry ON public_shares(owner_id, entry_id)",
            "CREATE TABLE comments (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id TEXT NOT NULL,
                entry_id TEXT NOT NULL,
                document TEXT NOT NULL,
                created_at_ms INTEGER NOT NULL
            )",
            "CREATE INDEX idx_comments_entry ON comments(owner_id, entry_id, created_at_ms)",
        ],
    },
];

/// Bring the schema up to the latest version.
pub async fn run(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        (),
    )
    .await?;

    let current = schema_version(conn).await?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(conn, migration).await?;
    }
    Ok(())
}

pub(crate) fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

async fn schema_version(conn: &Connection) -> Result<i64> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get::<i64>(0)?),
        None => Ok(0),
    }
}

async fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.transaction().await?;
    for statement in migration.statements {
        tx.execute(statement, ()).await?;
    }
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [migration.version],
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        "Applied schema version {} ({})",
        migration.version,
        migration.name
    );
    Ok(())
}
