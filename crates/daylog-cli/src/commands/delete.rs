use std::path::Path;

use daylog_core::models::LogEntry;

use crate::commands::common::{normalize_entry_identifier, open_store, resolve_entry, Store};
use crate::error::CliError;

pub async fn run_delete(id: &str, db_path: &Path, user_id: &str) -> Result<LogEntry, CliError> {
    let normalized_id = normalize_entry_identifier(id)?;
    let store = open_store(db_path, user_id).await?;
    let result = delete_entry(&store, &normalized_id).await;
    store.close().await;

    let entry = result?;
    println!("{}", entry.id);
    Ok(entry)
}

async fn delete_entry(store: &Store, query: &str) -> Result<LogEntry, CliError> {
    let entry = resolve_entry(query, &store.snapshot())?;
    match store.delete(entry.id)? {
        Some(pending) => Ok(pending.finish().await?),
        None => Err(CliError::EntryNotFound(query.to_string())),
    }
}
