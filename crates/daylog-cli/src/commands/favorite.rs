use std::path::Path;

use daylog_core::models::LogEntry;

use crate::commands::common::{normalize_entry_identifier, open_store, resolve_entry, Store};
use crate::error::CliError;

pub async fn run_favorite(id: &str, db_path: &Path, user_id: &str) -> Result<LogEntry, CliError> {
    let normalized_id = normalize_entry_identifier(id)?;
    let store = open_store(db_path, user_id).await?;
    let result = toggle(&store, &normalized_id).await;
    store.close().await;

    let entry = result?;
    let state = if entry.is_favorite {
        "favourite"
    } else {
        "not favourite"
    };
    println!("{}  {state}", entry.id);
    Ok(entry)
}

async fn toggle(store: &Store, query: &str) -> Result<LogEntry, CliError> {
    let entry = resolve_entry(query, &store.snapshot())?;
    Ok(store.toggle_favorite(entry.id)?.finish().await?)
}
