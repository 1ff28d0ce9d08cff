use std::path::Path;

use daylog_core::models::{ImageRef, LogEntry};
use daylog_core::services::{Collaborators, NarrativeRequest};

use crate::commands::common::{
    collaborators, normalize_entry_identifier, open_store, resolve_entry, Store,
};
use crate::error::CliError;

/// Narrate the entry's uploaded photo and append the text to its body.
pub async fn run_narrate(
    id: &str,
    words: u32,
    db_path: &Path,
    user_id: &str,
) -> Result<LogEntry, CliError> {
    let normalized_id = normalize_entry_identifier(id)?;
    let services = collaborators()?;
    let store = open_store(db_path, user_id).await?;
    let result = narrate(&store, &services, &normalized_id, words).await;
    store.close().await;

    let entry = result?;
    if let Some(body) = &entry.content.body {
        println!("{body}");
    }
    Ok(entry)
}

async fn narrate(
    store: &Store,
    services: &Collaborators,
    query: &str,
    words: u32,
) -> Result<LogEntry, CliError> {
    let entry = resolve_entry(query, &store.snapshot())?;
    let request = narrative_request(&entry, words)?;
    let narrative = services.narrate(&request).await?;

    let mut edited = entry;
    edited.content.body = Some(append_paragraph(edited.content.body.as_deref(), &narrative));
    Ok(store.update(edited)?.finish().await?)
}

pub fn narrative_request(entry: &LogEntry, words: u32) -> Result<NarrativeRequest, CliError> {
    let Some(ImageRef::Remote(url)) = &entry.content.image else {
        return Err(CliError::NoImage(entry.id.to_string()));
    };
    let location = entry
        .content
        .location
        .as_ref()
        .and_then(|location| location.full_address.clone());
    Ok(NarrativeRequest::new(url.clone(), entry.occurred_at)
        .location(location)
        .words(words))
}

pub fn append_paragraph(body: Option<&str>, paragraph: &str) -> String {
    match body.map(str::trim_end) {
        Some(existing) if !existing.is_empty() => format!("{existing}\n\n{paragraph}"),
        _ => paragraph.to_string(),
    }
}
