use std::path::Path;

use chrono::NaiveDate;
use daylog_core::models::{LogEntry, Mood, Weather};

use crate::commands::common::{
    capture_editor_input_with_initial, normalize_content, normalize_entry_identifier, on_date,
    open_store, resolve_entry, Store,
};
use crate::error::CliError;

/// Field changes requested with `daylog edit`.
#[derive(Debug, Default)]
pub struct EntryEdits {
    pub title: Option<String>,
    pub body: Option<String>,
    pub mood: Option<Mood>,
    pub weather: Option<Weather>,
    pub date: Option<NaiveDate>,
}

impl EntryEdits {
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.mood.is_none()
            && self.weather.is_none()
            && self.date.is_none()
    }

    /// Apply the edits to a copy of `entry`.
    pub fn apply(self, entry: &LogEntry) -> Result<LogEntry, CliError> {
        let mut edited = entry.clone();
        if let Some(title) = self.title {
            edited.content.title = normalize_content(&title).ok_or(CliError::EmptyTitle)?;
        }
        if let Some(body) = self.body {
            edited.content.body = normalize_content(&body);
        }
        if let Some(mood) = self.mood {
            edited.content.mood = Some(mood);
        }
        if let Some(weather) = self.weather {
            edited.content.weather = Some(weather);
        }
        if let Some(date) = self.date {
            edited.occurred_at = on_date(date, entry.occurred_at);
        }
        Ok(edited)
    }
}

/// Edit an entry from flags, or its body in `$EDITOR` when no flag is given.
pub async fn run_edit(
    id: &str,
    edits: EntryEdits,
    db_path: &Path,
    user_id: &str,
) -> Result<LogEntry, CliError> {
    let normalized_id = normalize_entry_identifier(id)?;
    let store = open_store(db_path, user_id).await?;
    let result = edit_entry(&store, &normalized_id, edits).await;
    store.close().await;

    let entry = result?;
    println!("{}", entry.id);
    Ok(entry)
}

async fn edit_entry(store: &Store, query: &str, edits: EntryEdits) -> Result<LogEntry, CliError> {
    let entry = resolve_entry(query, &store.snapshot())?;

    let edited = if edits.is_empty() {
        let current_body = entry.content.body.clone().unwrap_or_default();
        let Some(body) = capture_editor_input_with_initial(&current_body)? else {
            return Err(CliError::EmptyEditedBody);
        };
        let mut edited = entry.clone();
        edited.content.body = Some(body);
        edited
    } else {
        edits.apply(&entry)?
    };

    if edited == entry {
        return Ok(entry);
    }
    Ok(store.update(edited)?.finish().await?)
}
