use std::path::Path;

use chrono::Utc;
use daylog_core::codec::to_wire;
use daylog_core::models::LogEntry;

use crate::commands::common::{
    format_relative_time, normalize_entry_identifier, open_store, render_markers, resolve_entry,
};
use crate::error::CliError;

pub async fn run_show(
    id: &str,
    as_json: bool,
    db_path: &Path,
    user_id: &str,
) -> Result<LogEntry, CliError> {
    let normalized_id = normalize_entry_identifier(id)?;
    let store = open_store(db_path, user_id).await?;
    let collection = store.snapshot();
    store.close().await;

    let entry = resolve_entry(&normalized_id, &collection)?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&to_wire(&entry))?);
    } else {
        for line in render_entry(&entry) {
            println!("{line}");
        }
    }
    Ok(entry)
}

pub fn render_entry(entry: &LogEntry) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    let mut lines = vec![
        entry.title().to_string(),
        format!(
            "{}  (updated {})",
            entry.occurred_at.format("%A %-d %B %Y"),
            format_relative_time(entry.last_updated.timestamp_millis(), now_ms)
        ),
        format!("id: {}", entry.id),
    ];

    let markers = render_markers(entry);
    if !markers.is_empty() {
        lines.push(markers);
    }
    if let Some(location) = &entry.content.location {
        lines.push(location.full_address.clone().unwrap_or_else(|| {
            format!("{:.5}, {:.5}", location.latitude, location.longitude)
        }));
    }
    if let Some(image) = &entry.content.image {
        let status = if image.is_pending() { " (not uploaded)" } else { "" };
        lines.push(format!("image: {}{status}", image.uri()));
    }
    if let (true, Some(token)) = (entry.is_public(), entry.public_id()) {
        lines.push(format!("share token: {token}"));
    }
    if let Some(body) = &entry.content.body {
        lines.push(String::new());
        lines.push(body.clone());
    }
    lines
}
