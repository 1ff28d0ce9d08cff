use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate, Utc};
use daylog_core::config::ServiceConfig;
use daylog_core::db::LibSqlRemote;
use daylog_core::models::{Collection, EntryId, LogEntry};
use daylog_core::services::Collaborators;
use daylog_core::{Group, Session, SyncState, SyncStore};
use serde::Serialize;

use crate::error::CliError;

pub type Store = SyncStore<LibSqlRemote>;

const SHORT_ID_LEN: usize = 13;

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub occurred_at: String,
    pub mood: Option<String>,
    pub weather: Option<String>,
    pub favorite: bool,
    pub public: bool,
    pub relative_time: String,
}

#[derive(Debug, Serialize)]
pub struct GroupItem {
    pub key: String,
    pub entries: Vec<EntryListItem>,
}

pub async fn open_remote(db_path: &Path) -> Result<LibSqlRemote, CliError> {
    Ok(LibSqlRemote::open_path(db_path).await?)
}

/// Open the user's store over the local database and make sure the initial
/// load went through.
pub async fn open_store(db_path: &Path, user_id: &str) -> Result<Store, CliError> {
    let session = Session::new(user_id)?;
    let remote = open_remote(db_path).await?;
    let store = SyncStore::open(&session, remote).await;

    if store.sync_state() == SyncState::Error {
        store.close().await;
        return Err(CliError::Core(daylog_core::Error::RemoteUnavailable(format!(
            "could not load entries from {}",
            db_path.display()
        ))));
    }
    Ok(store)
}

pub fn collaborators() -> Result<Collaborators, CliError> {
    let config = ServiceConfig::from_env();
    config.validate().map_err(CliError::Config)?;
    Ok(Collaborators::from_config(&config)?)
}

pub fn resolve_entry(query: &str, collection: &Collection) -> Result<LogEntry, CliError> {
    if let Ok(id) = query.parse::<EntryId>() {
        if let Some(entry) = collection.get(&id) {
            return Ok(entry.clone());
        }
    }

    let query_lower = query.to_ascii_lowercase();
    let matching = collection
        .values()
        .filter(|entry| entry.id.to_string().starts_with(&query_lower))
        .take(3)
        .collect::<Vec<_>>();

    match matching.as_slice() {
        [] => Err(CliError::EntryNotFound(query.to_string())),
        [entry] => Ok((*entry).clone()),
        _ => {
            let options = matching
                .iter()
                .map(|entry| short_id(entry.id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousEntryId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: EntryId) -> String {
    id.to_string().chars().take(SHORT_ID_LEN).collect()
}

pub fn format_group_lines(groups: &[Group<'_>]) -> Vec<String> {
    let mut lines = Vec::new();
    for (index, group) in groups.iter().enumerate() {
        if index > 0 {
            lines.push(String::new());
        }
        lines.push(format!("{} ({})", group.key, group.entries.len()));
        lines.extend(group.entries.iter().map(|entry| format_entry_line(entry)));
    }
    lines
}

pub fn format_entry_line(entry: &LogEntry) -> String {
    let short_id = short_id(entry.id);
    let date = entry.occurred_at.format("%Y-%m-%d");
    let title = entry_preview(entry.title(), 40);
    let markers = render_markers(entry);

    if markers.is_empty() {
        format!("  {short_id:<13}  {date}  {title}")
    } else {
        format!("  {short_id:<13}  {date}  {title:<40}  {markers}")
    }
}

/// Favourite, sharing, mood and weather markers of an entry.
pub fn render_markers(entry: &LogEntry) -> String {
    let mut markers = Vec::new();
    if entry.is_favorite {
        markers.push("★");
    }
    if entry.is_public() {
        markers.push("shared");
    }
    if let Some(mood) = entry.content.mood {
        markers.push(mood.label());
    }
    if let Some(weather) = entry.content.weather {
        markers.push(weather.label());
    }
    markers.join(" ")
}

pub fn group_to_item(group: &Group<'_>) -> GroupItem {
    GroupItem {
        key: group.key.clone(),
        entries: group.entries.iter().map(|entry| entry_to_list_item(entry)).collect(),
    }
}

pub fn entry_to_list_item(entry: &LogEntry) -> EntryListItem {
    let now_ms = Utc::now().timestamp_millis();
    EntryListItem {
        id: entry.id.to_string(),
        title: entry.title().to_string(),
        body: entry.content.body.clone(),
        occurred_at: entry.occurred_at.to_rfc3339(),
        mood: entry.content.mood.map(|mood| mood.name().to_string()),
        weather: entry.content.weather.map(|weather| weather.name().to_string()),
        favorite: entry.is_favorite,
        public: entry.is_public(),
        relative_time: format_relative_time(entry.last_updated.timestamp_millis(), now_ms),
    }
}

pub fn entry_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Place `date` at the time of day of `time_of`.
pub fn on_date(date: NaiveDate, time_of: DateTime<Utc>) -> DateTime<Utc> {
    date.and_time(time_of.time()).and_utc()
}

pub fn resolve_title(title_parts: &[String]) -> Result<String, CliError> {
    normalize_content(&title_parts.join(" ")).ok_or(CliError::EmptyTitle)
}

/// Body from the flag, else from piped stdin.
pub fn resolve_body(body: Option<String>) -> Result<Option<String>, CliError> {
    if let Some(body) = body {
        return Ok(normalize_content(&body));
    }
    read_piped_stdin()
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_entry_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyEntryId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_entry_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let edited = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&edited))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let status = Command::new(program).args(parts).arg(file_path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

fn create_temp_entry_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("daylog-entry-{}-{now}.md", std::process::id()))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os("DAYLOG_DB_PATH").map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("daylog").join("daylog.db"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}
