use std::path::Path;

use chrono::{NaiveDate, Utc};
use daylog_core::models::{EntryDraft, ImageRef, Location, LogEntry, Mood, Weather};

use crate::commands::common::{collaborators, on_date, open_store, resolve_title, Store};
use crate::error::CliError;

/// Everything `daylog add` was given.
#[derive(Debug, Default)]
pub struct NewEntry {
    pub title: Vec<String>,
    pub body: Option<String>,
    pub mood: Option<Mood>,
    pub weather: Option<Weather>,
    pub date: Option<NaiveDate>,
    pub image: Option<String>,
    pub coordinates: Option<(f64, f64)>,
    pub locate: bool,
    pub fetch_weather: bool,
}

pub async fn run_add(new: NewEntry, db_path: &Path, user_id: &str) -> Result<LogEntry, CliError> {
    let title = resolve_title(&new.title)?;
    let draft = build_draft(title, &new).await?;

    let store = open_store(db_path, user_id).await?;
    let result = add_entry(&store, draft).await;
    store.close().await;

    let entry = result?;
    println!("{}", entry.id);
    Ok(entry)
}

async fn add_entry(store: &Store, draft: EntryDraft) -> Result<LogEntry, CliError> {
    Ok(store.add(draft)?.finish().await?)
}

async fn build_draft(title: String, new: &NewEntry) -> Result<EntryDraft, CliError> {
    let occurred_at = new
        .date
        .map_or_else(Utc::now, |date| on_date(date, Utc::now()));
    let mut draft = EntryDraft::new(title).occurred_at(occurred_at);

    if let Some(body) = &new.body {
        draft = draft.body(body.clone());
    }
    if let Some(mood) = new.mood {
        draft = draft.mood(mood);
    }
    if let Some(image) = &new.image {
        draft = draft.image(ImageRef::from_uri(image.trim()));
    }

    let mut weather = new.weather;
    if let Some((latitude, longitude)) = new.coordinates {
        let needs_services = new.locate || new.fetch_weather;
        let services = if needs_services {
            Some(collaborators()?)
        } else {
            None
        };

        let location = match &services {
            Some(services) if new.locate => services.locate(latitude, longitude).await,
            _ => Location::new(latitude, longitude),
        };
        draft = draft.location(location);

        if let Some(services) = &services {
            if new.fetch_weather && weather.is_none() {
                weather = services.current_weather(latitude, longitude).await;
            }
        }
    }
    if let Some(weather) = weather {
        draft = draft.weather(weather);
    }

    Ok(draft)
}
