//! Log entry model

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Mood, Weather};

/// Prefix marking an image reference that still lives on the device.
const PENDING_IMAGE_PREFIX: &str = "file:";

/// A unique identifier for an entry, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Create a new unique entry ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Entries keyed by id. Iteration follows id order, which is creation order
/// for ids minted by [`EntryId::new`].
pub type Collection = BTreeMap<EntryId, LogEntry>;

/// Reference to the photo attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Already uploaded, reachable by URL
    Remote(String),
    /// Local file URI waiting for upload
    Pending(String),
}

impl ImageRef {
    /// Classify a raw URI. `file:` URIs are pending uploads.
    pub fn from_uri(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        if uri.starts_with(PENDING_IMAGE_PREFIX) {
            Self::Pending(uri)
        } else {
            Self::Remote(uri)
        }
    }

    /// The raw URI, unchanged from what was stored.
    #[must_use]
    pub fn uri(&self) -> &str {
        match self {
            Self::Remote(uri) | Self::Pending(uri) => uri,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Where an entry was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Reverse-geocoded address, when it could be resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,
}

impl Location {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            full_address: None,
        }
    }

    /// Attach a resolved address.
    #[must_use]
    pub fn with_address(mut self, address: Option<String>) -> Self {
        self.full_address = address;
        self
    }
}

/// User-authored content of an entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntryContent {
    /// Title (required by the forms layer, never validated here)
    pub title: String,
    /// Free text body
    pub body: Option<String>,
    pub image: Option<ImageRef>,
    pub mood: Option<Mood>,
    pub weather: Option<Weather>,
    pub location: Option<Location>,
}

impl EntryContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Public sharing state.
///
/// A share token, once issued, stays with the entry through later
/// private/public cycles so a link is never re-issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    Private { public_id: Option<String> },
    Public { public_id: String },
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Private { public_id: None }
    }
}

impl Visibility {
    #[must_use]
    pub const fn is_public(&self) -> bool {
        matches!(self, Self::Public { .. })
    }

    /// The share token, if one was ever issued.
    #[must_use]
    pub fn public_id(&self) -> Option<&str> {
        match self {
            Self::Private { public_id } => public_id.as_deref(),
            Self::Public { public_id } => Some(public_id),
        }
    }

    /// Same token, private.
    #[must_use]
    pub fn to_private(&self) -> Self {
        Self::Private {
            public_id: self.public_id().map(ToString::to_string),
        }
    }
}

/// A journal entry in its local form.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Unique identifier
    pub id: EntryId,
    pub content: EntryContent,
    /// The day the entry is about
    pub occurred_at: DateTime<Utc>,
    pub is_favorite: bool,
    /// Last mutation time, used only for conflict resolution
    pub last_updated: DateTime<Utc>,
    /// Soft delete flag for sync
    pub is_deleted: bool,
    pub visibility: Visibility,
}

impl LogEntry {
    /// Materialize a draft with a fresh id.
    ///
    /// `last_updated` is taken from `occurred_at`, not the wall clock: merge
    /// history on other devices was written with this convention.
    #[must_use]
    pub fn from_draft(draft: EntryDraft) -> Self {
        Self {
            id: EntryId::new(),
            content: draft.content,
            occurred_at: draft.occurred_at,
            is_favorite: draft.is_favorite,
            last_updated: draft.occurred_at,
            is_deleted: false,
            visibility: Visibility::default(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.content.title
    }

    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.visibility.is_public()
    }

    #[must_use]
    pub fn public_id(&self) -> Option<&str> {
        self.visibility.public_id()
    }

    /// Copy with `last_updated` set to `now`.
    #[must_use]
    pub fn touched(mut self, now: DateTime<Utc>) -> Self {
        self.last_updated = now;
        self
    }
}

/// Input for creating an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub content: EntryContent,
    pub occurred_at: DateTime<Utc>,
    pub is_favorite: bool,
}

impl EntryDraft {
    /// Draft dated now.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            content: EntryContent::new(title),
            occurred_at: Utc::now(),
            is_favorite: false,
        }
    }

    #[must_use]
    pub const fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.content.body = Some(body.into());
        self
    }

    #[must_use]
    pub const fn mood(mut self, mood: Mood) -> Self {
        self.content.mood = Some(mood);
        self
    }

    #[must_use]
    pub const fn weather(mut self, weather: Weather) -> Self {
        self.content.weather = Some(weather);
        self
    }

    #[must_use]
    pub fn location(mut self, location: Location) -> Self {
        self.content.location = Some(location);
        self
    }

    #[must_use]
    pub fn image(mut self, image: ImageRef) -> Self {
        self.content.image = Some(image);
        self
    }

    #[must_use]
    pub const fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }
}
