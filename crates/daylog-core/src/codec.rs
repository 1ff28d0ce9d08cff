//! Conversion between the local entry form and the stored document form.
//!
//! Documents keep the field layout the mobile clients already write
//! (`data.title`, `data.imageUri`, `lastUpdated`, ...), with every date
//! stored as a `{seconds, nanoseconds}` timestamp. The two forms carry the
//! same information, so `to_local(to_wire(e)) == e` for every entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    Comment, EntryContent, EntryId, ImageRef, Location, LogEntry, Mood, Visibility, Weather,
};

/// Serializable timestamp with nanosecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WireTimestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl WireTimestamp {
    #[must_use]
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self {
            seconds: value.timestamp(),
            nanoseconds: value.timestamp_subsec_nanos(),
        }
    }

    /// Out-of-range values clamp to chrono's representable bounds.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.seconds, self.nanoseconds).unwrap_or_else(|| {
            tracing::warn!("Clamping out-of-range timestamp {}s", self.seconds);
            if self.seconds < 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                DateTime::<Utc>::MAX_UTC
            }
        })
    }

    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }
}

/// Stored form of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEntry {
    pub id: EntryId,
    pub data: WireContent,
    pub last_updated: WireTimestamp,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

/// Stored form of the user-authored part of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireContent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<Weather>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    pub date: WireTimestamp,
    #[serde(default)]
    pub is_favorite: bool,
}

/// Stored form of a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireComment {
    pub content: String,
    #[serde(rename = "createAt")]
    pub created_at: WireTimestamp,
    #[serde(rename = "createBy")]
    pub created_by: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

/// Convert a local entry to its stored form.
#[must_use]
pub fn to_wire(entry: &LogEntry) -> WireEntry {
    WireEntry {
        id: entry.id,
        data: WireContent {
            title: entry.content.title.clone(),
            content: entry.content.body.clone(),
            image_uri: entry
                .content
                .image
                .as_ref()
                .map(|image| image.uri().to_string()),
            weather: entry.content.weather,
            location: entry.content.location.clone(),
            mood: entry.content.mood,
            date: WireTimestamp::from_datetime(entry.occurred_at),
            is_favorite: entry.is_favorite,
        },
        last_updated: WireTimestamp::from_datetime(entry.last_updated),
        is_deleted: entry.is_deleted,
        is_public: entry.is_public(),
        public_id: entry.public_id().map(ToString::to_string),
    }
}

/// Convert a stored document to the local form.
#[must_use]
pub fn to_local(wire: WireEntry) -> LogEntry {
    let visibility = match (wire.is_public, wire.public_id) {
        (true, Some(public_id)) => Visibility::Public { public_id },
        (true, None) => {
            tracing::warn!("Entry {} is flagged public without a share token", wire.id);
            Visibility::Private { public_id: None }
        }
        (false, public_id) => Visibility::Private { public_id },
    };

    LogEntry {
        id: wire.id,
        content: EntryContent {
            title: wire.data.title,
            body: wire.data.content,
            image: wire.data.image_uri.map(ImageRef::from_uri),
            mood: wire.data.mood,
            weather: wire.data.weather,
            location: wire.data.location,
        },
        occurred_at: wire.data.date.to_datetime(),
        is_favorite: wire.data.is_favorite,
        last_updated: wire.last_updated.to_datetime(),
        is_deleted: wire.is_deleted,
        visibility,
    }
}

#[must_use]
pub fn comment_to_wire(comment: &Comment) -> WireComment {
    WireComment {
        content: comment.content.clone(),
        created_at: WireTimestamp::from_datetime(comment.created_at),
        created_by: comment.created_by.clone(),
    }
}

#[must_use]
pub fn comment_to_local(wire: WireComment) -> Comment {
    Comment {
        content: wire.content,
        created_at: wire.created_at.to_datetime(),
        created_by: wire.created_by,
    }
}
