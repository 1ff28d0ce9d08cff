//! Data models for daylog

mod comment;
mod entry;
mod mood;
mod sync_conflict;
mod weather;

pub use comment::{sort_comments, Comment, ShareRecord};
pub use entry::{
    Collection, EntryContent, EntryDraft, EntryId, ImageRef, Location, LogEntry, Visibility,
};
pub use mood::Mood;
pub use sync_conflict::SyncConflict;
pub use weather::Weather;
