use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] daylog_core::Error),
    #[error(transparent)]
    Service(#[from] daylog_core::services::ServiceError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No entry title provided")]
    EmptyTitle,
    #[error("Edited entry body cannot be empty")]
    EmptyEditedBody,
    #[error("Entry ID cannot be empty")]
    EmptyEntryId,
    #[error("Comment cannot be empty")]
    EmptyComment,
    #[error("Entry not found for id/prefix: {0}")]
    EntryNotFound(String),
    #[error("{0}")]
    AmbiguousEntryId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Entry {0} has no uploaded image to narrate")]
    NoImage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No user selected. Pass --user, set DAYLOG_USER, or run `daylog config init --user <ID>`.")]
    MissingUser,
}
