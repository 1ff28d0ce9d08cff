use std::path::Path;

use daylog_core::models::{Comment, LogEntry};
use daylog_core::{Session, SharedEntries, SharedEntry};

use crate::commands::common::{
    normalize_content, normalize_entry_identifier, open_remote, open_store, resolve_entry,
};
use crate::commands::show::render_entry;
use crate::error::CliError;

/// Flip an entry between public and private. Prints the share token when
/// the entry became public.
pub async fn run_share(id: &str, db_path: &Path, user_id: &str) -> Result<LogEntry, CliError> {
    let normalized_id = normalize_entry_identifier(id)?;
    let store = open_store(db_path, user_id).await?;
    let result = match resolve_entry(&normalized_id, &store.snapshot()) {
        Ok(entry) => store.toggle_public(entry.id).await.map_err(CliError::from),
        Err(error) => Err(error),
    };
    store.close().await;

    let entry = result?;
    match (entry.is_public(), entry.public_id()) {
        (true, Some(token)) => println!("{token}"),
        _ => println!("{}  private", entry.id),
    }
    Ok(entry)
}

/// Show a shared entry with its comments. Needs no signed-in user.
pub async fn run_shared(
    token: &str,
    db_path: &Path,
) -> Result<(SharedEntry, Vec<Comment>), CliError> {
    let shared = SharedEntries::new(open_remote(db_path).await?);
    let entry = shared.resolve(token).await?;
    let comments = shared.comments(&entry.owner_id, entry.entry.id).await?;

    for line in render_entry(&entry.entry) {
        println!("{line}");
    }
    println!();
    println!("shared by {}", entry.owner_id);
    for comment in &comments {
        println!(
            "[{}] {}: {}",
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.created_by,
            comment.content
        );
    }
    Ok((entry, comments))
}

/// Comment on a shared entry as `user_id`.
pub async fn run_comment(
    token: &str,
    content_parts: &[String],
    db_path: &Path,
    user_id: Option<&str>,
) -> Result<Comment, CliError> {
    let content = normalize_content(&content_parts.join(" ")).ok_or(CliError::EmptyComment)?;
    let session = user_id.map(Session::new).transpose()?;

    let shared = SharedEntries::new(open_remote(db_path).await?);
    let entry = shared.resolve(token).await?;
    let comment = shared
        .post_comment(session.as_ref(), &entry.owner_id, entry.entry.id, &content)
        .await?;

    println!("{}", entry.entry.id);
    Ok(comment)
}
