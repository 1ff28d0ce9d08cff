use std::path::PathBuf;

use chrono::{NaiveDate, TimeZone, Utc};
use clap::Parser;
use daylog_core::db::LibSqlRemote;
use daylog_core::models::{Collection, EntryDraft, ImageRef, LogEntry, Mood};
use daylog_core::{group_entries, GroupStrategy};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::cli::{Cli, Commands, CompletionShell};
use crate::commands::add::{run_add, NewEntry};
use crate::commands::common::{
    default_editor, entry_preview, format_group_lines, format_relative_time, normalize_content,
    normalize_entry_identifier, on_date, resolve_db_path, resolve_entry,
};
use crate::commands::completions::run_completions;
use crate::commands::config::save_default_user;
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, EntryEdits};
use crate::commands::favorite::run_favorite;
use crate::commands::list::run_list;
use crate::commands::narrate::{append_paragraph, narrative_request, run_narrate};
use crate::commands::share::{run_comment, run_share, run_shared};
use crate::commands::show::{render_entry, run_show};
use crate::error::CliError;

fn test_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daylog.db");
    (dir, path)
}

fn titled(title: &str) -> NewEntry {
    NewEntry {
        title: title.split(' ').map(ToString::to_string).collect(),
        ..NewEntry::default()
    }
}

fn entry_with_id(id: &str, title: &str) -> LogEntry {
    let mut entry = LogEntry::from_draft(EntryDraft::new(title));
    entry.id = id.parse().unwrap();
    entry
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 24 * 60 * 60_000, now), "3d ago");
}

#[test]
fn entry_preview_truncates_with_ellipsis() {
    assert_eq!(entry_preview("  Morning   run  ", 40), "Morning run");
    assert_eq!(entry_preview("abcdefghij", 8), "abcde...");
    assert_eq!(entry_preview("first\nsecond", 40), "first");
}

#[test]
fn normalize_entry_identifier_rejects_empty() {
    assert!(matches!(
        normalize_entry_identifier("   "),
        Err(CliError::EmptyEntryId)
    ));
    assert_eq!(normalize_entry_identifier(" abc ").unwrap(), "abc");
}

#[test]
fn resolve_db_path_prefers_flag() {
    let path = PathBuf::from("/tmp/custom.db");
    assert_eq!(resolve_db_path(Some(path.clone())).unwrap(), path);
}

#[test]
fn on_date_keeps_time_of_day() {
    let time_of = Utc.with_ymd_and_hms(2024, 1, 2, 15, 45, 0).unwrap();
    let date = NaiveDate::from_ymd_opt(2023, 7, 9).unwrap();
    assert_eq!(
        on_date(date, time_of),
        Utc.with_ymd_and_hms(2023, 7, 9, 15, 45, 0).unwrap()
    );
}

#[test]
fn resolve_entry_supports_exact_and_prefix_id() {
    let first = entry_with_id("01900000-0000-7000-8000-000000000001", "First");
    let second = entry_with_id("01910000-0000-7000-8000-000000000002", "Second");
    let collection = Collection::from([(first.id, first.clone()), (second.id, second.clone())]);

    assert_eq!(resolve_entry(&first.id.to_string(), &collection).unwrap(), first);
    assert_eq!(resolve_entry("0191", &collection).unwrap(), second);
    assert_eq!(resolve_entry("01900000-0000", &collection).unwrap(), first);
}

#[test]
fn resolve_entry_rejects_ambiguous_and_missing() {
    let first = entry_with_id("01900000-0000-7000-8000-000000000001", "First");
    let second = entry_with_id("01900000-0000-7000-8000-000000000002", "Second");
    let collection = Collection::from([(first.id, first), (second.id, second)]);

    let Err(CliError::AmbiguousEntryId(message)) = resolve_entry("0190", &collection) else {
        panic!("expected ambiguous id error");
    };
    assert!(message.contains("01900000-0000, 01900000-0000"));

    assert!(matches!(
        resolve_entry("ffff", &collection),
        Err(CliError::EntryNotFound(_))
    ));
}

#[test]
fn group_lines_show_headers_and_markers() {
    let mut walk = LogEntry::from_draft(
        EntryDraft::new("Walk")
            .occurred_at(Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap())
            .mood(Mood::Happy),
    );
    walk.is_favorite = true;
    let collection = Collection::from([(walk.id, walk.clone())]);

    let lines = format_group_lines(&group_entries(&collection, GroupStrategy::Month));
    assert_eq!(lines[0], "March 2024 (1)");
    assert!(lines[1].contains("2024-03-05"));
    assert!(lines[1].contains("Walk"));
    assert!(lines[1].ends_with("★ 😊"));
}

#[test]
fn render_entry_marks_pending_images() {
    let entry = LogEntry::from_draft(
        EntryDraft::new("Harbour")
            .image(ImageRef::from_uri("file:///tmp/harbour.jpg"))
            .body("Boats everywhere"),
    );
    let lines = render_entry(&entry);
    assert_eq!(lines[0], "Harbour");
    assert!(lines
        .iter()
        .any(|line| line == "image: file:///tmp/harbour.jpg (not uploaded)"));
    assert_eq!(lines.last().map(String::as_str), Some("Boats everywhere"));
}

#[test]
fn narrative_needs_uploaded_image() {
    let pending = LogEntry::from_draft(
        EntryDraft::new("Pier").image(ImageRef::from_uri("file:///tmp/pier.jpg")),
    );
    assert!(matches!(
        narrative_request(&pending, 50),
        Err(CliError::NoImage(_))
    ));

    let uploaded = LogEntry::from_draft(
        EntryDraft::new("Pier").image(ImageRef::from_uri("https://img.example.test/pier.jpg")),
    );
    let request = narrative_request(&uploaded, 50).unwrap();
    assert_eq!(request.image_url, "https://img.example.test/pier.jpg");
    assert_eq!(request.words, 50);
}

#[test]
fn append_paragraph_separates_with_blank_line() {
    assert_eq!(append_paragraph(None, "Story"), "Story");
    assert_eq!(append_paragraph(Some("  \n"), "Story"), "Story");
    assert_eq!(append_paragraph(Some("Notes\n"), "Story"), "Notes\n\nStory");
}

#[test]
fn cli_parses_add_flags() {
    let cli = Cli::try_parse_from([
        "daylog", "add", "Quiet", "morning", "--mood", "happy", "--date", "2024-02-01",
    ])
    .unwrap();
    let Commands::Add {
        title, mood, date, ..
    } = cli.command
    else {
        panic!("expected add command");
    };
    assert_eq!(title, vec!["Quiet".to_string(), "morning".to_string()]);
    assert_eq!(mood, Some(Mood::Happy));
    assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 1));

    assert!(Cli::try_parse_from(["daylog", "add", "x", "--mood", "elated"]).is_err());
    assert!(Cli::try_parse_from(["daylog", "add", "x", "--lat", "1.0"]).is_err());
}

#[test]
fn save_default_user_writes_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cli-config.json");

    let config = save_default_user("  alice ", &path).unwrap();
    assert_eq!(config.user_id.as_deref(), Some("alice"));
    assert!(matches!(
        save_default_user(" ", &path),
        Err(CliError::MissingUser)
    ));
}

#[tokio::test(flavor = "current_thread")]
#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
async fn add_then_list_and_show() {
    let (_dir, db_path) = test_db();

    let added = run_add(
        NewEntry {
            body: Some("Sunny and cold".to_string()),
            mood: Some(Mood::Star),
            coordinates: Some((38.72, -9.14)),
            ..titled("Morning walk")
        },
        &db_path,
        "alice",
    )
    .await
    .unwrap();
    assert_eq!(added.title(), "Morning walk");
    assert_eq!(added.content.mood, Some(Mood::Star));
    assert_eq!(
        added.content.location.as_ref().map(|l| l.full_address.clone()),
        Some(None)
    );

    run_list(GroupStrategy::Mood, false, &db_path, "alice")
        .await
        .unwrap();

    let shown = run_show(&added.id.to_string()[..13], false, &db_path, "alice")
        .await
        .unwrap();
    assert_eq!(shown, added);
}

#[tokio::test(flavor = "current_thread")]
#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
async fn add_rejects_empty_title() {
    let (_dir, db_path) = test_db();
    let result = run_add(titled("   "), &db_path, "alice").await;
    assert!(matches!(result, Err(CliError::EmptyTitle)));
}

#[tokio::test(flavor = "current_thread")]
#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
async fn entries_are_private_to_their_user() {
    let (_dir, db_path) = test_db();
    let added = run_add(titled("Diary"), &db_path, "alice").await.unwrap();

    let result = run_show(&added.id.to_string(), false, &db_path, "bob").await;
    assert!(matches!(result, Err(CliError::EntryNotFound(_))));
}

#[tokio::test(flavor = "current_thread")]
#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
async fn edit_with_flags_updates_fields() {
    let (_dir, db_path) = test_db();
    let added = run_add(titled("Draft"), &db_path, "alice").await.unwrap();

    let edited = run_edit(
        &added.id.to_string(),
        EntryEdits {
            title: Some(" Final ".to_string()),
            mood: Some(Mood::Sad),
            ..EntryEdits::default()
        },
        &db_path,
        "alice",
    )
    .await
    .unwrap();
    assert_eq!(edited.title(), "Final");
    assert_eq!(edited.content.mood, Some(Mood::Sad));
    assert!(edited.last_updated > added.last_updated);

    let shown = run_show(&added.id.to_string(), false, &db_path, "alice")
        .await
        .unwrap();
    assert_eq!(shown.title(), "Final");
}

#[tokio::test(flavor = "current_thread")]
#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
async fn delete_moves_entry_to_trash() {
    let (_dir, db_path) = test_db();
    let added = run_add(titled("Gone soon"), &db_path, "alice").await.unwrap();

    let deleted = run_delete(&added.id.to_string()[..13], &db_path, "alice")
        .await
        .unwrap();
    assert_eq!(deleted.id, added.id);

    let missing = run_show(&added.id.to_string(), false, &db_path, "alice").await;
    assert!(matches!(missing, Err(CliError::EntryNotFound(_))));

    let remote = LibSqlRemote::open_path(&db_path).await.unwrap();
    let trash = remote.trash("alice").await.unwrap();
    assert_eq!(trash.len(), 1);
    assert_eq!(trash[0].id, added.id);
}

#[tokio::test(flavor = "current_thread")]
#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
async fn favorite_toggles_back_and_forth() {
    let (_dir, db_path) = test_db();
    let added = run_add(titled("Best day"), &db_path, "alice").await.unwrap();
    let id = added.id.to_string();

    assert!(run_favorite(&id, &db_path, "alice").await.unwrap().is_favorite);
    assert!(!run_favorite(&id, &db_path, "alice").await.unwrap().is_favorite);
}

#[tokio::test(flavor = "current_thread")]
#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
async fn share_comment_and_unshare() {
    let (_dir, db_path) = test_db();
    let added = run_add(titled("Beach"), &db_path, "alice").await.unwrap();
    let id = added.id.to_string();

    let shared = run_share(&id, &db_path, "alice").await.unwrap();
    let token = shared.public_id().unwrap().to_string();
    assert!(shared.is_public());

    let anonymous = run_comment(&token, &["Lovely".to_string()], &db_path, None).await;
    assert!(matches!(
        anonymous,
        Err(CliError::Core(daylog_core::Error::AuthenticationRequired))
    ));

    let comment = run_comment(
        &token,
        &["Looks".to_string(), "lovely".to_string()],
        &db_path,
        Some("bob"),
    )
    .await
    .unwrap();
    assert_eq!(comment.content, "Looks lovely");
    assert_eq!(comment.created_by, "bob");

    let (entry, comments) = run_shared(&token, &db_path).await.unwrap();
    assert_eq!(entry.owner_id, "alice");
    assert_eq!(entry.entry.id, added.id);
    assert_eq!(comments, vec![comment]);

    let private = run_share(&id, &db_path, "alice").await.unwrap();
    assert!(!private.is_public());
    assert_eq!(private.public_id(), Some(token.as_str()));
    assert!(matches!(
        run_shared(&token, &db_path).await,
        Err(CliError::Core(daylog_core::Error::NotFound(_)))
    ));

    let again = run_share(&id, &db_path, "alice").await.unwrap();
    assert_eq!(again.public_id(), Some(token.as_str()));
}

#[tokio::test(flavor = "current_thread")]
#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
async fn narrate_without_image_fails_before_any_write() {
    let (_dir, db_path) = test_db();
    let added = run_add(titled("No photo"), &db_path, "alice").await.unwrap();

    let result = run_narrate(&added.id.to_string(), 40, &db_path, "alice").await;
    assert!(matches!(result, Err(CliError::NoImage(_))));

    let shown = run_show(&added.id.to_string(), false, &db_path, "alice")
        .await
        .unwrap();
    assert_eq!(shown, added);
}

#[test]
fn run_completions_writes_bash_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("daylog.bash");

    run_completions(CompletionShell::Bash, Some(&output_path)).unwrap();

    let script = std::fs::read_to_string(&output_path).unwrap();
    assert!(script.contains("daylog"));
}
