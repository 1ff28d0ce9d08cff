use std::path::Path;

use daylog_core::{group_entries, GroupStrategy};

use crate::commands::common::{format_group_lines, group_to_item, open_store, GroupItem};
use crate::error::CliError;

pub async fn run_list(
    strategy: GroupStrategy,
    as_json: bool,
    db_path: &Path,
    user_id: &str,
) -> Result<(), CliError> {
    let store = open_store(db_path, user_id).await?;
    let collection = store.snapshot();
    store.close().await;

    let groups = group_entries(&collection, strategy);
    if as_json {
        let json_items = groups.iter().map(group_to_item).collect::<Vec<GroupItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if groups.is_empty() {
        println!("No entries yet.");
    } else {
        for line in format_group_lines(&groups) {
            println!("{line}");
        }
    }

    Ok(())
}
