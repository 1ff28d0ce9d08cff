//! daylog CLI - journal entries from the command line

mod cli;
mod cli_config;
mod commands;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::cli_config::{CliConfig, USER_ENV};
use crate::commands::add::{run_add, NewEntry};
use crate::commands::common::{resolve_body, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::config::{run_config_init, run_config_show};
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_edit, EntryEdits};
use crate::commands::favorite::run_favorite;
use crate::commands::list::run_list;
use crate::commands::narrate::run_narrate;
use crate::commands::share::{run_comment, run_share, run_shared};
use crate::commands::show::run_show;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "daylog=warn".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    // Commands that need neither a database nor a user.
    match &cli.command {
        Commands::Completions { shell, output } => {
            return run_completions(*shell, output.as_deref());
        }
        Commands::Config {
            command: ConfigCommands::Init { user },
        } => {
            run_config_init(user)?;
            return Ok(());
        }
        _ => {}
    }

    let db_path = resolve_db_path(cli.db_path)?;
    let config = CliConfig::load().map_err(CliError::Config)?;
    let user = config.resolve_user_id(cli.user.as_deref(), std::env::var(USER_ENV).ok());
    let require_user = || user.as_deref().ok_or(CliError::MissingUser);

    match cli.command {
        Commands::Add {
            title,
            body,
            mood,
            weather,
            date,
            image,
            lat,
            lon,
            locate,
            fetch_weather,
        } => {
            let new = NewEntry {
                title,
                body: resolve_body(body)?,
                mood,
                weather,
                date,
                image,
                coordinates: lat.zip(lon),
                locate,
                fetch_weather,
            };
            run_add(new, &db_path, require_user()?).await?;
        }
        Commands::List { group, json } => {
            run_list(group, json, &db_path, require_user()?).await?;
        }
        Commands::Show { id, json } => {
            run_show(&id, json, &db_path, require_user()?).await?;
        }
        Commands::Edit {
            id,
            title,
            body,
            mood,
            weather,
            date,
        } => {
            let edits = EntryEdits {
                title,
                body,
                mood,
                weather,
                date,
            };
            run_edit(&id, edits, &db_path, require_user()?).await?;
        }
        Commands::Delete { id } => {
            run_delete(&id, &db_path, require_user()?).await?;
        }
        Commands::Favorite { id } => {
            run_favorite(&id, &db_path, require_user()?).await?;
        }
        Commands::Share { id } => {
            run_share(&id, &db_path, require_user()?).await?;
        }
        Commands::Shared { token } => {
            run_shared(&token, &db_path).await?;
        }
        Commands::Comment { token, content } => {
            run_comment(&token, &content, &db_path, user.as_deref()).await?;
        }
        Commands::Narrate { id, words } => {
            run_narrate(&id, words, &db_path, require_user()?).await?;
        }
        Commands::Config {
            command: ConfigCommands::Show,
        } => run_config_show(&db_path, user.as_deref())?,
        Commands::Completions { .. }
        | Commands::Config {
            command: ConfigCommands::Init { .. },
        } => {}
    }

    Ok(())
}
