use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use daylog_core::models::{Mood, Weather};
use daylog_core::GroupStrategy;

#[derive(Parser)]
#[command(name = "daylog")]
#[command(about = "Keep a journal of your days from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// User id to act as (defaults to DAYLOG_USER, then the CLI config)
    #[arg(long, global = true, value_name = "ID")]
    pub user: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new entry
    #[command(alias = "new")]
    Add {
        /// Entry title
        title: Vec<String>,
        /// Free text body
        #[arg(long)]
        body: Option<String>,
        /// star, happy, neutral, sad or angry
        #[arg(long)]
        mood: Option<Mood>,
        /// Weather condition, e.g. clear or rain
        #[arg(long)]
        weather: Option<Weather>,
        /// Day the entry is about (YYYY-MM-DD, defaults to now)
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
        /// Image URL or file: reference
        #[arg(long, value_name = "URI")]
        image: Option<String>,
        /// Latitude of where the entry was written
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude of where the entry was written
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Resolve the coordinates to an address
        #[arg(long, requires = "lat")]
        locate: bool,
        /// Look up the current weather at the coordinates
        #[arg(long, requires = "lat", conflicts_with = "weather")]
        fetch_weather: bool,
    },
    /// List entries in groups
    List {
        /// month, oldest, mood, weather or favourite
        #[arg(short, long, default_value = "month")]
        group: GroupStrategy,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one entry
    Show {
        /// Entry ID or unique ID prefix
        id: String,
        /// Output the stored document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing entry (opens the body in $EDITOR without flags)
    Edit {
        /// Entry ID or unique ID prefix
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        mood: Option<Mood>,
        #[arg(long)]
        weather: Option<Weather>,
        #[arg(long, value_name = "DATE")]
        date: Option<NaiveDate>,
    },
    /// Move an entry to the trash
    Delete {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Toggle the favourite flag
    #[command(alias = "favourite")]
    Favorite {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Toggle public sharing and print the share token
    Share {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Show a shared entry and its comments
    Shared {
        /// Share token
        token: String,
    },
    /// Comment on a shared entry
    Comment {
        /// Share token
        token: String,
        /// Comment text
        content: Vec<String>,
    },
    /// Write a narrative from the entry's photo and append it to the body
    Narrate {
        /// Entry ID or unique ID prefix
        id: String,
        /// Narrative length in words
        #[arg(long, default_value_t = daylog_core::services::DEFAULT_NARRATIVE_WORDS)]
        words: u32,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure the CLI
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set the default user id
    Init {
        /// User id to act as by default
        #[arg(long, value_name = "ID")]
        user: String,
    },
    /// Print the resolved configuration
    Show,
}
