pub mod add;
pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod edit;
pub mod favorite;
pub mod list;
pub mod narrate;
pub mod share;
pub mod show;
