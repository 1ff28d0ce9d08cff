//! Database layer for daylog

mod connection;
mod migrations;
mod remote;
mod repository;

pub use connection::Database;
pub use remote::LibSqlRemote;
pub use repository::{EntryRepository, LibSqlEntryRepository};
