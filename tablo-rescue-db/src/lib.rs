//! Read-only access to the Tablo index database (`Tablo.db`).
//!
//! The appliance only copies its index to the external drive when the reset
//! button is pressed, so the data here can be stale. Nothing in this crate
//! ever writes to the index.

pub mod queries;
pub mod schema;

use std::path::PathBuf;

use tablo_rescue_core::RescueError;
use thiserror::Error;

pub use queries::{
    read_channel, read_channels, read_recording_rows, read_recordings, CHANNEL_COLUMNS,
};
pub use schema::{list_tables, open_index, table_columns};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Index database not found: {}", .0.display())]
    Missing(PathBuf),
}

impl From<DbError> for RescueError {
    fn from(e: DbError) -> Self {
        RescueError::database(e.to_string())
    }
}
