use thiserror::Error;

use tablo_rescue_db::DbError;
use tablo_rescue_lib::SettingsError;

/// Errors that end a CLI run early.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// The index database could not be opened or read
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// The settings file is unreadable
    #[error("Config error: {0}")]
    Config(#[from] SettingsError),

    /// The interrupt handler could not be installed
    #[error("Signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),

    /// The user pressed Ctrl-C
    #[error("Aborted manually.")]
    Aborted,

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

impl CliError {
    pub(crate) fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
