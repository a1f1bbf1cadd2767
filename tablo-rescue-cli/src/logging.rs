//! Logger setup.

use std::io::Write;

use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

/// Verbosity chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verbosity {
    /// Warnings and errors only, unless `RUST_LOG` says otherwise
    Normal,
    /// Progress messages
    Verbose,
    /// Everything, with timestamps and module targets
    Debug,
}

impl Verbosity {
    pub(crate) fn from_flags(verbose: bool, debug: bool) -> Self {
        match (verbose, debug) {
            (_, true) => Self::Debug,
            (true, false) => Self::Verbose,
            _ => Self::Normal,
        }
    }
}

/// Install the global logger. Call once, before anything logs.
pub(crate) fn init(verbosity: Verbosity) {
    let mut builder = match verbosity {
        Verbosity::Normal => Builder::from_env(Env::default().default_filter_or("warn")),
        Verbosity::Verbose => {
            let mut b = Builder::new();
            b.filter_level(LevelFilter::Info);
            b
        }
        Verbosity::Debug => {
            let mut b = Builder::new();
            b.filter_level(LevelFilter::Debug);
            b
        }
    };

    if verbosity == Verbosity::Debug {
        builder.format_timestamp_millis().format_target(true);
    } else {
        builder.format(|buf, record| {
            let level = record.level();
            match level {
                Level::Error => writeln!(
                    buf,
                    "{} {}",
                    "error:".if_supports_color(Stderr, |t| t.red()),
                    record.args()
                ),
                Level::Warn => writeln!(
                    buf,
                    "{} {}",
                    "warning:".if_supports_color(Stderr, |t| t.yellow()),
                    record.args()
                ),
                _ => writeln!(buf, "{}", record.args()),
            }
        });
    }
    builder.init();
}
