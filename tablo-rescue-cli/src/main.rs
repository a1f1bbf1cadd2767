//! tablo-rescue CLI
//!
//! Rescues recordings from a Tablo external drive: reads the appliance's
//! index, merges each recording's segments into one MP4, names it and tags it.

mod cli_types;
mod commands;
mod error;
mod logging;
mod spinner;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use tablo_rescue_db::open_index;
use tablo_rescue_lib::layout::default_index_path;
use tablo_rescue_lib::settings::{load_settings, resolve_output_dir};
use tablo_rescue_lib::{RescueOptions, SystemTools};

use crate::cli_types::Cli;
use crate::commands::dump::{log_schema, run_dump_all, run_dump_ids};
use crate::commands::rescue::run_rescue;
pub(crate) use crate::error::CliError;
use crate::logging::Verbosity;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.verbose, cli.debug);
    logging::init(verbosity);

    match run(cli, verbosity) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Aborted) => {
            log::error!("Aborted manually.");
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("Unhandled error, exiting: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, verbosity: Verbosity) -> Result<(), CliError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let settings = load_settings()?;
    let db_path = cli
        .dbfile
        .clone()
        .unwrap_or_else(|| default_index_path(&cli.tablo));
    log::info!("Reading index {}", db_path.display());
    let conn = open_index(&db_path)?;
    if verbosity == Verbosity::Debug {
        log_schema(&conn)?;
    }

    if cli.dump {
        return if cli.ids.is_empty() {
            run_dump_all(&conn, &cli.tablo, &cancel)
        } else {
            run_dump_ids(&conn, &cli.tablo, &cli.ids, &cancel)
        };
    }

    let output_dir = std::path::absolute(resolve_output_dir(cli.outdir.clone(), &settings))?;
    let tools = SystemTools::from_paths(&settings.tools);
    let options = RescueOptions {
        mount: cli.tablo.clone(),
        output_dir,
        force: cli.force,
    };
    run_rescue(
        &conn,
        tools.toolchain(),
        options,
        &cli.ids,
        &cancel,
        verbosity == Verbosity::Normal,
    )
}
