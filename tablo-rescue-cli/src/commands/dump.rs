use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use rusqlite::Connection;

use tablo_rescue_db::{list_tables, table_columns};
use tablo_rescue_lib::{IndexQuery, IndexSnapshot, describe, survey};

use crate::CliError;

/// Print `id,filename,segments` for every rescuable recording.
pub(crate) fn run_dump_all(conn: &Connection, mount: &Path, cancel: &AtomicBool) -> Result<(), CliError> {
    let snapshot = IndexSnapshot::load(conn)?;
    let entries = survey(&snapshot, mount);
    check_cancel(cancel)?;
    for entry in entries {
        println!("{}", entry.csv_line());
    }
    Ok(())
}

/// Print segment counts and reconciled metadata for each of `ids`.
pub(crate) fn run_dump_ids(
    conn: &Connection,
    mount: &Path,
    ids: &[i64],
    cancel: &AtomicBool,
) -> Result<(), CliError> {
    let source = IndexQuery::new(conn);
    for (i, &id) in ids.iter().enumerate() {
        check_cancel(cancel)?;
        log::info!("Processing recording {id} ({} of {})", i + 1, ids.len());
        match describe(&source, mount, id) {
            Ok(detail) => {
                println!("Recording {id} has {} segments", detail.segment_count);
                let json = detail
                    .to_pretty_json()
                    .map_err(|e| CliError::other(format!("Cannot print recording {id}: {e}")))?;
                println!("{json}");
            }
            Err(e) => log::error!("Unable to retrieve information for {id}: {e}"),
        }
    }
    Ok(())
}

fn check_cancel(cancel: &AtomicBool) -> Result<(), CliError> {
    if cancel.load(Ordering::SeqCst) {
        return Err(CliError::Aborted);
    }
    Ok(())
}

/// Log every table in the index with its columns, at debug level.
pub(crate) fn log_schema(conn: &Connection) -> Result<(), CliError> {
    for table in list_tables(conn)? {
        let columns = table_columns(conn, &table)?;
        log::debug!("Table {table}: {}", columns.join(", "));
    }
    Ok(())
}
