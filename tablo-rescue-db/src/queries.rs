//! Read queries against the `Recording` and `Channel` relations.
//!
//! Rows come back as [`RawRow`]s so callers depend only on column names.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Row, params};

use tablo_rescue_core::{ChannelRecord, ColumnValue, RawRow, RecordingField};

use crate::DbError;

/// Columns read from the `Channel` relation.
pub const CHANNEL_COLUMNS: &[&str] = &[
    "ID",
    "callSign",
    "channelNumberMajor",
    "channelNumberMinor",
    "resolutionTitle",
];

/// Live rows are those whose `DateDeleted` is empty or NULL.
const LIVE_FILTER: &str = "COALESCE(LENGTH(DateDeleted), 0) < 1";

fn recording_select() -> String {
    let columns: Vec<&str> = RecordingField::recording_columns().collect();
    format!("SELECT {} FROM Recording", columns.join(", "))
}

fn channel_select() -> String {
    format!("SELECT {} FROM Channel", CHANNEL_COLUMNS.join(", "))
}

// ── Recordings ──────────────────────────────────────────────────────────────

/// All live recordings with a positive ID, ordered by title.
pub fn read_recordings(conn: &Connection) -> Result<Vec<RawRow>, DbError> {
    let sql = format!("{} WHERE ID > 0 AND {LIVE_FILTER} ORDER BY title", recording_select());
    let mut stmt = conn.prepare(&sql)?;
    let names = column_names(&stmt);
    let rows = stmt.query_map([], |row| row_to_raw(row, &names))?;
    let rows = rows.collect::<Result<Vec<_>, _>>()?;
    log::debug!("Read {} recording rows", rows.len());
    Ok(rows)
}

/// Every live row carrying `id`.
///
/// A healthy index returns zero or one row; more than one means the index is
/// corrupt and is left for the caller to report.
pub fn read_recording_rows(conn: &Connection, id: i64) -> Result<Vec<RawRow>, DbError> {
    let sql = format!("{} WHERE ID = ?1 AND {LIVE_FILTER} ORDER BY title", recording_select());
    let mut stmt = conn.prepare(&sql)?;
    let names = column_names(&stmt);
    let rows = stmt.query_map(params![id], |row| row_to_raw(row, &names))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Channels ────────────────────────────────────────────────────────────────

/// All channels, ordered by ID.
pub fn read_channels(conn: &Connection) -> Result<Vec<ChannelRecord>, DbError> {
    let sql = format!("{} ORDER BY ID", channel_select());
    let mut stmt = conn.prepare(&sql)?;
    let names = column_names(&stmt);
    let rows = stmt.query_map([], |row| row_to_raw(row, &names))?;
    let rows = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(rows.iter().map(ChannelRecord::from_row).collect())
}

/// The channel with `id`, if any.
pub fn read_channel(conn: &Connection, id: i64) -> Result<Option<ChannelRecord>, DbError> {
    let sql = format!("{} WHERE ID = ?1 ORDER BY ID", channel_select());
    let mut stmt = conn.prepare(&sql)?;
    let names = column_names(&stmt);
    let mut rows = stmt.query_map(params![id], |row| row_to_raw(row, &names))?;
    match rows.next() {
        Some(row) => Ok(Some(ChannelRecord::from_row(&row?))),
        None => Ok(None),
    }
}

// ── Row Mapping ─────────────────────────────────────────────────────────────

fn column_names(stmt: &rusqlite::Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(String::from).collect()
}

fn row_to_raw(row: &Row, names: &[String]) -> rusqlite::Result<RawRow> {
    let mut raw = RawRow::new();
    for (i, name) in names.iter().enumerate() {
        let value = match row.get_ref(i)? {
            ValueRef::Null => ColumnValue::Null,
            ValueRef::Integer(n) => ColumnValue::Integer(n),
            ValueRef::Real(f) => ColumnValue::Real(f),
            ValueRef::Text(t) => ColumnValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => ColumnValue::Blob(b.to_vec()),
        };
        raw.insert(name.clone(), value);
    }
    Ok(raw)
}
