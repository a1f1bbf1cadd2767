//! Where canonical recordings come from.
//!
//! The orchestrator asks a [`RecordingSource`] for one reconciled recording at
//! a time. [`IndexSnapshot`] reads the whole index up front, which suits
//! whole-drive runs; [`IndexQuery`] queries per identifier, which suits short
//! explicit lists.

use rusqlite::Connection;

use tablo_rescue_core::{CanonicalRecording, ChannelRecord, RawRow, RescueError};
use tablo_rescue_db::{DbError, read_channel, read_channels, read_recording_rows, read_recordings};

use crate::reconcile::{ReconcileOptions, reconcile, reconcile_id, select_primary};

pub trait RecordingSource {
    /// Reconciled description of recording `id`.
    fn lookup(&self, id: i64) -> Result<CanonicalRecording, RescueError>;
}

// ── Snapshot ────────────────────────────────────────────────────────────────

/// Every live recording row and every channel, held in memory.
#[derive(Debug, Clone, Default)]
pub struct IndexSnapshot {
    rows: Vec<RawRow>,
    channels: Vec<ChannelRecord>,
    options: ReconcileOptions,
}

impl IndexSnapshot {
    pub fn new(rows: Vec<RawRow>, channels: Vec<ChannelRecord>) -> Self {
        Self {
            rows,
            channels,
            options: ReconcileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Read both relations from an open index.
    pub fn load(conn: &Connection) -> Result<Self, DbError> {
        let rows = read_recordings(conn)?;
        let channels = read_channels(conn)?;
        log::info!("Index holds {} recordings on {} channels", rows.len(), channels.len());
        Ok(Self::new(rows, channels))
    }

    /// Distinct recording identifiers, in index order.
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::new();
        for id in self.rows.iter().filter_map(RawRow::id) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// First row carrying `id`, unreconciled.
    pub fn first_row(&self, id: i64) -> Option<&RawRow> {
        self.rows.iter().find(|r| r.id() == Some(id))
    }
}

impl RecordingSource for IndexSnapshot {
    fn lookup(&self, id: i64) -> Result<CanonicalRecording, RescueError> {
        reconcile_id(&self.rows, &self.channels, id, self.options)
    }
}

// ── Per-id Queries ──────────────────────────────────────────────────────────

/// Reconciles recordings by querying the index on demand.
pub struct IndexQuery<'c> {
    conn: &'c Connection,
    options: ReconcileOptions,
}

impl<'c> IndexQuery<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            options: ReconcileOptions::default(),
        }
    }
}

impl RecordingSource for IndexQuery<'_> {
    fn lookup(&self, id: i64) -> Result<CanonicalRecording, RescueError> {
        let rows = read_recording_rows(self.conn, id)?;
        let primary = select_primary(&rows, id)?;
        let channel_id = CanonicalRecording::from_row(primary).channel_id;
        let channel = read_channel(self.conn, channel_id)?;
        if channel.is_none() {
            log::warn!("No channel {channel_id} found for recording {id}");
        }
        Ok(reconcile(primary, channel.as_slice(), self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_ids_are_distinct() {
        let snapshot = IndexSnapshot::new(
            vec![
                RawRow::new().with("ID", 3),
                RawRow::new().with("ID", 1),
                RawRow::new().with("ID", 3),
                RawRow::new().with("title", "no id"),
            ],
            Vec::new(),
        );
        assert_eq!(snapshot.ids(), vec![3, 1]);
        assert!(snapshot.first_row(1).is_some());
        assert!(snapshot.first_row(2).is_none());
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = IndexSnapshot::new(
            vec![
                RawRow::new().with("ID", 3).with("title", "Three"),
                RawRow::new().with("ID", 4),
                RawRow::new().with("ID", 4),
            ],
            Vec::new(),
        );
        assert_eq!(snapshot.lookup(3).unwrap().title, "Three");
        assert!(matches!(
            snapshot.lookup(4),
            Err(RescueError::DuplicateRecord { id: 4, count: 2 })
        ));
        assert!(matches!(snapshot.lookup(5), Err(RescueError::NotFound(5))));
    }

    #[test]
    fn test_snapshot_payload_overwrite() {
        let rows = vec![
            RawRow::new()
                .with("ID", 7)
                .with("longDescription", "From row")
                .with("json", r#"{"description": "From payload"}"#),
        ];

        let kept = IndexSnapshot::new(rows.clone(), Vec::new());
        assert_eq!(kept.lookup(7).unwrap().long_description, "From row");

        let replaced = IndexSnapshot::new(rows, Vec::new()).with_options(ReconcileOptions {
            channel_overwrite: false,
            payload_overwrite: true,
        });
        assert_eq!(replaced.lookup(7).unwrap().long_description, "From payload");
    }
}
