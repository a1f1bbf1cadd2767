//! What is on the drive: which recordings can still be rescued.

use std::path::Path;

use serde::Serialize;

use tablo_rescue_core::{CanonicalRecording, RescueError};

use crate::layout::segment_dir;
use crate::naming::synthesize;
use crate::segments::count_segments;
use crate::source::{IndexSnapshot, RecordingSource};

/// A rescuable recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub id: i64,
    pub filename: String,
    pub segment_count: usize,
}

impl InventoryEntry {
    /// `id,filename,segments`
    pub fn csv_line(&self) -> String {
        format!("{},{},{}", self.id, self.filename, self.segment_count)
    }
}

/// Reconcile every recording in `snapshot` and keep those with segments on disk.
///
/// Recordings that fail to reconcile are logged as errors when their segments
/// exist (they cannot be rescued) and as warnings otherwise. Recordings with
/// no segment directory are logged and left out.
pub fn survey(snapshot: &IndexSnapshot, mount: &Path) -> Vec<InventoryEntry> {
    let mut entries = Vec::new();
    for id in snapshot.ids() {
        let dir = segment_dir(mount, id);
        let has_segments = dir.is_dir();
        match snapshot.lookup(id) {
            Ok(rec) if has_segments => entries.push(InventoryEntry {
                id,
                filename: synthesize(id, &rec),
                segment_count: count_segments(&dir),
            }),
            Ok(rec) => log::warn!("No segment dir for {}", rec.log_label()),
            Err(e) => {
                let name = snapshot
                    .first_row(id)
                    .map(|row| synthesize(id, &CanonicalRecording::from_row(row)))
                    .unwrap_or_else(|| id.to_string());
                if has_segments {
                    log::error!("Unrecoverable recording {name}: {e}");
                } else {
                    log::warn!("Skipping recording {name}: {e}");
                }
            }
        }
    }
    log::info!("{} recordings can be rescued", entries.len());
    entries
}

/// Detailed view of one recording for dump output.
#[derive(Debug, Serialize)]
pub struct RecordingDetail {
    pub segment_count: usize,
    pub recording: CanonicalRecording,
}

impl RecordingDetail {
    /// The reconciled recording as four-space indented camelCase JSON.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.recording.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Reconcile `id` and count its segments.
pub fn describe(
    source: &dyn RecordingSource,
    mount: &Path,
    id: i64,
) -> Result<RecordingDetail, RescueError> {
    let recording = source.lookup(id)?;
    let dir = segment_dir(mount, id);
    if !dir.is_dir() {
        log::warn!("No TS files found for {id}");
    }
    Ok(RecordingDetail {
        segment_count: count_segments(&dir),
        recording,
    })
}
