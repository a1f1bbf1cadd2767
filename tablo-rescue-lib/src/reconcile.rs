//! Metadata reconciliation.
//!
//! A recording's description is spread over three sources of decreasing
//! authority: the `Recording` row, the `Channel` row it was tuned from, and
//! the JSON document embedded in the recording row. Reconciliation builds a
//! [`CanonicalRecording`] from the row, then enriches it from the channel and
//! finally from the payload. Later passes only fill gaps unless told to
//! overwrite, so with the default options the row always wins, then the
//! channel, then the payload.

use tablo_rescue_core::{
    CanonicalRecording, ChannelField, ChannelRecord, ColumnValue, PayloadKey, RawRow, RescueError,
};

/// Overwrite policy for the two enrichment passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Let channel values replace populated fields.
    pub channel_overwrite: bool,
    /// Let payload values replace populated fields.
    pub payload_overwrite: bool,
}

/// Pick the single row for `id` out of `rows`.
///
/// Zero matches is `NotFound`. More than one is `DuplicateRecord`; each
/// duplicate is logged in full so the corruption can be diagnosed.
pub fn select_primary(rows: &[RawRow], id: i64) -> Result<&RawRow, RescueError> {
    let matches: Vec<&RawRow> = rows.iter().filter(|r| r.id() == Some(id)).collect();
    match matches.as_slice() {
        [] => {
            log::error!("No data found for recording {id}");
            Err(RescueError::NotFound(id))
        }
        [row] => Ok(row),
        dups => {
            log::error!("Multiple entries found for recording {id}");
            for dup in dups {
                match serde_json::to_string_pretty(dup) {
                    Ok(json) => log::debug!("{json}"),
                    Err(e) => log::debug!("(unprintable duplicate row: {e})"),
                }
            }
            Err(RescueError::DuplicateRecord {
                id,
                count: dups.len(),
            })
        }
    }
}

/// Build the canonical record for one primary row.
///
/// Never fails: a missing channel skips channel enrichment and a malformed
/// payload skips payload enrichment.
pub fn reconcile(
    primary: &RawRow,
    channels: &[ChannelRecord],
    options: ReconcileOptions,
) -> CanonicalRecording {
    let mut rec = CanonicalRecording::from_row(primary);
    if let Some(channel) = channels.iter().find(|c| c.id == rec.channel_id) {
        enrich_from_channel(&mut rec, channel, options.channel_overwrite);
    }
    enrich_from_payload(&mut rec, options.payload_overwrite);
    if let Ok(json) = serde_json::to_string(&rec) {
        log::debug!("{json}");
    }
    rec
}

/// Look up `id` in `rows` and reconcile it.
pub fn reconcile_id(
    rows: &[RawRow],
    channels: &[ChannelRecord],
    id: i64,
    options: ReconcileOptions,
) -> Result<CanonicalRecording, RescueError> {
    let primary = select_primary(rows, id)?;
    Ok(reconcile(primary, channels, options))
}

/// Apply the channel's call sign, channel numbers and resolution.
///
/// Returns the number of fields changed.
pub fn enrich_from_channel(
    rec: &mut CanonicalRecording,
    channel: &ChannelRecord,
    overwrite: bool,
) -> usize {
    ChannelField::all()
        .iter()
        .filter(|field| rec.update(field.target(), &channel.value(**field), overwrite))
        .count()
}

/// Apply air date, description, episode and season from the embedded payload.
///
/// A payload that fails to parse is logged and leaves the record untouched.
/// Returns the number of fields changed.
pub fn enrich_from_payload(rec: &mut CanonicalRecording, overwrite: bool) -> usize {
    let values: Vec<(PayloadKey, ColumnValue)> = match rec.payload.document() {
        Ok(doc) => PayloadKey::all()
            .iter()
            .filter_map(|key| doc.get(key.key()).map(|v| (*key, ColumnValue::from_json(v))))
            .collect(),
        Err(e) => {
            log::warn!("Recording {}: {e}; skipping payload fields", rec.id);
            return 0;
        }
    };
    values
        .iter()
        .filter(|(key, value)| rec.update(key.target(), value, overwrite))
        .count()
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
