//! The canonical description of one recording.
//!
//! Fields are addressed through [`RecordingField`], a closed table mapping
//! each external column or key to a typed accessor. Every update goes through
//! [`CanonicalRecording::update`], which implements the conditional-overwrite
//! rule: an empty incoming value never touches a field, and a populated field
//! is only replaced when the caller asks for it.

use serde::Serialize;

use crate::payload::EmbeddedPayload;
use crate::value::{ColumnValue, RawRow};

/// Reconciled metadata for one recording.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecording {
    pub id: i64,
    pub title: String,
    pub channel_id: i64,
    pub orig_air_date: String,
    pub short_description: String,
    pub long_description: String,
    pub episode_title: String,
    /// Kept as text: firmware versions disagree on whether this is a number.
    pub episode_number: String,
    pub season_number: String,
    /// JSON-encoded list of names.
    pub top_cast: String,
    pub full_cast: String,
    pub entity_type: String,
    pub sub_type: String,
    pub call_sign: String,
    pub channel_number_major: Option<i64>,
    pub channel_number_minor: Option<i64>,
    pub resolution_title: String,
    #[serde(rename = "jsonData")]
    pub payload: EmbeddedPayload,
}

/// Broad classification of `entity_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Episode,
    Show,
    Movie,
    Other,
}

impl EntityKind {
    pub fn parse(entity_type: &str) -> Self {
        match entity_type {
            "Episode" => Self::Episode,
            "Show" => Self::Show,
            "Movie" => Self::Movie,
            _ => Self::Other,
        }
    }
}

/// Every settable field of a [`CanonicalRecording`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordingField {
    Id,
    Title,
    Payload,
    ChannelId,
    OrigAirDate,
    ShortDescription,
    LongDescription,
    EpisodeTitle,
    EpisodeNumber,
    SeasonNumber,
    TopCast,
    FullCast,
    EntityType,
    SubType,
    CallSign,
    ChannelNumberMajor,
    ChannelNumberMinor,
    ResolutionTitle,
}

/// Columns of the `Recording` relation, in query order, with their targets.
const RECORDING_COLUMNS: &[(&str, RecordingField)] = &[
    ("ID", RecordingField::Id),
    ("title", RecordingField::Title),
    ("json", RecordingField::Payload),
    ("channelID", RecordingField::ChannelId),
    ("origAirDate", RecordingField::OrigAirDate),
    ("shortDescription", RecordingField::ShortDescription),
    ("longDescription", RecordingField::LongDescription),
    ("episodeTitle", RecordingField::EpisodeTitle),
    ("episodeNum", RecordingField::EpisodeNumber),
    ("seasonNum", RecordingField::SeasonNumber),
    ("topCast", RecordingField::TopCast),
    ("fullCast", RecordingField::FullCast),
    ("entityType", RecordingField::EntityType),
    ("subType", RecordingField::SubType),
];

impl RecordingField {
    /// Map a `Recording` column name to its field. Unknown columns map to `None`.
    pub fn from_column(column: &str) -> Option<Self> {
        RECORDING_COLUMNS
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, field)| *field)
    }

    /// The `Recording` columns read from the index, in query order.
    pub fn recording_columns() -> impl Iterator<Item = &'static str> {
        RECORDING_COLUMNS.iter().map(|(name, _)| *name)
    }

    /// Whether the field currently holds an empty/default value.
    pub fn is_empty(&self, rec: &CanonicalRecording) -> bool {
        match self {
            Self::Id => rec.id == 0,
            Self::Title => rec.title.is_empty(),
            Self::Payload => rec.payload.raw().is_none_or(str::is_empty),
            Self::ChannelId => rec.channel_id == 0,
            Self::OrigAirDate => rec.orig_air_date.is_empty(),
            Self::ShortDescription => rec.short_description.is_empty(),
            Self::LongDescription => rec.long_description.is_empty(),
            Self::EpisodeTitle => rec.episode_title.is_empty(),
            Self::EpisodeNumber => is_blank_number(&rec.episode_number),
            Self::SeasonNumber => is_blank_number(&rec.season_number),
            Self::TopCast => rec.top_cast.is_empty(),
            Self::FullCast => rec.full_cast.is_empty(),
            Self::EntityType => rec.entity_type.is_empty(),
            Self::SubType => rec.sub_type.is_empty(),
            Self::CallSign => rec.call_sign.is_empty(),
            Self::ChannelNumberMajor => rec.channel_number_major.is_none_or(|n| n == 0),
            Self::ChannelNumberMinor => rec.channel_number_minor.is_none_or(|n| n == 0),
            Self::ResolutionTitle => rec.resolution_title.is_empty(),
        }
    }

    /// Store `value` into the field unconditionally.
    ///
    /// Returns `false` when the value cannot be represented by the field
    /// (e.g. non-numeric text for a channel number); the field is left as is.
    fn assign(&self, rec: &mut CanonicalRecording, value: &ColumnValue) -> bool {
        let text = || value.as_text().unwrap_or_default();
        match self {
            Self::Id => return set_integer(&mut rec.id, value),
            Self::ChannelId => return set_integer(&mut rec.channel_id, value),
            Self::ChannelNumberMajor => return set_optional(&mut rec.channel_number_major, value),
            Self::ChannelNumberMinor => return set_optional(&mut rec.channel_number_minor, value),
            Self::Payload => rec.payload = EmbeddedPayload::new(value.as_text()),
            Self::Title => rec.title = text(),
            Self::OrigAirDate => rec.orig_air_date = text(),
            Self::ShortDescription => rec.short_description = text(),
            Self::LongDescription => rec.long_description = text(),
            Self::EpisodeTitle => rec.episode_title = text(),
            Self::EpisodeNumber => rec.episode_number = text(),
            Self::SeasonNumber => rec.season_number = text(),
            Self::TopCast => rec.top_cast = text(),
            Self::FullCast => rec.full_cast = text(),
            Self::EntityType => rec.entity_type = text(),
            Self::SubType => rec.sub_type = text(),
            Self::CallSign => rec.call_sign = text(),
            Self::ResolutionTitle => rec.resolution_title = text(),
        }
        true
    }
}

/// Numbers stored as text count as empty when blank or zero.
fn is_blank_number(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.parse::<i64>().is_ok_and(|n| n == 0)
}

fn set_integer(slot: &mut i64, value: &ColumnValue) -> bool {
    match value.as_integer() {
        Some(n) => {
            *slot = n;
            true
        }
        None => false,
    }
}

fn set_optional(slot: &mut Option<i64>, value: &ColumnValue) -> bool {
    match value.as_integer() {
        Some(n) => {
            *slot = Some(n);
            true
        }
        None => false,
    }
}

impl CanonicalRecording {
    /// Build a record from a `Recording` row.
    ///
    /// Only recognized columns with non-empty values contribute; everything
    /// else keeps its default.
    pub fn from_row(row: &RawRow) -> Self {
        let mut rec = Self::default();
        for (column, value) in row.iter() {
            if let Some(field) = RecordingField::from_column(column) {
                rec.update(field, value, false);
            }
        }
        rec
    }

    /// Conditionally overwrite `field` with `value`.
    ///
    /// The field is changed only when `value` is non-empty and either
    /// `overwrite` is set or the field is currently empty. Returns whether
    /// the field was changed.
    pub fn update(&mut self, field: RecordingField, value: &ColumnValue, overwrite: bool) -> bool {
        if value.is_empty() {
            return false;
        }
        if !overwrite && !field.is_empty(self) {
            return false;
        }
        field.assign(self, value)
    }

    pub fn entity_kind(&self) -> EntityKind {
        EntityKind::parse(&self.entity_type)
    }

    /// Short human-readable label for log lines.
    pub fn log_label(&self) -> String {
        format!(
            "{} = \"{}\"/\"{}\" : {}/{} s{}e{}",
            self.id,
            self.title,
            self.episode_title,
            self.entity_type,
            self.sub_type,
            self.season_number,
            self.episode_number,
        )
    }
}

#[cfg(test)]
#[path = "tests/recording_tests.rs"]
mod tests;
