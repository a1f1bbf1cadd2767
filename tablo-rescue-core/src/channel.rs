//! Rows from the `Channel` relation.

use serde::Serialize;

use crate::recording::RecordingField;
use crate::value::{ColumnValue, RawRow};

/// Channel details used to fill in what a recording row lacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub id: i64,
    pub call_sign: Option<String>,
    pub channel_number_major: Option<i64>,
    pub channel_number_minor: Option<i64>,
    pub resolution_title: Option<String>,
}

/// The four channel columns that enrich a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelField {
    CallSign,
    ChannelNumberMajor,
    ChannelNumberMinor,
    ResolutionTitle,
}

/// Channel fields in enrichment order.
const ALL_FIELDS: &[ChannelField] = &[
    ChannelField::CallSign,
    ChannelField::ChannelNumberMajor,
    ChannelField::ChannelNumberMinor,
    ChannelField::ResolutionTitle,
];

impl ChannelField {
    /// Column name in the `Channel` relation.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::CallSign => "callSign",
            Self::ChannelNumberMajor => "channelNumberMajor",
            Self::ChannelNumberMinor => "channelNumberMinor",
            Self::ResolutionTitle => "resolutionTitle",
        }
    }

    /// The canonical recording field this column feeds.
    pub fn target(&self) -> RecordingField {
        match self {
            Self::CallSign => RecordingField::CallSign,
            Self::ChannelNumberMajor => RecordingField::ChannelNumberMajor,
            Self::ChannelNumberMinor => RecordingField::ChannelNumberMinor,
            Self::ResolutionTitle => RecordingField::ResolutionTitle,
        }
    }

    pub fn all() -> &'static [ChannelField] {
        ALL_FIELDS
    }
}

impl ChannelRecord {
    /// Build a channel record from an index row. Unknown columns are ignored.
    pub fn from_row(row: &RawRow) -> Self {
        let text = |field: ChannelField| {
            row.get(field.column_name())
                .filter(|v| !v.is_empty())
                .and_then(ColumnValue::as_text)
        };
        let number = |field: ChannelField| {
            row.get(field.column_name())
                .and_then(ColumnValue::as_integer)
        };
        Self {
            id: row.id().unwrap_or_default(),
            call_sign: text(ChannelField::CallSign),
            channel_number_major: number(ChannelField::ChannelNumberMajor),
            channel_number_minor: number(ChannelField::ChannelNumberMinor),
            resolution_title: text(ChannelField::ResolutionTitle),
        }
    }

    /// The value this channel holds for `field`.
    pub fn value(&self, field: ChannelField) -> ColumnValue {
        match field {
            ChannelField::CallSign => self.call_sign.clone().into(),
            ChannelField::ChannelNumberMajor => self.channel_number_major.into(),
            ChannelField::ChannelNumberMinor => self.channel_number_minor.into(),
            ChannelField::ResolutionTitle => self.resolution_title.clone().into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_row() {
        let row = RawRow::new()
            .with("ID", 5)
            .with("callSign", "WXYZ")
            .with("channelNumberMajor", 7)
            .with("channelNumberMinor", "2")
            .with("resolutionTitle", "1080i")
            .with("unrelated", "ignored");
        let channel = ChannelRecord::from_row(&row);
        assert_eq!(channel.id, 5);
        assert_eq!(channel.call_sign.as_deref(), Some("WXYZ"));
        assert_eq!(channel.channel_number_major, Some(7));
        assert_eq!(channel.channel_number_minor, Some(2));
        assert_eq!(channel.resolution_title.as_deref(), Some("1080i"));
    }

    #[test]
    fn test_empty_text_columns_are_absent() {
        let row = RawRow::new().with("ID", 1).with("callSign", "");
        let channel = ChannelRecord::from_row(&row);
        assert_eq!(channel.call_sign, None);
        assert_eq!(channel.value(ChannelField::CallSign), ColumnValue::Null);
    }

    #[test]
    fn test_value_dispatch() {
        let channel = ChannelRecord {
            id: 3,
            call_sign: Some("KABC".to_string()),
            channel_number_major: Some(4),
            channel_number_minor: None,
            resolution_title: Some("720p".to_string()),
        };
        assert_eq!(channel.value(ChannelField::CallSign), ColumnValue::from("KABC"));
        assert_eq!(channel.value(ChannelField::ChannelNumberMajor), ColumnValue::Integer(4));
        assert_eq!(channel.value(ChannelField::ChannelNumberMinor), ColumnValue::Null);
        assert_eq!(channel.value(ChannelField::ResolutionTitle), ColumnValue::from("720p"));
    }
}
