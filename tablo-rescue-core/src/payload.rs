//! The JSON document embedded in each `Recording` row.
//!
//! The document is parsed on first access only. A malformed document is not
//! fatal: the parse error is cached and reported to whoever asks, and the
//! record simply gets no payload-sourced fields.

use std::cell::OnceCell;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::RescueError;
use crate::recording::RecordingField;

/// Keys read from the embedded document, and the field each one feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKey {
    OriginalAirDate,
    Description,
    EpisodeNumber,
    SeasonNumber,
}

/// Payload keys in enrichment order.
const ALL_KEYS: &[PayloadKey] = &[
    PayloadKey::OriginalAirDate,
    PayloadKey::Description,
    PayloadKey::EpisodeNumber,
    PayloadKey::SeasonNumber,
];

impl PayloadKey {
    /// Key name inside the JSON document.
    pub fn key(&self) -> &'static str {
        match self {
            Self::OriginalAirDate => "originalAirDate",
            Self::Description => "description",
            Self::EpisodeNumber => "episodeNumber",
            Self::SeasonNumber => "seasonNumber",
        }
    }

    /// The canonical field this key enriches.
    pub fn target(&self) -> RecordingField {
        match self {
            Self::OriginalAirDate => RecordingField::OrigAirDate,
            Self::Description => RecordingField::LongDescription,
            Self::EpisodeNumber => RecordingField::EpisodeNumber,
            Self::SeasonNumber => RecordingField::SeasonNumber,
        }
    }

    pub fn all() -> &'static [PayloadKey] {
        ALL_KEYS
    }
}

/// Lazily-parsed embedded document, owned by exactly one record.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedPayload {
    raw: Option<String>,
    parsed: OnceCell<Result<Map<String, Value>, String>>,
}

impl EmbeddedPayload {
    pub fn new(raw: Option<String>) -> Self {
        Self {
            raw,
            parsed: OnceCell::new(),
        }
    }

    /// The unparsed document text, if the row carried one.
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Whether the document has been parsed yet.
    pub fn is_parsed(&self) -> bool {
        self.parsed.get().is_some()
    }

    /// Parse (once) and return the document.
    ///
    /// A record without a document yields an empty map. The document must be
    /// a JSON object; anything else is reported as `MalformedPayload`.
    pub fn document(&self) -> Result<&Map<String, Value>, RescueError> {
        self.parsed
            .get_or_init(|| parse_document(self.raw.as_deref()))
            .as_ref()
            .map_err(|msg| RescueError::MalformedPayload(msg.clone()))
    }

    /// Look up a key in the document.
    pub fn get(&self, key: PayloadKey) -> Result<Option<&Value>, RescueError> {
        Ok(self.document()?.get(key.key()))
    }
}

fn parse_document(raw: Option<&str>) -> Result<Map<String, Value>, String> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, found {}", json_kind(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Serialize for EmbeddedPayload {
    /// Serialized as the parsed document; a malformed document becomes `null`.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.document() {
            Ok(map) => map.serialize(serializer),
            Err(_) => serializer.serialize_none(),
        }
    }
}
