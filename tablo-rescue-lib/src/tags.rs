//! Derive `mp4tags` arguments from a canonical recording.

use tablo_rescue_core::{CanonicalRecording, EntityKind};

use crate::naming::season_episode_tag;

/// Kind of media written into the `-type` atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    TvShow,
    Movie,
}

impl MediaType {
    pub fn of(rec: &CanonicalRecording) -> Self {
        match rec.entity_kind() {
            EntityKind::Episode | EntityKind::Show => Self::TvShow,
            _ => Self::Movie,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TvShow => "tvshow",
            Self::Movie => "Movie",
        }
    }
}

/// A single `mp4tags` option and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagArg {
    pub flag: &'static str,
    pub value: String,
}

impl TagArg {
    pub fn new(flag: &'static str, value: impl Into<String>) -> Self {
        Self {
            flag,
            value: value.into(),
        }
    }
}

/// Flatten tags into the argument list `mp4tags` expects.
pub fn to_args(tags: &[TagArg]) -> Vec<String> {
    tags.iter()
        .flat_map(|t| [t.flag.to_string(), t.value.clone()])
        .collect()
}

/// `-hdvideo` code for a resolution label, or `None` to omit the tag.
pub fn resolution_code(resolution: &str) -> Option<u8> {
    match resolution {
        "480i" => Some(0),
        "720p" => Some(1),
        "1080i" | "1080p" => Some(2),
        "2160i" | "2160p" => Some(3),
        _ => None,
    }
}

// ── Field Tables ────────────────────────────────────────────────────────────

type FieldAccessor = fn(&CanonicalRecording) -> &str;

fn air_date(r: &CanonicalRecording) -> &str {
    &r.orig_air_date
}
fn long_description(r: &CanonicalRecording) -> &str {
    &r.long_description
}
fn short_description(r: &CanonicalRecording) -> &str {
    &r.short_description
}
fn call_sign(r: &CanonicalRecording) -> &str {
    &r.call_sign
}
fn episode_number(r: &CanonicalRecording) -> &str {
    &r.episode_number
}
fn season_number(r: &CanonicalRecording) -> &str {
    &r.season_number
}
fn title(r: &CanonicalRecording) -> &str {
    &r.title
}
fn episode_title(r: &CanonicalRecording) -> &str {
    &r.episode_title
}

const TV_TAGS: &[(&str, FieldAccessor)] = &[
    ("-year", air_date),
    ("-longdesc", long_description),
    ("-description", short_description),
    ("-network", call_sign),
    ("-episode", episode_number),
    ("-season", season_number),
    ("-album", title),
    ("-sortalbum", title),
    ("-show", title),
    ("-sorttvshow", title),
    ("-song", episode_title),
];

const MOVIE_TAGS: &[(&str, FieldAccessor)] = &[
    ("-year", air_date),
    ("-longdesc", long_description),
    ("-network", call_sign),
    ("-description", short_description),
    ("-album", title),
    ("-sortalbum", title),
    ("-song", title),
    ("-sortname", title),
];

fn mapped_tags(rec: &CanonicalRecording, table: &[(&'static str, FieldAccessor)]) -> Vec<TagArg> {
    table
        .iter()
        .filter_map(|&(flag, field)| {
            let value = field(rec);
            (!value.is_empty()).then(|| TagArg::new(flag, value))
        })
        .collect()
}

// ── Cast ────────────────────────────────────────────────────────────────────

/// How a cast member's name is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastStyle {
    /// "First Last"
    Display,
    /// "Last, First"
    Sort,
}

/// Parse the preferred cast list (top cast, else full cast) into name tokens.
///
/// Unparseable cast data is logged and treated as no cast.
pub fn cast_names(rec: &CanonicalRecording) -> Vec<Vec<String>> {
    let source = if !rec.top_cast.is_empty() {
        &rec.top_cast
    } else if !rec.full_cast.is_empty() {
        &rec.full_cast
    } else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(source) {
        Ok(names) => names
            .iter()
            .map(|n| n.split_whitespace().map(String::from).collect::<Vec<_>>())
            .filter(|tokens| !tokens.is_empty())
            .collect(),
        Err(e) => {
            log::error!("Recording {}: error processing cast list: {e}", rec.id);
            Vec::new()
        }
    }
}

/// Join cast members with `"; "` in the given style.
pub fn format_cast(cast: &[Vec<String>], style: CastStyle) -> String {
    cast.iter()
        .map(|tokens| match (style, tokens.split_last()) {
            (CastStyle::Sort, Some((last, rest))) if !rest.is_empty() => {
                format!("{last}, {}", rest.join(" "))
            }
            _ => tokens.join(" "),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// ── Derivation ──────────────────────────────────────────────────────────────

/// `"<title> - s01e03 - <episode title>"`, the sort key for episodes.
pub fn sort_episode_name(rec: &CanonicalRecording) -> String {
    format!(
        "{} - {} - {}",
        rec.title,
        season_episode_tag(&rec.season_number, &rec.episode_number),
        rec.episode_title
    )
}

/// Every tag to write for `rec`, in `mp4tags` argument order.
pub fn derive_tags(rec: &CanonicalRecording) -> Vec<TagArg> {
    let media_type = MediaType::of(rec);
    let mut tags = vec![
        TagArg::new("-type", media_type.as_str()),
        TagArg::new("-comment", format!("TabloID={}", rec.id)),
    ];
    if let Some(code) = resolution_code(&rec.resolution_title) {
        tags.push(TagArg::new("-hdvideo", code.to_string()));
    }

    let cast = cast_names(rec);
    if !cast.is_empty() {
        tags.push(TagArg::new("-artist", format_cast(&cast, CastStyle::Display)));
        tags.push(TagArg::new("-sortartist", format_cast(&cast, CastStyle::Sort)));
    }

    match media_type {
        MediaType::TvShow => {
            tags.extend(mapped_tags(rec, TV_TAGS));
            tags.push(TagArg::new("-sortname", sort_episode_name(rec)));
        }
        MediaType::Movie => tags.extend(mapped_tags(rec, MOVIE_TAGS)),
    }
    tags
}

#[cfg(test)]
#[path = "tests/tags_tests.rs"]
mod tests;
