//! Output filename synthesis.

use tablo_rescue_core::{CanonicalRecording, EntityKind};

/// Characters that Windows refuses in file names.
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Descriptive, filesystem-safe name for a recording, without extension.
///
/// Episodes read `"<id> <title> - s01e03 - <episode title> - [<type> <subtype>]"`,
/// everything else `"<id> <title> - [<type> <subtype>]"`. A quality tag follows
/// and the whole string is sanitized last.
pub fn synthesize(id: i64, rec: &CanonicalRecording) -> String {
    let base = format!("{id} {}", rec.title);
    let qualifier = format!("[{} {}]", rec.entity_type, rec.sub_type);
    let mut name = if rec.entity_kind() == EntityKind::Episode {
        let se = season_episode_tag(&rec.season_number, &rec.episode_number);
        format!("{base} - {se} - {} - {qualifier}", rec.episode_title)
    } else {
        format!("{base} - {qualifier}")
    };
    name.push(' ');
    name.push_str(quality_suffix(&rec.resolution_title));
    sanitize(&name)
}

/// `s01e03` style tag. Non-numeric parts are kept verbatim after their prefix
/// and empty parts are dropped.
pub fn season_episode_tag(season: &str, episode: &str) -> String {
    format!("{}{}", number_part('s', season), number_part('e', episode))
}

fn number_part(prefix: char, value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    match value.trim().parse::<i64>() {
        Ok(n) => format!("{prefix}{n:02}"),
        Err(_) => format!("{prefix}{value}"),
    }
}

/// `[HDRip]` when the resolution's leading number is above 480, else `[TVRip]`.
pub fn quality_suffix(resolution: &str) -> &'static str {
    let digits: String = resolution.chars().take_while(char::is_ascii_digit).collect();
    let hd = match digits.parse::<u64>() {
        Ok(lines) => lines > 480,
        // only overflow gets here with a non-empty run
        Err(_) => !digits.is_empty(),
    };
    if hd { "[HDRip]" } else { "[TVRip]" }
}

pub fn is_allowed_char(c: char) -> bool {
    let code = c as u32;
    (32..=254).contains(&code) && code != 127 && !ILLEGAL_CHARS.contains(&c)
}

/// Replace every character outside the allowed set with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if is_allowed_char(c) { c } else { '_' })
        .collect()
}
