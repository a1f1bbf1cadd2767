//! Where things live on an exported Tablo drive.

use std::path::{Path, PathBuf};

/// `<mount>/db/Tablo.db`
pub fn default_index_path(mount: &Path) -> PathBuf {
    mount.join("db").join("Tablo.db")
}

/// `<mount>/rec/<id>/segs`
pub fn segment_dir(mount: &Path, id: i64) -> PathBuf {
    mount.join("rec").join(id.to_string()).join("segs")
}

/// `<dir>/<filename>.mp4`
///
/// The extension is appended, not substituted, so titles containing dots
/// survive intact.
pub fn output_path(dir: &Path, filename: &str) -> PathBuf {
    dir.join(format!("{filename}.mp4"))
}
