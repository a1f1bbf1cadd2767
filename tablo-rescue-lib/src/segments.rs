//! Segment assembly: turn a directory of transport-stream fragments into one
//! container.
//!
//! Assembly is two steps. [`build_plan`] lists and probes the segments and
//! produces a [`ConcatPlan`] of `(path, corrected duration)` pairs. [`merge`]
//! writes the plan to a scoped temporary manifest and hands it to the merge
//! tool. [`assemble`] runs both, honouring the skip-existing policy.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tablo_rescue_core::RescueError;

use crate::progress::RescueProgress;
use crate::tools::{MediaProbe, SegmentMerger, Toolchain};

/// File extension of a recording segment.
pub const SEGMENT_EXTENSION: &str = "ts";

/// Seconds trimmed from every probed segment duration.
///
/// The tuner writes a short overlap at the end of each segment; without the
/// trim every boundary repeats a fraction of a second.
pub const SEGMENT_TRIM_SECONDS: f64 = 0.5;

// ── Listing ─────────────────────────────────────────────────────────────────

/// Segment files directly inside `dir`, in assembly order.
///
/// Only regular files ending in `.ts` are kept. Names are compared bytewise,
/// which the appliance's zero-padded naming makes chronological.
pub fn list_segments(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_segment(&path) {
            segments.push(path);
        }
    }
    segments.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(segments)
}

fn is_segment(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SEGMENT_EXTENSION)
}

/// Number of segments in `dir`, or 0 if it cannot be read.
pub fn count_segments(dir: &Path) -> usize {
    list_segments(dir).map(|s| s.len()).unwrap_or(0)
}

// ── Plan ────────────────────────────────────────────────────────────────────

/// One segment in a concatenation plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub path: PathBuf,
    /// Probed duration minus [`SEGMENT_TRIM_SECONDS`].
    pub duration: f64,
}

/// Ordered, non-empty list of segments to concatenate.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatPlan {
    entries: Vec<PlanEntry>,
}

impl ConcatPlan {
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(|e| e.duration).sum()
    }

    /// Write the plan in ffmpeg concat-demuxer syntax.
    pub fn write_manifest(&self, mut out: impl Write) -> io::Result<()> {
        for entry in &self.entries {
            let path = entry.path.to_string_lossy().replace('\'', r"'\''");
            writeln!(out, "file '{path}'")?;
            writeln!(out, "duration {:.1}", entry.duration)?;
        }
        Ok(())
    }
}

/// Apply the trim to a probed duration.
///
/// A result that is zero or negative would cut the segment away entirely and
/// is rejected as a probe failure.
pub fn corrected_duration(path: &Path, probed: f64) -> Result<f64, RescueError> {
    let corrected = probed - SEGMENT_TRIM_SECONDS;
    if corrected <= 0.0 {
        return Err(RescueError::probe_failure(
            path,
            format!("duration {probed}s is too short to trim"),
        ));
    }
    Ok(corrected)
}

/// List and probe the segments of `dir` into a plan.
pub fn build_plan(
    dir: &Path,
    probe: &dyn MediaProbe,
    progress: &dyn Fn(RescueProgress),
) -> Result<ConcatPlan, RescueError> {
    let segments = list_segments(dir)?;
    if segments.is_empty() {
        return Err(RescueError::NoSegments(dir.to_path_buf()));
    }

    let total = segments.len();
    let mut entries = Vec::with_capacity(total);
    for (i, path) in segments.into_iter().enumerate() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        progress(RescueProgress::probing(name, i + 1, total));

        let report = probe.probe(&path)?;
        let probed = report
            .duration()
            .map_err(|msg| RescueError::probe_failure(&path, msg))?;
        let duration = corrected_duration(&path, probed)?;
        log::debug!("{} : {probed:.3}s -> {duration:.1}s", path.display());
        entries.push(PlanEntry { path, duration });
    }
    Ok(ConcatPlan { entries })
}

// ── Merge ───────────────────────────────────────────────────────────────────

/// Write `plan` to a temporary manifest and run the merge tool on it.
///
/// The manifest is deleted when this returns, whether or not the merge
/// succeeded.
pub fn merge(plan: &ConcatPlan, output: &Path, merger: &dyn SegmentMerger) -> Result<(), RescueError> {
    let mut manifest = tempfile::Builder::new()
        .prefix("tablo-rescue-")
        .suffix(".txt")
        .tempfile()?;
    plan.write_manifest(manifest.as_file_mut())?;
    manifest.as_file_mut().flush()?;
    log::debug!("Concat manifest at {}", manifest.path().display());

    let merged = merger.merge(manifest.path(), output);
    if merged.is_err() && output.exists() {
        log::warn!("Removing incomplete output {}", output.display());
        if let Err(e) = fs::remove_file(output) {
            log::error!("Cannot remove {}: {e}", output.display());
        }
    }
    merged
}

/// What [`assemble`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyOutcome {
    /// Segments were merged into the output path.
    Merged(PathBuf),
    /// The output already existed and overwriting was not requested.
    Skipped(PathBuf),
}

/// Build a plan for `dir` and merge it into `output`.
///
/// When `output` exists and `force` is false nothing is probed or merged.
pub fn assemble(
    dir: &Path,
    output: &Path,
    force: bool,
    tools: Toolchain<'_>,
    progress: &dyn Fn(RescueProgress),
) -> Result<AssemblyOutcome, RescueError> {
    if output.exists() && !force {
        log::info!("{} already exists, skipping", output.display());
        return Ok(AssemblyOutcome::Skipped(output.to_path_buf()));
    }

    let plan = build_plan(dir, tools.probe, progress)?;
    log::info!(
        "Merging {} segments ({:.1}s) into {}",
        plan.len(),
        plan.total_duration(),
        output.display()
    );
    progress(RescueProgress::Merging {
        output: output.to_path_buf(),
        segments: plan.len(),
    });
    merge(&plan, output, tools.merger)?;
    Ok(AssemblyOutcome::Merged(output.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_format() {
        let plan = ConcatPlan {
            entries: vec![
                PlanEntry {
                    path: PathBuf::from("/mnt/rec/1/segs/00000.ts"),
                    duration: 9.5,
                },
                PlanEntry {
                    path: PathBuf::from("/mnt/rec/1/segs/it's.ts"),
                    duration: 7.8,
                },
            ],
        };
        let mut out = Vec::new();
        plan.write_manifest(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "file '/mnt/rec/1/segs/00000.ts'\nduration 9.5\n\
             file '/mnt/rec/1/segs/it'\\''s.ts'\nduration 7.8\n"
        );
    }

    #[test]
    fn test_corrected_duration() {
        let p = Path::new("a.ts");
        assert!((corrected_duration(p, 10.0).unwrap() - 9.5).abs() < 1e-9);
        assert!((corrected_duration(p, 8.3).unwrap() - 7.8).abs() < 1e-9);
        assert!(matches!(
            corrected_duration(p, 0.5),
            Err(RescueError::ProbeFailure { .. })
        ));
        assert!(corrected_duration(p, 0.2).is_err());
    }

    #[test]
    fn test_list_segments_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["00002.ts", "00000.ts", "00001.ts", "notes.txt", "00003.TS"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("99999.ts")).unwrap();

        let names: Vec<String> = list_segments(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["00000.ts", "00001.ts", "00002.ts"]);
        assert_eq!(count_segments(dir.path()), 3);
    }

    #[test]
    fn test_count_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(count_segments(&dir.path().join("nope")), 0);
    }
}
