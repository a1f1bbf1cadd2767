//! Seams for the three external programs the pipeline drives.
//!
//! The rescue pipeline never shells out directly. It talks to a
//! [`MediaProbe`], a [`SegmentMerger`] and a [`TagWriter`]; the default
//! implementations here run `ffprobe`, `ffmpeg` and `mp4tags`, and tests swap
//! in fakes.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use tablo_rescue_core::RescueError;

use crate::process::{run_captured, run_streaming};
use crate::settings::ToolPaths;
use crate::tags::{TagArg, to_args};

// ── Traits ──────────────────────────────────────────────────────────────────

/// Reports the duration of a media file.
pub trait MediaProbe {
    fn probe(&self, path: &Path) -> Result<ProbeReport, RescueError>;
}

/// Concatenates the segments listed in a manifest into one container.
pub trait SegmentMerger {
    fn merge(&self, manifest: &Path, output: &Path) -> Result<(), RescueError>;
}

/// Writes metadata tags into a finished container.
pub trait TagWriter {
    fn write_tags(&self, file: &Path, tags: &[TagArg]) -> Result<(), RescueError>;
}

/// The three collaborators a rescue needs, borrowed for the length of a run.
#[derive(Clone, Copy)]
pub struct Toolchain<'a> {
    pub probe: &'a dyn MediaProbe,
    pub merger: &'a dyn SegmentMerger,
    pub tagger: &'a dyn TagWriter,
}

// ── Probe Report ────────────────────────────────────────────────────────────

/// The parts of `ffprobe -show_format -show_streams` output we care about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub format: Option<ProbeFormat>,
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeFormat {
    #[serde(default, deserialize_with = "lenient_duration")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeStream {
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_duration")]
    pub duration: Option<String>,
}

/// ffprobe prints durations as strings, but accept bare numbers too.
fn lenient_duration<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl ProbeReport {
    /// A report carrying only a container duration.
    pub fn with_duration(seconds: f64) -> Self {
        Self {
            format: Some(ProbeFormat {
                duration: Some(seconds.to_string()),
            }),
            streams: Vec::new(),
        }
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Duration in seconds: the container's, else the first stream that reports one.
    pub fn duration(&self) -> Result<f64, String> {
        let raw = self
            .format
            .as_ref()
            .and_then(|f| f.duration.as_deref())
            .or_else(|| self.streams.iter().find_map(|s| s.duration.as_deref()))
            .ok_or_else(|| "no container or stream duration reported".to_string())?;
        match raw.trim().parse::<f64>() {
            Ok(secs) if secs.is_finite() => Ok(secs),
            _ => Err(format!("unparseable duration '{raw}'")),
        }
    }
}

// ── ffprobe ─────────────────────────────────────────────────────────────────

pub struct Ffprobe {
    program: PathBuf,
}

impl Ffprobe {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl MediaProbe for Ffprobe {
    fn probe(&self, path: &Path) -> Result<ProbeReport, RescueError> {
        let mut cmd = Command::new(&self.program);
        cmd.args([
            "-loglevel",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path);

        let (output, stdout) = run_captured(&mut cmd)
            .map_err(|e| RescueError::probe_failure(path, format!("failed to run ffprobe: {e}")))?;
        if !output.success() {
            return Err(RescueError::probe_failure(path, output.failure_message("ffprobe")));
        }
        ProbeReport::from_json(&stdout)
            .map_err(|e| RescueError::probe_failure(path, format!("bad ffprobe output: {e}")))
    }
}

// ── ffmpeg ──────────────────────────────────────────────────────────────────

pub struct Ffmpeg {
    program: PathBuf,
}

impl Ffmpeg {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl SegmentMerger for Ffmpeg {
    fn merge(&self, manifest: &Path, output: &Path) -> Result<(), RescueError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-f", "concat", "-safe", "0", "-i"])
            .arg(manifest)
            .args([
                "-c",
                "copy",
                "-bsf:a",
                "aac_adtstoasc",
                "-movflags",
                "+faststart",
                "-y",
            ])
            .arg(output);

        let result = run_streaming(&mut cmd, |line| log::debug!("  {line}"))
            .map_err(|e| RescueError::merge_failure(format!("failed to run ffmpeg: {e}")))?;
        if !result.success() {
            return Err(RescueError::merge_failure(result.failure_message("ffmpeg")));
        }
        Ok(())
    }
}

// ── mp4tags ─────────────────────────────────────────────────────────────────

pub struct Mp4Tags {
    program: PathBuf,
}

impl Mp4Tags {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Mp4Tags {
    fn default() -> Self {
        Self::new("mp4tags")
    }
}

impl TagWriter for Mp4Tags {
    fn write_tags(&self, file: &Path, tags: &[TagArg]) -> Result<(), RescueError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(to_args(tags)).arg(file);

        let result = run_streaming(&mut cmd, |line| log::debug!("  {line}"))
            .map_err(|e| RescueError::tag_failure(format!("failed to run mp4tags: {e}")))?;
        if !result.success() {
            return Err(RescueError::tag_failure(result.failure_message("mp4tags")));
        }
        Ok(())
    }
}

// ── System Tools ────────────────────────────────────────────────────────────

/// The real programs, located through configured paths.
pub struct SystemTools {
    pub probe: Ffprobe,
    pub merger: Ffmpeg,
    pub tagger: Mp4Tags,
}

impl SystemTools {
    pub fn from_paths(paths: &ToolPaths) -> Self {
        Self {
            probe: Ffprobe::new(paths.ffprobe.clone()),
            merger: Ffmpeg::new(paths.ffmpeg.clone()),
            tagger: Mp4Tags::new(paths.mp4tags.clone()),
        }
    }

    pub fn toolchain(&self) -> Toolchain<'_> {
        Toolchain {
            probe: &self.probe,
            merger: &self.merger,
            tagger: &self.tagger,
        }
    }
}
