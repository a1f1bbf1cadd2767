//! Drive the pipeline for one recording or a batch of them.
//!
//! Each recording is reconciled, assembled and tagged in turn. Whatever goes
//! wrong with one recording becomes its `Failed` outcome and the batch moves
//! on; only the cancel flag stops a batch early.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tablo_rescue_core::{CanonicalRecording, RescueError};

use crate::inventory::survey;
use crate::layout::{output_path, segment_dir};
use crate::naming::synthesize;
use crate::progress::{OutcomeKind, RescueProgress};
use crate::segments::{AssemblyOutcome, assemble};
use crate::source::{IndexSnapshot, RecordingSource};
use crate::tags::derive_tags;
use crate::tools::Toolchain;

/// Options controlling a rescue run.
#[derive(Debug, Clone)]
pub struct RescueOptions {
    /// Root of the mounted Tablo drive
    pub mount: PathBuf,
    /// Directory rescued recordings are written to
    pub output_dir: PathBuf,
    /// Overwrite outputs that already exist
    pub force: bool,
}

/// What happened to one recording.
#[derive(Debug)]
pub struct RecordingOutcome {
    pub id: i64,
    pub kind: OutcomeKind,
    /// Output asset path, when one was resolved
    pub output: Option<PathBuf>,
    /// Why the rescue failed
    pub error: Option<RescueError>,
}

impl RecordingOutcome {
    fn rescued(id: i64, output: PathBuf) -> Self {
        Self {
            id,
            kind: OutcomeKind::Rescued,
            output: Some(output),
            error: None,
        }
    }

    fn skipped(id: i64, output: PathBuf) -> Self {
        Self {
            id,
            kind: OutcomeKind::Skipped,
            output: Some(output),
            error: None,
        }
    }

    fn failed(id: i64, output: Option<PathBuf>, error: RescueError) -> Self {
        log::error!("Rescue of recording {id} failed: {error}");
        Self {
            id,
            kind: OutcomeKind::Failed,
            output,
            error: Some(error),
        }
    }
}

/// Outcomes of a batch, in processing order.
#[derive(Debug, Default)]
pub struct RescueReport {
    pub outcomes: Vec<RecordingOutcome>,
    /// The batch was interrupted before every recording was processed
    pub cancelled: bool,
}

impl RescueReport {
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind == kind).count()
    }

    pub fn rescued(&self) -> usize {
        self.count(OutcomeKind::Rescued)
    }

    pub fn skipped(&self) -> usize {
        self.count(OutcomeKind::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(OutcomeKind::Failed)
    }
}

/// Runs rescues with one set of tools and options.
pub struct Rescuer<'a> {
    tools: Toolchain<'a>,
    options: RescueOptions,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Rescuer<'a> {
    pub fn new(tools: Toolchain<'a>, options: RescueOptions) -> Self {
        Self {
            tools,
            options,
            cancel: None,
        }
    }

    /// Stop between recordings once `flag` is set.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Rescue every recording in the index that still has segments on disk.
    pub fn rescue_all(
        &self,
        snapshot: &IndexSnapshot,
        progress: &dyn Fn(RescueProgress),
    ) -> RescueReport {
        let ids: Vec<i64> = survey(snapshot, &self.options.mount)
            .iter()
            .map(|entry| entry.id)
            .collect();
        self.rescue_ids(snapshot, &ids, progress)
    }

    /// Reconcile and rescue each of `ids` in turn.
    pub fn rescue_ids(
        &self,
        source: &dyn RecordingSource,
        ids: &[i64],
        progress: &dyn Fn(RescueProgress),
    ) -> RescueReport {
        let mut report = RescueReport::default();
        for (index, &id) in ids.iter().enumerate() {
            if self.is_cancelled() {
                log::warn!("Cancelled with {} recordings left", ids.len() - index);
                report.cancelled = true;
                break;
            }
            progress(RescueProgress::starting(id, index, ids.len()));
            let outcome = match source.lookup(id) {
                Ok(rec) => self.rescue_recording(&rec, progress),
                Err(e) => RecordingOutcome::failed(id, None, e),
            };
            progress(RescueProgress::finished(id, outcome.kind));
            report.outcomes.push(outcome);
        }
        if !report.cancelled && self.is_cancelled() {
            log::warn!("Cancelled while the last recording was in progress");
            report.cancelled = true;
        }
        report
    }

    /// Assemble and tag one reconciled recording.
    pub fn rescue_recording(
        &self,
        rec: &CanonicalRecording,
        progress: &dyn Fn(RescueProgress),
    ) -> RecordingOutcome {
        let id = rec.id;
        log::info!("Rescuing {}", rec.log_label());

        let segs = segment_dir(&self.options.mount, id);
        if !segs.is_dir() {
            log::warn!("No segment directory for recording {id} at {}", segs.display());
            return RecordingOutcome::failed(id, None, RescueError::NoSegments(segs));
        }

        let filename = synthesize(id, rec);
        progress(RescueProgress::Reconciled {
            id,
            filename: filename.clone(),
        });
        let output = output_path(&self.options.output_dir, &filename);

        match self.assemble_and_tag(rec, &segs, &output, progress) {
            Ok(AssemblyOutcome::Merged(path)) => RecordingOutcome::rescued(id, path),
            Ok(AssemblyOutcome::Skipped(path)) => RecordingOutcome::skipped(id, path),
            Err(e) => RecordingOutcome::failed(id, None, e),
        }
    }

    fn assemble_and_tag(
        &self,
        rec: &CanonicalRecording,
        segs: &Path,
        output: &Path,
        progress: &dyn Fn(RescueProgress),
    ) -> Result<AssemblyOutcome, RescueError> {
        fs::create_dir_all(&self.options.output_dir)?;
        let outcome = assemble(segs, output, self.options.force, self.tools, progress)?;
        if let AssemblyOutcome::Merged(path) = &outcome {
            progress(RescueProgress::Tagging {
                output: path.clone(),
            });
            log::info!("Updating metadata for {}", path.display());
            self.tools.tagger.write_tags(path, &derive_tags(rec))?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "tests/rescue_tests.rs"]
mod tests;
