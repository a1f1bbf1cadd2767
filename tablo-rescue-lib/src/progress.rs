use std::path::PathBuf;

/// Progress update sent while rescuing recordings.
///
/// Frontends receive these through a callback and turn them into spinner
/// messages or log lines; the library itself never touches global output.
#[derive(Debug, Clone, PartialEq)]
pub enum RescueProgress {
    /// A recording is about to be reconciled and rescued
    Starting {
        /// Recording identifier
        id: i64,
        /// Position within the batch (zero-based)
        index: usize,
        /// Size of the batch
        total: usize,
    },

    /// Metadata for the recording has been reconciled
    Reconciled {
        id: i64,
        /// Synthesized output filename (no extension)
        filename: String,
    },

    /// A segment is being probed for its duration
    ProbingSegment {
        file_name: String,
        current: usize,
        total: usize,
    },

    /// The merge tool is concatenating segments
    Merging { output: PathBuf, segments: usize },

    /// Tags are being written into the merged asset
    Tagging { output: PathBuf },

    /// The recording reached a terminal outcome
    Finished { id: i64, kind: OutcomeKind },
}

/// Terminal state of one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Rescued,
    Skipped,
    Failed,
}

impl OutcomeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rescued => "Rescued",
            Self::Skipped => "Skipped",
            Self::Failed => "Rescue failed",
        }
    }
}

impl RescueProgress {
    pub fn starting(id: i64, index: usize, total: usize) -> Self {
        Self::Starting { id, index, total }
    }

    pub fn probing(file_name: impl Into<String>, current: usize, total: usize) -> Self {
        Self::ProbingSegment {
            file_name: file_name.into(),
            current,
            total,
        }
    }

    pub fn finished(id: i64, kind: OutcomeKind) -> Self {
        Self::Finished { id, kind }
    }
}
