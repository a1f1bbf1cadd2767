//! The rescue pipeline: reconcile metadata, assemble segments, name and tag
//! the result.

pub mod inventory;
pub mod layout;
pub mod naming;
pub mod process;
pub mod progress;
pub mod reconcile;
pub mod rescue;
pub mod segments;
pub mod settings;
pub mod source;
pub mod tags;
pub mod tools;

pub use inventory::{InventoryEntry, RecordingDetail, describe, survey};
pub use progress::{OutcomeKind, RescueProgress};
pub use reconcile::{ReconcileOptions, reconcile, select_primary};
pub use rescue::{RecordingOutcome, RescueOptions, RescueReport, Rescuer};
pub use segments::{AssemblyOutcome, ConcatPlan, PlanEntry};
pub use settings::{Settings, SettingsError};
pub use source::{IndexQuery, IndexSnapshot, RecordingSource};
pub use tags::{TagArg, derive_tags};
pub use tools::{MediaProbe, ProbeReport, SegmentMerger, SystemTools, TagWriter, Toolchain};
