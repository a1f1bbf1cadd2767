//! Domain types for rescuing recordings from a Tablo external drive.
//!
//! The appliance keeps three overlapping descriptions of every recording:
//! the `Recording` row itself, the `Channel` row it was tuned from, and a
//! JSON document embedded in the recording row. The types here model each
//! source and the reconciled [`CanonicalRecording`] built from them.

pub mod channel;
pub mod error;
pub mod payload;
pub mod recording;
pub mod value;

pub use channel::{ChannelField, ChannelRecord};
pub use error::RescueError;
pub use payload::{EmbeddedPayload, PayloadKey};
pub use recording::{CanonicalRecording, EntityKind, RecordingField};
pub use value::{ColumnValue, RawRow};

/// Column holding the primary key in both the `Recording` and `Channel` relations.
pub const ID_COLUMN: &str = "ID";
