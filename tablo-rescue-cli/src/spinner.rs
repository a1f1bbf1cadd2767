//! Single-line progress spinner for rescue runs.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use tablo_rescue_lib::RescueProgress;

/// Spinner that follows the rescue pipeline's progress events.
///
/// Hidden when `hidden` is set, so it never fights with debug log output.
pub(crate) struct RescueSpinner {
    bar: ProgressBar,
}

impl RescueSpinner {
    pub(crate) fn new(hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        let style = ProgressStyle::with_template("  {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("/-\\|");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Update the message for one progress event.
    pub(crate) fn update(&self, event: &RescueProgress) {
        match event {
            RescueProgress::Starting { id, index, total } => {
                self.bar
                    .set_message(format!("Processing recording {id} ({} of {total})", index + 1));
            }
            RescueProgress::Reconciled { filename, .. } => {
                self.bar.set_message(filename.clone());
            }
            RescueProgress::ProbingSegment {
                file_name,
                current,
                total,
            } => {
                self.bar
                    .set_message(format!("Probing {file_name} ({current}/{total})"));
            }
            RescueProgress::Merging { segments, .. } => {
                self.bar.set_message(format!("Merging {segments} segments"));
            }
            RescueProgress::Tagging { .. } => {
                self.bar.set_message("Writing tags");
            }
            RescueProgress::Finished { .. } => {}
        }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
