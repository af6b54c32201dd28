use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::translation::{Status, status_to_text};

/// A single terminal line showing the live translation status tree.
///
/// Shows `done/total` fragment counts followed by the condensed tree.
/// Clears itself when dropped.
pub struct StatusLine {
    progress_bar: ProgressBar,
}

impl StatusLine {
    /// Creates the status line. A hidden line accepts updates and draws nothing.
    #[allow(clippy::unwrap_used)]
    pub fn new(hidden: bool) -> Self {
        if hidden {
            return Self {
                progress_bar: ProgressBar::hidden(),
            };
        }

        let progress_bar = ProgressBar::new_spinner();
        // unwrap is safe: template string is a compile-time constant
        progress_bar.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                .template("{spinner} {wide_msg}")
                .unwrap(),
        );
        progress_bar.enable_steady_tick(Duration::from_millis(80));

        Self { progress_bar }
    }

    pub fn update(&self, status: &Status) {
        self.progress_bar.set_message(render(status));
    }

    /// Stops the status line and clears it from the terminal.
    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}

impl Drop for StatusLine {
    fn drop(&mut self) {
        self.progress_bar.finish_and_clear();
    }
}

fn render(status: &Status) -> String {
    let (done, total) = status.progress();
    format!("{done}/{total} {}", status_to_text(status))
}
