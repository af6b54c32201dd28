//! Terminal UI components (status line, colors, time formatting).

mod status_line;
mod theme;

pub use status_line::StatusLine;
pub use theme::Style;

use std::time::Duration;

/// Formats an elapsed time as `N seconds` below a minute and `M:SS` above.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{secs} second{}", if secs == 1 { "" } else { "s" })
    } else {
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}
