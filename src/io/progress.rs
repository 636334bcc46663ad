//! Progress display for interactive runs

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static CELL_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{msg}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} cells"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Tracks cell collapse across the retry attempts of one generation run
///
/// The bar length is the number of cells the observe loop must collapse; a
/// restart rewinds the position and bumps the attempt counter in the message.
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    /// Create a tracker for a run over the given number of observable cells
    pub fn new(cells: usize) -> Self {
        let bar = ProgressBar::new(cells as u64);
        bar.set_style(CELL_STYLE.clone());
        Self { bar }
    }

    /// Announce the start of an attempt
    pub fn start_attempt(&self, attempt: usize, max_attempts: usize) {
        self.bar.set_position(0);
        self.bar.set_message(format!("attempt {attempt}/{max_attempts}"));
    }

    /// Report the number of cells decided so far in this attempt
    pub fn update_cells(&self, decided: usize) {
        self.bar.set_position(decided as u64);
    }

    /// Finish the display with a closing message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
