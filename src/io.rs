//! File input/output.

pub mod utils;
pub mod vtk;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use lazy_static::lazy_static;

lazy_static! {
    static ref DEFAULT_PROGRESS_STYLE: ProgressStyle =
        ProgressStyle::default_bar().template("Progress: {bar:40}  {percent}% | ETA: {eta}");
}

/// How much to print about the progress of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    /// Print nothing but errors.
    Quiet,
    /// Print status messages.
    Messages,
    /// Print status messages and show progress bars.
    Progress,
}

impl Verbosity {
    /// Whether non-critical status messages should be printed.
    pub fn print_messages(&self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Whether progress bars should be shown.
    pub fn show_progress(&self) -> bool {
        matches!(self, Self::Progress)
    }

    /// Creates a progress bar for the given number of steps,
    /// hidden unless progress should be shown.
    pub fn create_progress_bar(&self, n_steps: usize) -> ProgressBar {
        let progress_bar = ProgressBar::new(n_steps as u64);
        if self.show_progress() {
            progress_bar.set_style(DEFAULT_PROGRESS_STYLE.clone());
        } else {
            progress_bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        progress_bar
    }
}

/// What to do when an output file already exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverwriteMode {
    /// Overwrite without asking.
    Always,
    /// Leave the existing file and skip writing.
    Never,
}
