// UI layer: what the step shows on the terminal. A spinner per file while
// it uploads (hidden automatically when stderr is not a terminal), the
// failure annotation used by soft-fail mode, and the optional JSON summary.

use crate::paths::UploadTask;
use crate::upload::{Progress, UploadOutcome};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::time::Duration;

/// Spinner shown while each file is in flight.
pub struct Spinner {
    current: RefCell<Option<ProgressBar>>,
}

impl Spinner {
    pub fn new() -> Self {
        Spinner {
            current: RefCell::new(None),
        }
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress for Spinner {
    fn started(&self, task: &UploadTask) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Uploading {}...", task.relative_path));
        spinner.enable_steady_tick(Duration::from_millis(120));
        if let Some(previous) = self.current.replace(Some(spinner)) {
            previous.finish_and_clear();
        }
    }

    fn finished(&self, task: &UploadTask, _public_url: &str) {
        if let Some(spinner) = self.current.borrow_mut().take() {
            spinner.finish_with_message(format!("Uploaded {}", task.relative_path));
        }
    }
}

impl Drop for Spinner {
    // A spinner left running means the run aborted mid-file.
    fn drop(&mut self) {
        if let Some(spinner) = self.current.get_mut().take() {
            spinner.abandon();
        }
    }
}

/// Mark the step failed without unwinding: emit the runner's error
/// annotation on stdout.
pub fn mark_failed(message: &str) {
    println!("::error::{}", escape_annotation(message));
}

fn escape_annotation(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Print the outcome of a successful run as pretty JSON.
pub fn print_summary(outcome: &UploadOutcome) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}
