//! Progress spinners for long-running pipeline steps.

use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::Duration;

const TICK_STRINGS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"];

/// Reports the start and outcome of each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Animated spinner on stderr.
    Spinner,
    /// No output.
    Hidden,
}

impl Progress {
    /// Runs `step`, showing `start` while it runs and `done` on success.
    ///
    /// # Errors
    ///
    /// Propagates the step's error unchanged.
    pub async fn run<T, E, F>(self, start: &str, done: &str, step: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
    {
        let pb = self.spinner(start);
        let result = step.await;
        match &result {
            Ok(_) => finish(&pb, &format!("✓ {done}")),
            Err(_) => finish(&pb, &format!("✗ {start} failed")),
        }
        result
    }

    fn spinner(self, msg: &str) -> ProgressBar {
        let pb = match self {
            Self::Spinner => ProgressBar::new_spinner(),
            Self::Hidden => ProgressBar::hidden(),
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_strings(TICK_STRINGS));
        }
        pb.set_message(msg.to_owned());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

fn finish(pb: &ProgressBar, msg: &str) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
    pb.finish_with_message(msg.to_owned());
}
