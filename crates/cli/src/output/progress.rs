//! Progress indicators for uploads and connection checks
//!
//! Progress is drawn on stderr and suppressed in quiet, JSON or no-progress
//! mode so that stdout stays parseable.

use super::OutputConfig;

/// Progress bar wrapper
///
/// Handles progress display based on output configuration.
#[derive(Debug)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    fn hidden(config: &OutputConfig) -> bool {
        config.quiet || config.json || config.no_progress
    }

    /// Create a bar counting `total` files
    pub fn files(config: &OutputConfig, total: u64) -> Self {
        let bar = (!Self::hidden(config)).then(|| {
            let bar = indicatif::ProgressBar::new(total);
            bar.set_style(
                indicatif::ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
                    .expect("valid template")
                    .progress_chars("#>-"),
            );
            bar
        });

        Self { bar }
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(config: &OutputConfig, message: &str) -> Self {
        let bar = (!Self::hidden(config)).then(|| {
            let bar = indicatif::ProgressBar::new_spinner();
            bar.set_style(
                indicatif::ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .expect("valid template"),
            );
            bar.set_message(message.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
            bar
        });

        Self { bar }
    }

    /// Increment progress
    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    /// Set message
    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Finish and clear the progress bar
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
