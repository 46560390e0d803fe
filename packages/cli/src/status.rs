//! `indicatif`-backed status display.
//!
//! Wraps an [`indicatif::ProgressBar`] spinner behind the pipeline's
//! [`StatusReporter`] trait so the pipeline stays unaware of the terminal.

use std::time::Duration;

use console::style;
use geofilter_pipeline::{StatusLevel, StatusReporter};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// A spinner that runs while a photo is processed and prints status
/// events above itself.
pub struct IndicatifStatus {
    bar: ProgressBar,
}

impl IndicatifStatus {
    #[must_use]
    pub fn new(multi: &MultiProgress) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }
}

impl StatusReporter for IndicatifStatus {
    fn set_processing(&self, processing: bool) {
        if processing {
            self.bar.reset();
            self.bar.set_message("Processing photo...");
            self.bar.enable_steady_tick(Duration::from_millis(100));
        } else {
            self.bar.finish_and_clear();
        }
    }

    fn notify(&self, level: StatusLevel, message: &str) {
        let marker = match level {
            StatusLevel::Info => style("i").cyan(),
            StatusLevel::Success => style("✓").green(),
            StatusLevel::Warning => style("!").yellow(),
            StatusLevel::Error => style("✗").red(),
        };
        self.bar.println(format!("{marker} {message}"));
        self.bar.set_message(message.to_string());
    }
}
