use asset_duper_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// CLI progress reporter using indicatif spinners.
///
/// Listings have no known length up front, so every phase is a spinner whose
/// message carries the running count.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

fn spinner(message: String) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.guard();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.guard().take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_build_start(&self, source: &str) {
        self.set_bar(spinner(format!("Reading {}...", source)));
    }

    fn on_build_progress(&self, records_seen: usize, _current_key: &str) {
        if let Some(pb) = self.guard().as_ref() {
            pb.set_message(format!("Reading... {} records", records_seen));
        }
    }

    fn on_build_complete(&self, indexed: usize, skipped: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Inventory built: {} files indexed, {} skipped in {:.2}s",
            indexed, skipped, duration_secs
        );
    }

    fn on_analysis_start(&self) {
        self.set_bar(spinner("Looking for duplicates across batches...".to_string()));
    }

    fn on_analysis_complete(&self, duplicate_groups: usize, removals: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Analysis complete: {} duplicate groups, {} removal candidates in {:.2}s",
            duplicate_groups, removals, duration_secs
        );
    }

    fn on_report_written(&self, path: &str, rows: usize) {
        eprintln!("  \x1b[32m✓\x1b[0m {} ({} rows)", path, rows);
    }
}
