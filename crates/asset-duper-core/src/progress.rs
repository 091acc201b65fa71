/// Trait for reporting pipeline progress.
///
/// CLI implements with indicatif. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_build_start(&self, _source: &str) {}
    fn on_build_progress(&self, _records_seen: usize, _current_key: &str) {}
    fn on_build_complete(&self, _indexed: usize, _skipped: usize, _duration_secs: f64) {}
    fn on_analysis_start(&self) {}
    fn on_analysis_complete(&self, _duplicate_groups: usize, _removals: usize, _duration_secs: f64) {}
    fn on_report_written(&self, _path: &str, _rows: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
