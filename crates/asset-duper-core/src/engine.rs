use crate::analysis::{self, InventoryDiff};
use crate::config::AppConfig;
use crate::error::Error;
use crate::inventory::{BuildCounters, InventoryBuild, InventoryBuilder, Termination};
use crate::progress::ProgressReporter;
use crate::report::{self, ReportSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct ReconcileEngine {
    config: AppConfig,
    cancel_token: Arc<AtomicBool>,
}

#[derive(Debug)]
pub struct AnalysisResult {
    pub build_duration: Duration,
    pub analysis_duration: Duration,
    pub report_duration: Duration,
    pub counters: BuildCounters,
    pub identities: usize,
    pub batches: usize,
    pub duplicate_groups: usize,
    pub removal_candidates: usize,
    /// How the listing pass ended. Reports are written for partial builds too.
    pub termination: Termination,
    pub reports: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct ComparisonResult {
    pub build_duration: Duration,
    pub left_identities: usize,
    pub right_identities: usize,
    pub missing: usize,
    pub extra: usize,
    /// True when either side was cancelled before its listing was exhausted.
    pub partial: bool,
    pub reports: Vec<PathBuf>,
}

impl ReconcileEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            cancel_token: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared flag that stops any running build between two records.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_token)
    }

    fn builder(&self) -> InventoryBuilder {
        InventoryBuilder::new(self.config.batch_strategy())
            .with_ignore_patterns(&self.config.ignore_patterns)
            .with_cancel_token(self.cancel_token())
            .with_progress_interval(self.config.progress_interval)
    }

    pub fn build_inventory<I>(
        &self,
        records: I,
        source: &str,
        reporter: &dyn ProgressReporter,
    ) -> InventoryBuild
    where
        I: IntoIterator<Item = Result<String, Error>>,
    {
        info!("Building inventory from {}...", source);
        reporter.on_build_start(source);
        let start = Instant::now();
        let build = self.builder().build(records, reporter);
        reporter.on_build_complete(
            build.counters.indexed,
            build.counters.skipped,
            start.elapsed().as_secs_f64(),
        );
        build
    }

    /// Run the duplicate pipeline over one listing:
    /// 1. Build the inventory (stops early on cancel or source failure)
    /// 2. Find cross-batch duplicates and resolve keep/remove by batch size
    /// 3. Write snapshot, duplicate, UUID folder, batch summary, stats and removal reports
    pub fn analyze<I>(
        &self,
        records: I,
        source: &str,
        reporter: &dyn ProgressReporter,
    ) -> Result<AnalysisResult, Error>
    where
        I: IntoIterator<Item = Result<String, Error>>,
    {
        let build_start = Instant::now();
        let build = self.build_inventory(records, source, reporter);
        let build_duration = build_start.elapsed();
        if build.is_partial() {
            warn!(
                "Listing {} after {} records; reporting partial results",
                build.termination.label(),
                build.counters.records_seen
            );
        }

        info!("Analyzing UUID/filename duplicates across batches...");
        reporter.on_analysis_start();
        let analysis_start = Instant::now();
        let groups = analysis::find_duplicates(&build.inventory);
        let resolution = analysis::resolve(&groups, &build.batch_stats);
        let analysis_duration = analysis_start.elapsed();
        reporter.on_analysis_complete(
            groups.len(),
            resolution.remove.len(),
            analysis_duration.as_secs_f64(),
        );

        let report_start = Instant::now();
        let mut reports = ReportSet::new(
            Path::new(&self.config.output_dir),
            &self.config.report_prefix,
        )?;

        let rows = report::write_inventory_snapshot(reports.create("details")?, &build.inventory)?;
        notify_written(reporter, &reports, rows);
        let rows = report::write_duplicate_report(reports.create("uuid_file_duplicates")?, &groups)?;
        notify_written(reporter, &reports, rows);
        let rows = report::write_uuid_folder_counts(reports.create("uuid_folders")?, &build.inventory)?;
        notify_written(reporter, &reports, rows);
        let rows = report::write_batch_summary(reports.create("batch_summary")?, &build.batch_stats)?;
        notify_written(reporter, &reports, rows);
        let rows = report::write_removal_detailed(reports.create("removal_detailed")?, &resolution.remove)?;
        notify_written(reporter, &reports, rows);
        let rows = report::write_removal_simple(reports.create("removal_simple")?, &resolution.remove)?;
        notify_written(reporter, &reports, rows);

        let metrics = [
            ("Total Objects Processed", build.counters.records_seen.to_string()),
            ("Indexed Files", build.counters.indexed.to_string()),
            ("Unparsable Records Skipped", build.counters.skipped.to_string()),
            ("Ignored Records", build.counters.ignored.to_string()),
            ("Total UUID/Filename Combinations", build.inventory.len().to_string()),
            ("Total Batch Folders", build.batch_stats.len().to_string()),
            ("UUID/Filename Duplicates Across Batches", groups.len().to_string()),
            ("Files Proposed For Removal", resolution.remove.len().to_string()),
            ("Listing Status", build.termination.label().to_string()),
        ];
        let rows = report::write_run_stats(reports.create("stats")?, &metrics)?;
        notify_written(reporter, &reports, rows);
        let report_duration = report_start.elapsed();

        debug!(
            "Reports completed in {:.2}s: {:?}",
            report_duration.as_secs_f64(),
            reports.written()
        );

        Ok(AnalysisResult {
            build_duration,
            analysis_duration,
            report_duration,
            counters: build.counters,
            identities: build.inventory.len(),
            batches: build.batch_stats.len(),
            duplicate_groups: groups.len(),
            removal_candidates: resolution.remove.len(),
            reports: reports.written().to_vec(),
            termination: build.termination,
        })
    }

    /// Diff a reference listing (left) against a target listing (right) and
    /// write the missing and extra asset paths. A source failure on either side
    /// is returned as an error; a cancelled side is diffed as far as it got.
    pub fn compare<L, R>(
        &self,
        reference: L,
        target: R,
        reporter: &dyn ProgressReporter,
    ) -> Result<ComparisonResult, Error>
    where
        L: IntoIterator<Item = Result<String, Error>>,
        R: IntoIterator<Item = Result<String, Error>>,
    {
        let build_start = Instant::now();
        let left = self.build_inventory(reference, "reference list", reporter);
        if let Termination::Failed(err) = left.termination {
            return Err(err);
        }
        let right = self.build_inventory(target, "target listing", reporter);
        if let Termination::Failed(err) = right.termination {
            return Err(err);
        }
        let build_duration = build_start.elapsed();

        let partial = matches!(left.termination, Termination::Cancelled)
            || matches!(right.termination, Termination::Cancelled);
        if partial {
            warn!("Comparison was cancelled; missing/extra lists are incomplete");
        }

        let InventoryDiff { missing, extra } = analysis::diff(&left.inventory, &right.inventory);
        let sources = [&left.inventory, &right.inventory];

        let prefix = format!("{}_compare", self.config.report_prefix);
        let mut reports = ReportSet::new(Path::new(&self.config.output_dir), &prefix)?;
        let rows = report::write_asset_paths(reports.create("missing")?, &missing, &sources)?;
        notify_written(reporter, &reports, rows);
        let rows = report::write_asset_paths(reports.create("extra")?, &extra, &sources)?;
        notify_written(reporter, &reports, rows);

        Ok(ComparisonResult {
            build_duration,
            left_identities: left.inventory.len(),
            right_identities: right.inventory.len(),
            missing: missing.len(),
            extra: extra.len(),
            partial,
            reports: reports.written().to_vec(),
        })
    }
}

fn notify_written(reporter: &dyn ProgressReporter, reports: &ReportSet, rows: usize) {
    if let Some(path) = reports.written().last() {
        reporter.on_report_written(&path.to_string_lossy(), rows);
    }
}
