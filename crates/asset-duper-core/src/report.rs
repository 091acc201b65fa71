//! CSV report writers. Each writer takes any `io::Write` and returns the number
//! of data rows written.

use crate::analysis::{asset_path, DuplicateGroup, RemovalCandidate};
use crate::error::Error;
use crate::inventory::{BatchStatsMap, Inventory};
use crate::model::AssetIdentity;
use ahash::AHashMap;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Serialize)]
struct SnapshotRow<'a> {
    full_key: &'a str,
    filename: &'a str,
    batch: &'a str,
    uuid_folder: &'a str,
    path_depth: usize,
}

#[derive(Serialize)]
struct DuplicateRow<'a> {
    uuid: &'a str,
    filename: &'a str,
    occurrence_count: usize,
    batches: String,
    full_paths: String,
}

#[derive(Serialize)]
struct UuidFolderRow<'a> {
    batch: &'a str,
    uuid: &'a str,
    file_count: usize,
}

#[derive(Serialize)]
struct BatchSummaryRow<'a> {
    batch: &'a str,
    total_files: usize,
    uuid_folders: usize,
    unique_files: usize,
}

#[derive(Serialize)]
struct MetricRow<'a> {
    metric: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct RemovalRow<'a> {
    full_key: &'a str,
    identity: String,
    batch: &'a str,
    kept_in_batch: &'a str,
}

pub const SNAPSHOT_HEADER: [&str; 5] = [
    "Full Object Key",
    "Filename",
    "Batch Folder",
    "UUID Folder",
    "Path Depth",
];
pub const DUPLICATE_HEADER: [&str; 5] = [
    "UUID",
    "Filename",
    "Occurrence Count",
    "Batch Folders",
    "Full Paths",
];
pub const UUID_FOLDER_HEADER: [&str; 3] = ["Batch", "UUID", "File Count"];
pub const BATCH_SUMMARY_HEADER: [&str; 4] =
    ["Batch Folder", "Total Files", "UUID Folders", "Unique Files"];
pub const RUN_STATS_HEADER: [&str; 2] = ["Metric", "Value"];
pub const REMOVAL_DETAILED_HEADER: [&str; 4] =
    ["Full Object Key", "UUID/Filename", "Batch", "Kept In Batch"];

/// Header rows are written up front so an empty report still carries its columns.
fn start<W: Write>(out: W, header: &[&str]) -> Result<csv::Writer<W>, Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(header)?;
    Ok(writer)
}

fn finish<W: Write>(mut writer: csv::Writer<W>, rows: usize) -> Result<usize, Error> {
    writer.flush()?;
    Ok(rows)
}

/// One row per occurrence: `Full Object Key, Filename, Batch Folder, UUID Folder, Path Depth`.
pub fn write_inventory_snapshot<W: Write>(out: W, inventory: &Inventory) -> Result<usize, Error> {
    let mut writer = start(out, &SNAPSHOT_HEADER)?;
    let mut rows = 0;
    for occurrence in inventory.occurrences() {
        writer.serialize(SnapshotRow {
            full_key: &occurrence.raw_key,
            filename: occurrence.raw_filename(),
            batch: occurrence.batch_label(),
            uuid_folder: &occurrence.uuid_folder,
            path_depth: occurrence.path_depth,
        })?;
        rows += 1;
    }
    finish(writer, rows)
}

/// One row per duplicate group. Batches are joined with `, `, paths with `; `.
pub fn write_duplicate_report<W: Write>(out: W, groups: &[DuplicateGroup<'_>]) -> Result<usize, Error> {
    let mut writer = start(out, &DUPLICATE_HEADER)?;
    for group in groups {
        let uuid = group
            .occurrences
            .first()
            .map(|o| o.uuid_folder.as_str())
            .unwrap_or(group.identity.uuid());
        let full_paths: Vec<&str> = group.occurrences.iter().map(|o| o.raw_key.as_str()).collect();
        writer.serialize(DuplicateRow {
            uuid,
            filename: group.identity.filename(),
            occurrence_count: group.occurrence_count(),
            batches: group.batches().join(", "),
            full_paths: full_paths.join("; "),
        })?;
    }
    finish(writer, groups.len())
}

/// File count per batch/UUID folder pair, in inventory order. Spellings of
/// the same UUID share a row under the first spelling seen.
pub fn write_uuid_folder_counts<W: Write>(out: W, inventory: &Inventory) -> Result<usize, Error> {
    let mut index: AHashMap<(&str, &str), usize> = AHashMap::new();
    let mut rows: Vec<UuidFolderRow<'_>> = Vec::new();
    for occurrence in inventory.occurrences() {
        let key = (occurrence.batch_label(), occurrence.identity.uuid());
        match index.get(&key) {
            Some(&pos) => rows[pos].file_count += 1,
            None => {
                index.insert(key, rows.len());
                rows.push(UuidFolderRow {
                    batch: key.0,
                    uuid: &occurrence.uuid_folder,
                    file_count: 1,
                });
            }
        }
    }

    let mut writer = start(out, &UUID_FOLDER_HEADER)?;
    for row in &rows {
        writer.serialize(row)?;
    }
    finish(writer, rows.len())
}

/// Per-batch totals, sorted by batch name.
pub fn write_batch_summary<W: Write>(out: W, batch_stats: &BatchStatsMap) -> Result<usize, Error> {
    let mut batches: Vec<_> = batch_stats.iter().collect();
    batches.sort_by(|a, b| a.0.cmp(b.0));

    let mut writer = start(out, &BATCH_SUMMARY_HEADER)?;
    for (batch, stats) in &batches {
        writer.serialize(BatchSummaryRow {
            batch,
            total_files: stats.total_files,
            uuid_folders: stats.uuid_folders.len(),
            unique_files: stats.unique_files.len(),
        })?;
    }
    finish(writer, batches.len())
}

pub fn write_run_stats<W: Write>(out: W, metrics: &[(&str, String)]) -> Result<usize, Error> {
    let mut writer = start(out, &RUN_STATS_HEADER)?;
    for (metric, value) in metrics {
        writer.serialize(MetricRow { metric, value })?;
    }
    finish(writer, metrics.len())
}

/// Removal candidates with the batch that keeps the surviving copy, for review.
pub fn write_removal_detailed<W: Write>(out: W, removals: &[RemovalCandidate<'_>]) -> Result<usize, Error> {
    let mut writer = start(out, &REMOVAL_DETAILED_HEADER)?;
    for removal in removals {
        writer.serialize(RemovalRow {
            full_key: &removal.occurrence.raw_key,
            identity: removal.identity.to_string(),
            batch: removal.batch().unwrap_or(""),
            kept_in_batch: removal.kept_in_batch.unwrap_or(""),
        })?;
    }
    finish(writer, removals.len())
}

/// Single `path` column, usable directly as bulk-delete input.
pub fn write_removal_simple<W: Write>(out: W, removals: &[RemovalCandidate<'_>]) -> Result<usize, Error> {
    let mut writer = start(out, &["path"])?;
    for removal in removals {
        writer.write_record([removal.occurrence.raw_key.as_str()])?;
    }
    finish(writer, removals.len())
}

/// Single `AssetPath` column rendered with the original UUID spelling where known.
pub fn write_asset_paths<W: Write>(
    out: W,
    identities: &[&AssetIdentity],
    sources: &[&Inventory],
) -> Result<usize, Error> {
    let mut writer = start(out, &["AssetPath"])?;
    for identity in identities {
        writer.write_record([asset_path(identity, sources)])?;
    }
    finish(writer, identities.len())
}

/// Timestamped report files sharing one prefix: `{dir}/{prefix}_{stamp}_{kind}.csv`.
pub struct ReportSet {
    dir: PathBuf,
    prefix: String,
    stamp: String,
    written: Vec<PathBuf>,
}

impl ReportSet {
    pub fn new(dir: &Path, prefix: &str) -> Result<Self, Error> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        Self::with_stamp(dir, prefix, &stamp)
    }

    pub fn with_stamp(dir: &Path, prefix: &str, stamp: &str) -> Result<Self, Error> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
            stamp: stamp.to_string(),
            written: Vec::new(),
        })
    }

    pub fn path_for(&self, kind: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}_{}.csv", self.prefix, self.stamp, kind))
    }

    /// Create (truncating) the file for `kind` and remember its path.
    pub fn create(&mut self, kind: &str) -> Result<File, Error> {
        let path = self.path_for(kind);
        debug!("Writing report {}", path.display());
        let file = File::create(&path)?;
        self.written.push(path);
        Ok(file)
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}
