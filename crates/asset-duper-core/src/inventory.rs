use crate::error::Error;
use crate::keys::{self, BatchStrategy};
use crate::model::{AssetIdentity, AssetOccurrence, BatchStats};
use crate::progress::ProgressReporter;
use ahash::AHashMap;
use glob::Pattern;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub type BatchStatsMap = AHashMap<String, BatchStats>;

/// Occurrences grouped by identity, in first-seen order. Repeats are kept.
#[derive(Debug, Default)]
pub struct Inventory {
    entries: Vec<(AssetIdentity, Vec<AssetOccurrence>)>,
    index: AHashMap<AssetIdentity, usize>,
    original_uuids: AHashMap<String, String>,
    occurrence_count: usize,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, occurrence: AssetOccurrence) {
        self.original_uuids
            .entry(occurrence.identity.uuid().to_string())
            .or_insert_with(|| occurrence.uuid_folder.clone());
        self.occurrence_count += 1;

        match self.index.get(&occurrence.identity) {
            Some(&pos) => self.entries[pos].1.push(occurrence),
            None => {
                self.index
                    .insert(occurrence.identity.clone(), self.entries.len());
                self.entries
                    .push((occurrence.identity.clone(), vec![occurrence]));
            }
        }
    }

    /// Number of distinct identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn occurrence_count(&self) -> usize {
        self.occurrence_count
    }

    pub fn contains(&self, identity: &AssetIdentity) -> bool {
        self.index.contains_key(identity)
    }

    pub fn get(&self, identity: &AssetIdentity) -> Option<&[AssetOccurrence]> {
        self.index
            .get(identity)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetIdentity, &[AssetOccurrence])> {
        self.entries
            .iter()
            .map(|(identity, occurrences)| (identity, occurrences.as_slice()))
    }

    pub fn identities(&self) -> impl Iterator<Item = &AssetIdentity> {
        self.entries.iter().map(|(identity, _)| identity)
    }

    pub fn occurrences(&self) -> impl Iterator<Item = &AssetOccurrence> {
        self.entries.iter().flat_map(|(_, occurrences)| occurrences.iter())
    }

    /// First spelling seen for a normalized UUID, e.g. with its hyphens intact.
    pub fn original_uuid(&self, normalized: &str) -> Option<&str> {
        self.original_uuids.get(normalized).map(String::as_str)
    }
}

/// Parse one raw key into an occurrence, or `None` when no identity can be derived.
pub fn occurrence_from_key(raw: &str, strategy: &BatchStrategy) -> Option<AssetOccurrence> {
    let parsed = keys::parse_key(raw, strategy);
    let identity = parsed.identity()?;
    Some(AssetOccurrence {
        identity,
        raw_key: raw.to_string(),
        batch: parsed.batch,
        uuid_folder: parsed.uuid.unwrap_or_default(),
        path_depth: keys::path_depth(raw),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildCounters {
    pub records_seen: usize,
    pub indexed: usize,
    /// Records that yielded no identity.
    pub skipped: usize,
    /// Records dropped by an ignore pattern.
    pub ignored: usize,
}

/// Why the build loop stopped.
#[derive(Debug)]
pub enum Termination {
    Exhausted,
    Cancelled,
    Failed(Error),
}

impl Termination {
    pub fn label(&self) -> &'static str {
        match self {
            Termination::Exhausted => "complete",
            Termination::Cancelled => "cancelled",
            Termination::Failed(_) => "failed",
        }
    }
}

/// Everything accumulated by one build pass, complete or not.
#[derive(Debug)]
pub struct InventoryBuild {
    pub inventory: Inventory,
    pub batch_stats: BatchStatsMap,
    pub counters: BuildCounters,
    pub termination: Termination,
}

impl InventoryBuild {
    pub fn is_partial(&self) -> bool {
        !matches!(self.termination, Termination::Exhausted)
    }

    pub fn failure(&self) -> Option<&Error> {
        match &self.termination {
            Termination::Failed(err) => Some(err),
            _ => None,
        }
    }
}

pub struct InventoryBuilder {
    strategy: BatchStrategy,
    ignore_patterns: Vec<Pattern>,
    cancel_token: Arc<AtomicBool>,
    progress_interval: usize,
}

impl InventoryBuilder {
    pub fn new(strategy: BatchStrategy) -> Self {
        Self {
            strategy,
            ignore_patterns: Vec::new(),
            cancel_token: Arc::new(AtomicBool::new(false)),
            progress_interval: 1000,
        }
    }

    /// Invalid globs are logged and dropped.
    pub fn with_ignore_patterns(mut self, globs: &[String]) -> Self {
        self.ignore_patterns = globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        self
    }

    pub fn with_cancel_token(mut self, cancel_token: Arc<AtomicBool>) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_token)
    }

    fn is_ignored(&self, raw: &str) -> bool {
        self.ignore_patterns.iter().any(|pattern| pattern.matches(raw))
    }

    /// Consume `records` one at a time into an inventory.
    ///
    /// The cancel token is polled before each record is pulled, so a cancelled
    /// build never asks the source for another page. A source error ends the
    /// pass as `Termination::Failed`; in every case the returned build holds
    /// exactly the occurrences derived from the records consumed so far.
    pub fn build<I>(&self, records: I, reporter: &dyn ProgressReporter) -> InventoryBuild
    where
        I: IntoIterator<Item = Result<String, Error>>,
    {
        let start = Instant::now();
        let mut records = records.into_iter();
        let mut inventory = Inventory::new();
        let mut batch_stats = BatchStatsMap::new();
        let mut counters = BuildCounters::default();

        let termination = loop {
            if self.cancel_token.load(Ordering::SeqCst) {
                warn!(
                    "Build cancelled after {} records, keeping partial inventory",
                    counters.records_seen
                );
                break Termination::Cancelled;
            }

            let raw = match records.next() {
                None => break Termination::Exhausted,
                Some(Err(err)) => {
                    error!(
                        "Listing failed after {} records: {}",
                        counters.records_seen, err
                    );
                    break Termination::Failed(err);
                }
                Some(Ok(raw)) => raw,
            };

            counters.records_seen += 1;
            if self.progress_interval > 0 && counters.records_seen % self.progress_interval == 0 {
                debug!(
                    "Processed {} records in {:.2}s",
                    counters.records_seen,
                    start.elapsed().as_secs_f64()
                );
                reporter.on_build_progress(counters.records_seen, &raw);
            }

            if self.is_ignored(&raw) {
                counters.ignored += 1;
                continue;
            }

            match occurrence_from_key(&raw, &self.strategy) {
                Some(occurrence) => {
                    if let Some(batch) = &occurrence.batch {
                        let order = batch_stats.len();
                        batch_stats
                            .entry(batch.clone())
                            .or_insert_with(|| BatchStats::first_seen_at(order))
                            .record(&occurrence);
                    }
                    inventory.insert(occurrence);
                    counters.indexed += 1;
                }
                None => {
                    counters.skipped += 1;
                    if counters.skipped <= 5 {
                        debug!("Could not parse record {}: '{}'", counters.records_seen, raw);
                    }
                }
            }
        };

        info!(
            "Inventory build {}: {} records, {} indexed, {} skipped, {} ignored, {} identities, {} batches",
            termination.label(),
            counters.records_seen,
            counters.indexed,
            counters.skipped,
            counters.ignored,
            inventory.len(),
            batch_stats.len(),
        );

        InventoryBuild {
            inventory,
            batch_stats,
            counters,
            termination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;

    const UUID_A: &str = "E70CC37E-AA88-4D59-831A-B9C37C662207";
    const UUID_B: &str = "00005048-8BA2-45A2-A9525155916759FB";

    fn ok_records(keys: &[&str]) -> Vec<Result<String, Error>> {
        keys.iter().map(|k| Ok(k.to_string())).collect()
    }

    fn build(keys: &[&str]) -> InventoryBuild {
        InventoryBuilder::new(BatchStrategy::default()).build(ok_records(keys), &SilentReporter)
    }

    #[test]
    fn test_build_keeps_every_occurrence() {
        let a1 = format!("Batch_1/{}/f.jpg", UUID_A);
        let a2 = format!("Batch_2/{}/f.jpg", UUID_A.to_lowercase());
        let b = format!("Batch_1/{}/g.jpg", UUID_B);
        let result = build(&[&a1, &a2, &b]);

        assert!(matches!(result.termination, Termination::Exhausted));
        assert_eq!(result.inventory.len(), 2);
        assert_eq!(result.inventory.occurrence_count(), 3);

        let identity = AssetIdentity::new(UUID_A, "f.jpg").unwrap();
        let occurrences = result.inventory.get(&identity).unwrap();
        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences[0].raw_key, a1);
        assert_eq!(occurrences[1].raw_key, a2);
        assert!(occurrences.iter().all(|o| o.identity == identity));
    }

    #[test]
    fn test_build_counts_skipped_and_tallies_batches() {
        let a = format!("Batch_1/{}/f.jpg", UUID_A);
        let b = format!("Batch_1/{}/g.jpg", UUID_A);
        let folder = format!("Batch_1/{}/", UUID_B);
        let result = build(&[&a, &b, &folder, "Batch_1/readme.txt", ""]);

        assert_eq!(result.counters.records_seen, 5);
        assert_eq!(result.counters.indexed, 2);
        assert_eq!(result.counters.skipped, 3);

        let stats = &result.batch_stats["Batch_1"];
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.uuid_folders.len(), 1);
        assert_eq!(stats.unique_files.len(), 2);
    }

    #[test]
    fn test_original_uuid_spelling_is_first_seen() {
        let a = format!("Batch_1/{}/f.jpg", UUID_A);
        let b = format!("Batch_2/{}/f.jpg", UUID_A.replace('-', ""));
        let result = build(&[&a, &b]);
        assert_eq!(
            result.inventory.original_uuid("E70CC37EAA884D59831AB9C37C662207"),
            Some(UUID_A)
        );
    }

    #[test]
    fn test_ignore_patterns_drop_records() {
        let a = format!("Batch_1/{}/f.jpg", UUID_A);
        let b = format!("Batch_1/{}/.DS_Store", UUID_A);
        let result = InventoryBuilder::new(BatchStrategy::default())
            .with_ignore_patterns(&["*.DS_Store".to_string(), "[".to_string()])
            .build(ok_records(&[&a, &b]), &SilentReporter);
        assert_eq!(result.counters.ignored, 1);
        assert_eq!(result.inventory.occurrence_count(), 1);
    }

    #[test]
    fn test_source_failure_keeps_partial_inventory() {
        let a = format!("Batch_1/{}/f.jpg", UUID_A);
        let records = vec![
            Ok(a.clone()),
            Err(Error::Listing("page 2 request failed".to_string())),
            Ok(format!("Batch_1/{}/g.jpg", UUID_A)),
        ];
        let result = InventoryBuilder::new(BatchStrategy::default()).build(records, &SilentReporter);

        assert!(result.is_partial());
        assert!(matches!(result.failure(), Some(Error::Listing(_))));
        assert_eq!(result.counters.records_seen, 1);
        assert_eq!(result.inventory.occurrence_count(), 1);
    }

    #[test]
    fn test_cancel_before_start_consumes_nothing() {
        let builder = InventoryBuilder::new(BatchStrategy::default());
        builder.cancel_token().store(true, Ordering::SeqCst);
        let a = format!("Batch_1/{}/f.jpg", UUID_A);
        let result = builder.build(ok_records(&[&a]), &SilentReporter);
        assert!(matches!(result.termination, Termination::Cancelled));
        assert_eq!(result.counters.records_seen, 0);
        assert!(result.inventory.is_empty());
    }
}
