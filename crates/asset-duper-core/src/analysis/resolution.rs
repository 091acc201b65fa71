use super::duplicates::DuplicateGroup;
use crate::inventory::BatchStatsMap;
use crate::model::{AssetIdentity, AssetOccurrence, BatchStats};
use ahash::AHashMap;
use tracing::{debug, info};

/// Rank for batches absent from the stats: below every known batch.
const UNKNOWN_BATCH_RANK: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
pub struct KeptOccurrence<'a> {
    pub identity: &'a AssetIdentity,
    pub occurrence: &'a AssetOccurrence,
}

/// A copy proposed for removal, with the batch that holds the kept copy.
#[derive(Debug, Clone, Copy)]
pub struct RemovalCandidate<'a> {
    pub identity: &'a AssetIdentity,
    pub occurrence: &'a AssetOccurrence,
    pub kept_in_batch: Option<&'a str>,
}

impl<'a> RemovalCandidate<'a> {
    pub fn batch(&self) -> Option<&'a str> {
        self.occurrence.batch.as_deref()
    }
}

/// Advisory keep/remove plan. Nothing is deleted from here.
#[derive(Debug, Clone, Default)]
pub struct Resolution<'a> {
    pub keep: Vec<KeptOccurrence<'a>>,
    pub remove: Vec<RemovalCandidate<'a>>,
}

impl<'a> Resolution<'a> {
    pub fn kept_for(&self, identity: &AssetIdentity) -> Option<&'a AssetOccurrence> {
        self.keep
            .iter()
            .find(|kept| kept.identity == identity)
            .map(|kept| kept.occurrence)
    }
}

/// Rank batches by file count, largest first (rank 0). Equal counts keep the
/// order in which the batches were first seen.
pub fn batch_priorities(batch_stats: &BatchStatsMap) -> AHashMap<&str, usize> {
    let mut batches: Vec<(&str, &BatchStats)> = batch_stats
        .iter()
        .map(|(batch, stats)| (batch.as_str(), stats))
        .collect();
    batches.sort_by(|a, b| {
        b.1.total_files
            .cmp(&a.1.total_files)
            .then_with(|| a.1.first_seen.cmp(&b.1.first_seen))
    });

    for (rank, (batch, stats)) in batches.iter().enumerate() {
        debug!("Batch priority {}: {} ({} files)", rank, batch, stats.total_files);
    }

    batches
        .into_iter()
        .enumerate()
        .map(|(rank, (batch, _))| (batch, rank))
        .collect()
}

/// For each duplicate group keep the copy in the highest-priority batch and
/// propose the rest for removal. Ties keep inventory order.
pub fn resolve<'a>(groups: &[DuplicateGroup<'a>], batch_stats: &BatchStatsMap) -> Resolution<'a> {
    let priorities = batch_priorities(batch_stats);
    let rank_of = |occurrence: &AssetOccurrence| {
        occurrence
            .batch
            .as_deref()
            .and_then(|batch| priorities.get(batch).copied())
            .unwrap_or(UNKNOWN_BATCH_RANK)
    };

    let mut resolution = Resolution::default();
    for group in groups {
        let mut ranked: Vec<&'a AssetOccurrence> = group.occurrences.iter().collect();
        ranked.sort_by_key(|occurrence| rank_of(*occurrence));

        let Some((&kept, rest)) = ranked.split_first() else {
            continue;
        };
        resolution.keep.push(KeptOccurrence {
            identity: group.identity,
            occurrence: kept,
        });
        for &occurrence in rest {
            resolution.remove.push(RemovalCandidate {
                identity: group.identity,
                occurrence,
                kept_in_batch: kept.batch.as_deref(),
            });
        }
    }

    info!(
        "Identified {} files for potential removal across {} duplicate groups",
        resolution.remove.len(),
        resolution.keep.len()
    );
    resolution
}
