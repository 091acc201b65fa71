use crate::inventory::Inventory;
use crate::model::{AssetIdentity, AssetOccurrence};
use tracing::info;

/// An identity seen under more than one distinct batch.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateGroup<'a> {
    pub identity: &'a AssetIdentity,
    pub occurrences: &'a [AssetOccurrence],
}

impl<'a> DuplicateGroup<'a> {
    pub fn occurrence_count(&self) -> usize {
        self.occurrences.len()
    }

    /// Distinct batch labels in first-seen order. A missing batch is `""`.
    pub fn batches(&self) -> Vec<&'a str> {
        let mut batches: Vec<&'a str> = Vec::new();
        for occurrence in self.occurrences {
            let label = occurrence.batch_label();
            if !batches.contains(&label) {
                batches.push(label);
            }
        }
        batches
    }
}

/// Identities repeated across batches, in inventory order.
///
/// Repeats confined to a single batch are not reported.
pub fn find_duplicates(inventory: &Inventory) -> Vec<DuplicateGroup<'_>> {
    let groups: Vec<DuplicateGroup<'_>> = inventory
        .iter()
        .filter(|(_, occurrences)| occurrences.len() > 1)
        .map(|(identity, occurrences)| DuplicateGroup {
            identity,
            occurrences,
        })
        .filter(|group| group.batches().len() > 1)
        .collect();

    info!(
        "Found {} UUID/filename duplicates across batches ({} identities total)",
        groups.len(),
        inventory.len()
    );
    groups
}

pub fn sorted_by_identity<'a>(mut groups: Vec<DuplicateGroup<'a>>) -> Vec<DuplicateGroup<'a>> {
    groups.sort_by(|a, b| a.identity.cmp(b.identity));
    groups
}
