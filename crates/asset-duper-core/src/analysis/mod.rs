pub mod diff;
pub mod duplicates;
pub mod resolution;

pub use diff::{asset_path, diff, InventoryDiff};
pub use duplicates::{find_duplicates, sorted_by_identity, DuplicateGroup};
pub use resolution::{batch_priorities, resolve, KeptOccurrence, RemovalCandidate, Resolution};
