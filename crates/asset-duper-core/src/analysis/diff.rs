use crate::inventory::Inventory;
use crate::model::AssetIdentity;
use tracing::info;

/// Key-set difference between two inventories. Multiplicity is ignored.
#[derive(Debug, Clone, Default)]
pub struct InventoryDiff<'a> {
    /// In the left inventory but not the right, in left order.
    pub missing: Vec<&'a AssetIdentity>,
    /// In the right inventory but not the left, in right order.
    pub extra: Vec<&'a AssetIdentity>,
}

pub fn diff<'a>(left: &'a Inventory, right: &'a Inventory) -> InventoryDiff<'a> {
    let missing: Vec<&AssetIdentity> = left
        .identities()
        .filter(|identity| !right.contains(identity))
        .collect();
    let extra: Vec<&AssetIdentity> = right
        .identities()
        .filter(|identity| !left.contains(identity))
        .collect();

    info!(
        "Found {} missing and {} extra assets ({} left, {} right)",
        missing.len(),
        extra.len(),
        left.len(),
        right.len()
    );
    InventoryDiff { missing, extra }
}

/// `uuid/filename` using the first original UUID spelling any of `sources`
/// recorded, else the normalized UUID.
pub fn asset_path(identity: &AssetIdentity, sources: &[&Inventory]) -> String {
    let uuid = sources
        .iter()
        .find_map(|inventory| inventory.original_uuid(identity.uuid()))
        .unwrap_or(identity.uuid());
    format!("{}/{}", uuid, identity.filename())
}
