use crate::normalize::{normalize_filename, normalize_uuid};
use ahash::AHashSet;
use std::fmt;

/// Normalized `(uuid, filename)` pair. Both fields are non-empty by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetIdentity {
    uuid: String,
    filename: String,
}

impl AssetIdentity {
    pub fn new(uuid: &str, filename: &str) -> Option<Self> {
        Some(Self {
            uuid: normalize_uuid(uuid)?,
            filename: normalize_filename(filename)?,
        })
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl fmt::Display for AssetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.uuid, self.filename)
    }
}

/// One sighting of an asset in a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetOccurrence {
    pub identity: AssetIdentity,
    pub raw_key: String,
    pub batch: Option<String>,
    /// UUID segment as it was spelled in `raw_key`.
    pub uuid_folder: String,
    pub path_depth: usize,
}

impl AssetOccurrence {
    pub fn batch_label(&self) -> &str {
        self.batch.as_deref().unwrap_or("")
    }

    /// Filename segment of `raw_key` before normalization.
    pub fn raw_filename(&self) -> &str {
        crate::keys::last_segment(&self.raw_key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    /// Position of the batch in first-seen order across the listing.
    pub first_seen: usize,
    pub total_files: usize,
    pub uuid_folders: AHashSet<String>,
    pub unique_files: AHashSet<String>,
}

impl BatchStats {
    pub fn first_seen_at(order: usize) -> Self {
        Self {
            first_seen: order,
            ..Self::default()
        }
    }

    pub fn record(&mut self, occurrence: &AssetOccurrence) {
        self.total_files += 1;
        self.uuid_folders.insert(occurrence.identity.uuid().to_string());
        self.unique_files.insert(occurrence.identity.filename().to_string());
    }
}
