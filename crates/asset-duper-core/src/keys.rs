use crate::model::AssetIdentity;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

const SEPARATORS: [char; 2] = ['/', '\\'];

lazy_static! {
    static ref UUID_SEGMENT: Regex = Regex::new(
        r"(?i)^[0-9a-f]{8}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{4}-?[0-9a-f]{12}$"
    )
    .expect("UUID segment pattern is valid");
}

/// Whether the listing was scoped to one top-level prefix or covers the whole bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    #[default]
    Prefixed,
    BucketWide,
}

/// One way of inferring the batch folder from a key's folder segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchRule {
    /// First folder whose name contains "batch" (case-insensitive).
    NamedBatch,
    /// Folder directly above the UUID folder.
    UuidParent,
    /// First folder, or the second one when the first is an "assets" root.
    TopLevel,
}

/// Ordered list of batch rules; the first rule that yields a folder wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchStrategy {
    rules: Vec<BatchRule>,
}

impl BatchStrategy {
    pub fn new(rules: Vec<BatchRule>) -> Self {
        Self { rules }
    }

    pub fn for_mode(mode: ScanMode) -> Self {
        match mode {
            ScanMode::Prefixed => Self::new(vec![BatchRule::NamedBatch, BatchRule::UuidParent]),
            ScanMode::BucketWide => Self::new(vec![
                BatchRule::NamedBatch,
                BatchRule::UuidParent,
                BatchRule::TopLevel,
            ]),
        }
    }

    pub fn rules(&self) -> &[BatchRule] {
        &self.rules
    }

    fn resolve<'a>(&self, folders: &[&'a str], uuid_pos: Option<usize>) -> Option<&'a str> {
        self.rules
            .iter()
            .find_map(|rule| apply_rule(*rule, folders, uuid_pos))
    }
}

impl Default for BatchStrategy {
    fn default() -> Self {
        Self::for_mode(ScanMode::default())
    }
}

fn apply_rule<'a>(rule: BatchRule, folders: &[&'a str], uuid_pos: Option<usize>) -> Option<&'a str> {
    match rule {
        BatchRule::NamedBatch => folders
            .iter()
            .find(|segment| segment.to_lowercase().contains("batch"))
            .copied(),
        BatchRule::UuidParent => uuid_pos
            .filter(|&pos| pos > 0)
            .map(|pos| folders[pos - 1]),
        BatchRule::TopLevel => {
            let first = *folders.first()?;
            if first.to_lowercase().contains("assets") && folders.len() >= 2 {
                Some(folders[1])
            } else {
                Some(first)
            }
        }
    }
}

/// Batch, UUID folder and filename extracted from one raw key or path.
/// Any part that could not be classified is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedKey {
    pub batch: Option<String>,
    pub uuid: Option<String>,
    pub filename: Option<String>,
}

impl ParsedKey {
    pub fn identity(&self) -> Option<AssetIdentity> {
        AssetIdentity::new(self.uuid.as_deref()?, self.filename.as_deref()?)
    }
}

pub fn is_uuid_like(segment: &str) -> bool {
    UUID_SEGMENT.is_match(segment)
}

/// Number of separator-delimited segments, empty ones included.
pub fn path_depth(raw: &str) -> usize {
    raw.split(SEPARATORS).count()
}

/// Last non-empty segment of a raw key or path, exactly as written.
pub fn last_segment(raw: &str) -> &str {
    raw.rsplit(SEPARATORS)
        .find(|segment| !segment.is_empty())
        .unwrap_or("")
}

/// Split a raw object key or filesystem path into batch, UUID folder and filename.
///
/// Both `/` and `\` separate segments. A key ending in a separator is a folder
/// marker and has no filename. The UUID folder is the first folder segment shaped
/// like a UUID (hyphens optional); failing that, a `<hex-id>_<name>` filename is
/// split into its id and `_<name>`. Never fails: parts it cannot classify stay `None`.
pub fn parse_key(raw: &str, strategy: &BatchStrategy) -> ParsedKey {
    let is_folder = raw.ends_with(SEPARATORS);
    let segments: Vec<&str> = raw
        .split(SEPARATORS)
        .filter(|segment| !segment.is_empty())
        .collect();

    let (folders, last) = match segments.split_last() {
        Some((last, rest)) if !is_folder => (rest, Some(*last)),
        _ => (segments.as_slice(), None),
    };

    let uuid_pos = folders.iter().position(|segment| is_uuid_like(segment));
    let mut uuid = uuid_pos.map(|pos| folders[pos].to_string());
    let mut filename = last.map(str::to_string);

    if uuid.is_none() {
        if let Some((id, name)) = last.and_then(split_hex_prefixed) {
            uuid = Some(id.to_string());
            filename = Some(name.to_string());
        }
    }

    ParsedKey {
        batch: strategy.resolve(folders, uuid_pos).map(str::to_string),
        uuid,
        filename,
    }
}

/// `ABCDEF0123_photo.jpg` -> (`ABCDEF0123`, `_photo.jpg`).
fn split_hex_prefixed(name: &str) -> Option<(&str, &str)> {
    let pos = name.find('_')?;
    let (head, tail) = name.split_at(pos);
    if tail.len() < 2 {
        return None;
    }
    let leading_hex = head.chars().take_while(|c| c.is_ascii_hexdigit()).count();
    if leading_hex >= 8 {
        Some((head, tail))
    } else {
        None
    }
}
