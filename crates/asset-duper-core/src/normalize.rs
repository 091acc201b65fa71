//! Canonical forms for UUIDs and filenames so the same asset compares equal
//! regardless of which listing it came from.

/// Strip hyphens and uppercase. No hex or length validation: malformed tokens
/// still produce a best-effort identity.
pub fn normalize_uuid(uuid: &str) -> Option<String> {
    if uuid.is_empty() {
        return None;
    }
    let normalized: String = uuid.chars().filter(|c| *c != '-').collect::<String>().to_uppercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Trim surrounding whitespace. Filenames are case-sensitive, so nothing else changes.
pub fn normalize_filename(filename: &str) -> Option<String> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The `UUID/filename` key used for dedup and diffing.
pub fn combo(uuid: &str, filename: &str) -> Option<String> {
    Some(format!(
        "{}/{}",
        normalize_uuid(uuid)?,
        normalize_filename(filename)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_uuid_strips_hyphens_and_uppercases() {
        assert_eq!(
            normalize_uuid("e70cc37e-aa88-4d59-831a-b9c37c662207").as_deref(),
            Some("E70CC37EAA884D59831AB9C37C662207")
        );
    }

    #[test]
    fn test_normalize_uuid_is_idempotent() {
        for raw in [
            "E70CC37E-AA88-4D59-831A-B9C37C662207",
            "e70cc37eaa884d59831ab9c37c662207",
            "not-a-uuid",
            "xyz",
        ] {
            let once = normalize_uuid(raw).unwrap();
            assert_eq!(normalize_uuid(&once).as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn test_normalize_uuid_accepts_malformed_tokens() {
        assert_eq!(normalize_uuid("12-ab").as_deref(), Some("12AB"));
        assert_eq!(normalize_uuid(""), None);
        assert_eq!(normalize_uuid("---"), None);
    }

    #[test]
    fn test_normalize_filename_keeps_case() {
        assert_eq!(normalize_filename("  IMG_01.JPG \t").as_deref(), Some("IMG_01.JPG"));
        assert_eq!(normalize_filename("   "), None);
        assert_eq!(normalize_filename(""), None);
    }

    #[test]
    fn test_combo_equal_across_spellings() {
        assert_eq!(
            combo("E70CC37E-AA88-4D59-831A-B9C37C662207", "f.jpg"),
            combo("e70cc37eaa884d59831ab9c37c662207", "f.jpg")
        );
        assert_eq!(
            combo("e70cc37eaa884d59831ab9c37c662207", " f.jpg").as_deref(),
            Some("E70CC37EAA884D59831AB9C37C662207/f.jpg")
        );
    }

    #[test]
    fn test_combo_requires_both_parts() {
        assert_eq!(combo("", "f.jpg"), None);
        assert_eq!(combo("ABCD1234", " "), None);
    }
}
