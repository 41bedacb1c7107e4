/// Maps a rule file to its canonical section number.
///
/// An explicit `section` in the frontmatter wins outright. Otherwise the file
/// stem is split on `-` and progressively shorter leading joins are looked up in
/// the prefix map, so `opt-async-foo` tries `opt-async-foo`, `opt-async`, `opt`
/// and the longest configured prefix wins.
use std::collections::BTreeMap;
use std::path::Path;

/// Section number used on the read path for files no prefix matches.
pub const UNCLASSIFIED_SECTION: u32 = 0;

/// What to do with a file no prefix matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnclassifiedPolicy {
    /// Drop the file (build pipeline).
    Exclude,
    /// Keep it under [`UNCLASSIFIED_SECTION`] (read path).
    Sentinel,
}

/// Longest configured prefix of `filename`'s stem, if any.
pub fn infer_section(filename: &str, section_map: &BTreeMap<String, u32>) -> Option<u32> {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    let parts: Vec<&str> = stem.split('-').collect();
    (1..=parts.len())
        .rev()
        .find_map(|len| section_map.get(&parts[..len].join("-")).copied())
}

/// Canonical section for a file, or `None` when it is excluded by `policy`.
pub fn classify(
    filename: &str,
    explicit: Option<u32>,
    section_map: &BTreeMap<String, u32>,
    policy: UnclassifiedPolicy,
) -> Option<u32> {
    if let Some(section) = explicit {
        return Some(section);
    }
    match (infer_section(filename, section_map), policy) {
        (Some(section), _) => Some(section),
        (None, UnclassifiedPolicy::Exclude) => None,
        (None, UnclassifiedPolicy::Sentinel) => Some(UNCLASSIFIED_SECTION),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, u32)]) -> BTreeMap<String, u32> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn longest_prefix_wins() {
        let sections = map(&[("opt", 3), ("opt-async", 1)]);
        assert_eq!(infer_section("opt-async-foo.md", &sections), Some(1));
        assert_eq!(infer_section("opt-bar.md", &sections), Some(3));
        assert_eq!(infer_section("opt.md", &sections), Some(3));
        assert_eq!(infer_section("optional-thing.md", &sections), None);
    }

    #[test]
    fn multi_segment_prefix_matches_whole_stem() {
        let sections = map(&[("error-handling", 17), ("error", 2)]);
        assert_eq!(infer_section("error-handling.md", &sections), Some(17));
        assert_eq!(infer_section("error-handling-retry.md", &sections), Some(17));
        assert_eq!(infer_section("error-boundaries.md", &sections), Some(2));
    }

    #[test]
    fn explicit_section_skips_prefix_matching() {
        let sections = map(&[("ts", 4)]);
        assert_eq!(
            classify("ts-strict.md", Some(9), &sections, UnclassifiedPolicy::Exclude),
            Some(9)
        );
    }

    #[test]
    fn policies_diverge_only_on_unmatched_files() {
        let sections = map(&[("ts", 4)]);
        assert_eq!(
            classify("misc-note.md", None, &sections, UnclassifiedPolicy::Exclude),
            None
        );
        assert_eq!(
            classify("misc-note.md", None, &sections, UnclassifiedPolicy::Sentinel),
            Some(UNCLASSIFIED_SECTION)
        );
        for policy in [UnclassifiedPolicy::Exclude, UnclassifiedPolicy::Sentinel] {
            assert_eq!(classify("ts-enums.md", None, &sections, policy), Some(4));
        }
    }
}
