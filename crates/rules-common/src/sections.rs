/// Groups rules into numbered sections for rendering.
///
/// Sections are numbered 1..K over the raw section numbers that still have
/// rules, in ascending raw order. Metadata is looked up by the raw number, so a
/// section keeps its title and impact no matter where it lands in the output.
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::model::{Impact, Rule, Section};
use crate::taxonomy::Taxonomy;

/// Build renumbered sections from `(raw section, rule)` pairs.
///
/// Each rule's `id` and `section` are rewritten to its final coordinates.
pub fn build_sections(rules: Vec<(u32, Rule)>, taxonomy: &Taxonomy) -> Vec<Section> {
    let mut grouped: BTreeMap<u32, Vec<Rule>> = BTreeMap::new();
    for (raw, rule) in rules {
        grouped.entry(raw).or_default().push(rule);
    }

    grouped
        .into_iter()
        .zip(1u32..)
        .map(|((raw, mut rules), number)| {
            rules.sort_by(compare_titles);
            for (idx, rule) in rules.iter_mut().enumerate() {
                rule.id = format!("{number}.{}", idx + 1);
                rule.section = number;
            }

            let meta = taxonomy.section_meta(raw);
            Section {
                number,
                title: meta
                    .map(|m| m.title.clone())
                    .unwrap_or_else(|| format!("Section {raw}")),
                impact: meta.map(|m| m.impact).unwrap_or(Impact::Medium),
                impact_description: meta.and_then(|m| m.impact_description.clone()),
                introduction: meta.and_then(|m| m.introduction.clone()),
                rules,
            }
        })
        .collect()
}

/// Total number of rules across `sections`.
pub fn rule_count(sections: &[Section]) -> usize {
    sections.iter().map(|s| s.rules.len()).sum()
}

// Titles equal ignoring case fall back to byte order, so "Alpha" sorts before
// "alpha" and the output does not depend on input order.
fn compare_titles(a: &Rule, b: &Rule) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}
