/// Discovery and parsing of rule files on disk.
///
/// Both the build pipeline and the read path load rules through here; they
/// differ only in the [`UnclassifiedPolicy`] they pass.
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::body;
use crate::classify::{self, UnclassifiedPolicy};
use crate::error::RuleError;
use crate::frontmatter;
use crate::model::{Rule, RuleFile};
use crate::taxonomy::Taxonomy;

/// Directory names that hold long-form guides rather than rules.
const SKIPPED_DIRS: &[&str] = &["guides"];

/// All rule markdown files under `root`, sorted by path.
///
/// Files whose name starts with `_` are templates or section definitions and
/// are not returned.
pub fn discover_rule_files(root: &Path) -> Result<Vec<PathBuf>, RuleError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !SKIPPED_DIRS.iter().any(|skipped| name == *skipped)
    });

    for entry in walker {
        let entry = entry.map_err(|e| RuleError::Walk {
            root: root.to_path_buf(),
            message: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let is_rule = name.ends_with(".md") && !name.starts_with('_');
        if is_rule {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Parse one rule file.
///
/// Returns `None` for `_`-prefixed files and, under
/// [`UnclassifiedPolicy::Exclude`], for files whose section cannot be
/// determined (a warning is logged).
pub fn parse_rule_file(
    path: &Path,
    content: &str,
    root: &Path,
    taxonomy: &Taxonomy,
    policy: UnclassifiedPolicy,
) -> Option<RuleFile> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    if filename.starts_with('_') {
        return None;
    }

    let content = content.replace("\r\n", "\n");
    let parsed = frontmatter::parse(&content);
    let fm = parsed.frontmatter;

    let Some(section) = classify::classify(&filename, fm.section, &taxonomy.section_map, policy)
    else {
        warn!(path = %path.display(), "could not determine section, skipping");
        return None;
    };

    let body = body::parse_body(parsed.body);
    let stem = filename.strip_suffix(".md").unwrap_or(&filename).to_string();

    let rule = Rule {
        id: String::new(),
        title: fm.title.or(body.title).unwrap_or(stem),
        section,
        subsection: fm.subsection,
        impact: fm.impact.unwrap_or_default(),
        impact_description: fm.impact_description,
        explanation: body.explanation,
        examples: body.examples,
        references: body.references,
        tags: fm.tags,
    };

    Some(RuleFile {
        path: path.to_path_buf(),
        category: category_of(path, root),
        filename,
        section,
        rule,
        raw_content: content,
    })
}

/// Discover, read and parse every rule under `root`.
pub fn load_rules(
    root: &Path,
    taxonomy: &Taxonomy,
    policy: UnclassifiedPolicy,
) -> Result<Vec<RuleFile>, RuleError> {
    let paths = discover_rule_files(root)?;
    debug!(root = %root.display(), files = paths.len(), "discovered rule files");

    let mut rules = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path).map_err(|e| RuleError::io(&path, e))?;
        if let Some(rule) = parse_rule_file(&path, &content, root, taxonomy, policy) {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// SHA-256 over every loaded file's path and content, in path order.
pub fn corpus_fingerprint(rules: &[RuleFile]) -> String {
    let mut ordered: Vec<&RuleFile> = rules.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    let mut hasher = Sha256::new();
    for rule in ordered {
        hasher.update(rule.path.to_string_lossy().as_bytes());
        hasher.update(b"\0");
        hasher.update(rule.raw_content.as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())
}

/// First directory below `root` that contains `path`, or "" for top-level files.
fn category_of(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .ok()
        .and_then(|rel| rel.parent())
        .and_then(|parent| parent.components().next())
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .unwrap_or_default()
}
