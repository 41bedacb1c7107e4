/// The build pipeline: rules on disk in, skill documents out.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rules_common::classify::UnclassifiedPolicy;
use rules_common::frontmatter;
use rules_common::loader;
use rules_common::model::{GuidelinesDocument, Rule, RuleFile, ValidationError};
use rules_common::render;
use rules_common::sections::{self, build_sections};
use rules_common::validator::validate_rule;
use tracing::{debug, info, warn};

use crate::config::BuildConfig;
use crate::error::AppError;
use crate::metadata::Metadata;
use crate::output::StagedOutputs;

/// How a build ended when no I/O or configuration error occurred.
#[derive(Debug)]
pub enum BuildOutcome {
    Built(BuildReport),
    /// Rules broke the formatting limits; nothing was written.
    ValidationFailed(Vec<ValidationError>),
    /// `--strict-frontmatter` found header problems; nothing was written.
    FrontmatterRejected(Vec<String>),
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub version: String,
    pub parsed: usize,
    pub excluded: usize,
    pub core: SkillReport,
    pub optional: Vec<SkillReport>,
    pub skipped: Vec<String>,
}

impl BuildReport {
    pub fn total_rules(&self) -> usize {
        self.core.rules + self.optional.iter().map(|s| s.rules).sum::<usize>()
    }
}

#[derive(Debug, Default, Clone)]
pub struct SkillReport {
    pub name: String,
    pub path: PathBuf,
    pub sections: usize,
    pub rules: usize,
}

pub fn run(config: &BuildConfig) -> Result<BuildOutcome, AppError> {
    let taxonomy = &config.taxonomy;
    info!(skill = %taxonomy.skill.name, root = %config.root.display(), "building");
    if !config.exclude_tags.is_empty() {
        info!(tags = %join(&config.exclude_tags), "excluding tags");
    }

    let metadata_path = config.metadata_file();
    let mut metadata = Metadata::load(&metadata_path)?;
    if config.upgrade_version {
        metadata.upgrade_version()?;
        metadata.save(&metadata_path)?;
        info!(version = %metadata.version, "version upgraded");
    }

    let rules = loader::load_rules(&config.rules_dir(), taxonomy, UnclassifiedPolicy::Exclude)?;
    let parsed = rules.len();
    info!(rules = parsed, "parsed rule files");

    let rules = filter_by_tags(rules, &config.exclude_tags);
    let excluded = parsed - rules.len();
    if !config.exclude_tags.is_empty() {
        info!(excluded, "excluded rules by tag");
    }

    let diagnostics = frontmatter_diagnostics(&rules, &config.root);
    if config.strict_frontmatter && !diagnostics.is_empty() {
        return Ok(BuildOutcome::FrontmatterRejected(diagnostics));
    }
    for diagnostic in &diagnostics {
        warn!(%diagnostic, "frontmatter");
    }

    if !config.skip_validation {
        let errors: Vec<ValidationError> = rules
            .iter()
            .flat_map(|rule| {
                validate_rule(
                    &display_path(&rule.path, &config.root),
                    &rule.raw_content,
                    &taxonomy.validation,
                )
            })
            .collect();
        if !errors.is_empty() {
            return Ok(BuildOutcome::ValidationFailed(errors));
        }
        info!(rules = rules.len(), "validated rules");
    }

    let optional_sections = taxonomy.optional_section_numbers();
    let mut outputs = StagedOutputs::new();

    let core_sections = build_sections(
        select(&rules, |section| !optional_sections.contains(&section)),
        taxonomy,
    );
    let core = SkillReport {
        name: taxonomy.skill.name.clone(),
        path: config.skill_output(&taxonomy.skill.name),
        sections: core_sections.len(),
        rules: sections::rule_count(&core_sections),
    };
    let document = GuidelinesDocument {
        version: metadata.version.clone(),
        organization: metadata.organization,
        date: config.date.clone(),
        abstract_text: metadata.abstract_text,
        sections: core_sections,
    };
    outputs.stage(&core.path, &render::render_document(&document, &taxonomy.skill))?;

    let mut optional = Vec::new();
    let mut skipped = Vec::new();
    for skill in &taxonomy.optional_skills {
        let skill_rules = select(&rules, |section| skill.sections.contains(&section));
        if skill_rules.is_empty() {
            info!(skill = %skill.name, "skipping optional skill with no rules");
            skipped.push(skill.name.clone());
            continue;
        }

        let skill_sections = build_sections(skill_rules, taxonomy);
        let report = SkillReport {
            name: skill.name.clone(),
            path: config.skill_output(&skill.name),
            sections: skill_sections.len(),
            rules: sections::rule_count(&skill_sections),
        };
        let markdown = render::render_optional_skill(&skill.name, &taxonomy.skill, &skill_sections);
        outputs.stage(&report.path, &markdown)?;
        optional.push(report);
    }

    let written = outputs.commit()?;
    debug!(files = written.len(), "committed staged outputs");

    info!(
        path = %core.path.display(),
        sections = core.sections,
        rules = core.rules,
        "generated core skill"
    );
    for skill in &optional {
        info!(
            path = %skill.path.display(),
            sections = skill.sections,
            rules = skill.rules,
            "generated optional skill"
        );
    }

    let report = BuildReport {
        version: metadata.version,
        parsed,
        excluded,
        core,
        optional,
        skipped,
    };
    info!(total_rules = report.total_rules(), "build complete");
    Ok(BuildOutcome::Built(report))
}

/// Drop every rule carrying one of `exclude` (tags are already lowercased).
pub fn filter_by_tags(rules: Vec<RuleFile>, exclude: &BTreeSet<String>) -> Vec<RuleFile> {
    if exclude.is_empty() {
        return rules;
    }
    rules
        .into_iter()
        .filter(|rule| !rule.rule.tags.iter().any(|tag| exclude.contains(tag)))
        .collect()
}

fn select(rules: &[RuleFile], keep: impl Fn(u32) -> bool) -> Vec<(u32, Rule)> {
    rules
        .iter()
        .filter(|r| keep(r.section))
        .map(|r| (r.section, r.rule.clone()))
        .collect()
}

fn frontmatter_diagnostics(rules: &[RuleFile], root: &Path) -> Vec<String> {
    rules
        .iter()
        .flat_map(|rule| {
            let (_, diagnostics) = frontmatter::parse_strict(&rule.raw_content);
            let file = display_path(&rule.path, root);
            diagnostics
                .into_iter()
                .map(move |d| format!("{file}: {d}"))
        })
        .collect()
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn join(tags: &BTreeSet<String>) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_common::model::Impact;

    fn rule_file(name: &str, section: u32, tags: &[&str]) -> RuleFile {
        RuleFile {
            path: PathBuf::from(format!("/r/rules/angular/{name}")),
            filename: name.to_string(),
            category: "angular".to_string(),
            section,
            rule: Rule {
                id: String::new(),
                title: name.to_string(),
                section,
                subsection: None,
                impact: Impact::Medium,
                impact_description: None,
                explanation: String::new(),
                examples: vec![],
                references: vec![],
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
            raw_content: String::new(),
        }
    }

    #[test]
    fn tag_filter_drops_any_match() {
        let rules = vec![
            rule_file("a.md", 1, &["signals", "patterns"]),
            rule_file("b.md", 1, &["signals"]),
            rule_file("c.md", 1, &[]),
        ];
        let exclude = BTreeSet::from(["patterns".to_string()]);
        let kept: Vec<String> = filter_by_tags(rules.clone(), &exclude)
            .into_iter()
            .map(|r| r.filename)
            .collect();
        assert_eq!(kept, vec!["b.md", "c.md"]);
        assert_eq!(filter_by_tags(rules, &BTreeSet::new()).len(), 3);
    }

    #[test]
    fn display_path_is_relative_to_root() {
        assert_eq!(
            display_path(Path::new("/r/rules/angular/a.md"), Path::new("/r")),
            "rules/angular/a.md"
        );
        assert_eq!(display_path(Path::new("/elsewhere/a.md"), Path::new("/r")), "/elsewhere/a.md");
    }
}
