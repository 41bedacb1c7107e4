use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;
use rules_common::taxonomy::Taxonomy;

use crate::error::AppError;

/// Tags excluded when `--exclude` is not given. Rules tagged `patterns` are
/// still in beta.
pub const DEFAULT_EXCLUDE_TAGS: &str = "patterns";

/// Compile rule files into skill documents.
#[derive(Debug, Clone, Parser)]
#[command(name = "rules-build", version)]
pub struct Cli {
    /// Repository root holding `rules/`, `metadata.json` and `skills/`.
    #[arg(long, env = "RULES_ROOT", default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// JSON taxonomy replacing the built-in section tables.
    #[arg(long, env = "RULES_TAXONOMY", value_name = "FILE")]
    pub taxonomy: Option<PathBuf>,

    /// Bump the patch version and save metadata before building.
    #[arg(long)]
    pub upgrade_version: bool,

    /// Build even if rules violate the formatting limits.
    #[arg(long)]
    pub skip_validation: bool,

    /// Comma-separated tags whose rules are left out.
    #[arg(long, value_name = "TAGS", default_value = DEFAULT_EXCLUDE_TAGS)]
    pub exclude: String,

    /// Keep every rule regardless of `--exclude`.
    #[arg(long)]
    pub include_all: bool,

    /// Fail on frontmatter lines lenient parsing would skip.
    #[arg(long)]
    pub strict_frontmatter: bool,

    /// Date printed in the core document (default: today, e.g. "October 18, 2026").
    #[arg(long, value_name = "TEXT")]
    pub date: Option<String>,
}

/// Resolved build settings.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub root: PathBuf,
    pub taxonomy: Taxonomy,
    pub upgrade_version: bool,
    pub skip_validation: bool,
    pub exclude_tags: BTreeSet<String>,
    pub strict_frontmatter: bool,
    pub date: String,
}

impl BuildConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, AppError> {
        if !cli.root.is_dir() {
            return Err(AppError::Config(format!(
                "root directory not found: {}",
                cli.root.display()
            )));
        }

        let taxonomy = match &cli.taxonomy {
            Some(path) => Taxonomy::from_json_file(path)?,
            None => Taxonomy::angular(),
        };

        let exclude_tags = if cli.include_all {
            BTreeSet::new()
        } else {
            parse_tag_list(&cli.exclude)
        };

        let date = cli
            .date
            .unwrap_or_else(|| chrono::Local::now().format("%B %-d, %Y").to_string());

        Ok(Self {
            root: cli.root,
            taxonomy,
            upgrade_version: cli.upgrade_version,
            skip_validation: cli.skip_validation,
            exclude_tags,
            strict_frontmatter: cli.strict_frontmatter,
            date,
        })
    }

    /// Build settings with defaults for everything but the root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            taxonomy: Taxonomy::angular(),
            upgrade_version: false,
            skip_validation: false,
            exclude_tags: parse_tag_list(DEFAULT_EXCLUDE_TAGS),
            strict_frontmatter: false,
            date: chrono::Local::now().format("%B %-d, %Y").to_string(),
        }
    }

    pub fn rules_dir(&self) -> PathBuf {
        self.root.join("rules")
    }

    pub fn metadata_file(&self) -> PathBuf {
        self.root.join("metadata.json")
    }

    pub fn skill_output(&self, skill_name: &str) -> PathBuf {
        self.root.join("skills").join(skill_name).join("AGENTS.md")
    }
}

/// Lowercased, trimmed, non-empty tags from a comma-separated list.
pub fn parse_tag_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
