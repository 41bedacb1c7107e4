/// Shape of a rule proposed by the external generation service.
///
/// A candidate renders to the same frontmatter + body template the pipeline
/// parses, so it can be validated exactly like a rule already on disk.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::Impact;

/// Sections a candidate may target.
pub const CANDIDATE_SECTIONS: std::ops::RangeInclusive<u32> = 1..=19;
const MIN_TAGS: usize = 2;
const MAX_TAGS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFrontmatter {
    /// Verb + subject, e.g. "Use Set/Map for O(1) Lookups"
    pub title: String,
    pub impact: Impact,
    /// Brief metric, e.g. "O(n) to O(1)"
    pub impact_description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRule {
    /// Kebab-case filename with the section prefix, e.g. "signal-query-result.md"
    pub filename: String,
    /// Subdirectory under the rules root, e.g. "angular"
    pub category: String,
    pub section: u32,
    pub frontmatter: CandidateFrontmatter,
    /// Markdown body: heading, one-sentence description, labeled code blocks
    pub body: String,
    /// Why the generator chose this category, impact and filename
    pub reasoning: String,
}

impl GeneratedRule {
    /// Render the candidate as a rule file.
    pub fn to_markdown(&self) -> String {
        let fm = &self.frontmatter;
        format!(
            "---\ntitle: {}\nimpact: {}\nimpactDescription: {}\ntags: {}\n---\n\n{}\n",
            fm.title,
            fm.impact,
            fm.impact_description,
            fm.tags.join(", "),
            self.body
        )
    }

    /// Contract violations, empty when the candidate is well-formed.
    pub fn check_shape(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if !self.filename.ends_with(".md") || self.filename.starts_with('_') {
            problems.push(format!(
                "filename '{}' must end in .md and not start with '_'",
                self.filename
            ));
        }
        if self.filename.contains(&['/', '\\'][..]) {
            problems.push(format!("filename '{}' must not contain a path", self.filename));
        }
        if !CANDIDATE_SECTIONS.contains(&self.section) {
            problems.push(format!(
                "section {} is outside {}..={}",
                self.section,
                CANDIDATE_SECTIONS.start(),
                CANDIDATE_SECTIONS.end()
            ));
        }
        if self.frontmatter.title.trim().is_empty() {
            problems.push("title must not be empty".to_string());
        }
        let tags = self.frontmatter.tags.len();
        if !(MIN_TAGS..=MAX_TAGS).contains(&tags) {
            problems.push(format!("{tags} tags (expected {MIN_TAGS}-{MAX_TAGS})"));
        }
        if self.frontmatter.tags.iter().any(|t| t.contains(',')) {
            problems.push("tags must not contain ','".to_string());
        }
        if self.body.trim().is_empty() {
            problems.push("body must not be empty".to_string());
        }

        problems
    }
}
