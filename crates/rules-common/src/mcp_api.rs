use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::candidate::GeneratedRule;
use crate::model::{Impact, ValidationError};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchRulesParams {
    /// Keywords describing what you're looking for.
    pub query: String,
    /// Maximum number of results to return (default: 10, max: 50).
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetRuleParams {
    /// Rule filename or stem such as "signal-computed" or "ts-enums.md".
    pub rule: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListSectionParams {
    /// Canonical section number; 0 lists unclassified rules.
    pub section: u32,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ValidateRuleParams {
    /// Full markdown of a rule file, frontmatter included.
    pub content: String,
    /// Filename used in reported errors (default: "candidate.md").
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RenderCandidateParams {
    pub rule: GeneratedRule,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RuleSummary {
    pub filename: String,
    pub title: String,
    pub category: String,
    pub section: u32,
    pub impact: Impact,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RuleSearchResult {
    pub filename: String,
    pub title: String,
    pub section: u32,
    pub impact: Impact,
    pub score: f32,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchRulesResponse {
    pub results: Vec<RuleSearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RuleDetailResponse {
    pub filename: String,
    pub path: String,
    pub category: String,
    pub section: u32,
    pub section_title: String,
    pub title: String,
    pub impact: Impact,
    pub impact_description: Option<String>,
    pub tags: Vec<String>,
    pub references: Vec<String>,
    pub raw_markdown: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionInfo {
    pub number: u32,
    pub title: String,
    pub impact: Impact,
    pub impact_description: Option<String>,
    pub rule_count: usize,
    /// Name of the optional skill bundle this section belongs to, if any.
    pub optional_skill: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionsResponse {
    pub sections: Vec<SectionInfo>,
    pub total_rules: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SectionListResponse {
    pub section: SectionInfo,
    pub rules: Vec<RuleSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ValidateRuleResponse {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    /// Frontmatter problems that lenient parsing tolerates.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderCandidateResponse {
    /// Relative path the rule would be written to, e.g. "angular/signal-foo.md".
    pub path: String,
    pub markdown: String,
    pub shape_problems: Vec<String>,
    pub validation_errors: Vec<ValidationError>,
    pub inferred_section: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReloadRulesResponse {
    pub updated: bool,
    pub fingerprint: String,
    pub rule_count: usize,
}
