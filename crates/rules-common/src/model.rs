use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Impact classification of a rule or section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum Impact {
    #[serde(rename = "CRITICAL")]
    Critical,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MEDIUM-HIGH")]
    MediumHigh,
    #[default]
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "LOW-MEDIUM")]
    LowMedium,
    #[serde(rename = "LOW")]
    Low,
}

impl Impact {
    pub const ALL: [Impact; 6] = [
        Impact::Critical,
        Impact::High,
        Impact::MediumHigh,
        Impact::Medium,
        Impact::LowMedium,
        Impact::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Impact::Critical => "CRITICAL",
            Impact::High => "HIGH",
            Impact::MediumHigh => "MEDIUM-HIGH",
            Impact::Medium => "MEDIUM",
            Impact::LowMedium => "LOW-MEDIUM",
            Impact::Low => "LOW",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownImpact(pub String);

impl fmt::Display for UnknownImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown impact level: '{}'", self.0)
    }
}

impl std::error::Error for UnknownImpact {}

impl FromStr for Impact {
    type Err = UnknownImpact;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Impact::ALL
            .into_iter()
            .find(|impact| impact.as_str() == wanted)
            .ok_or_else(|| UnknownImpact(wanted.to_string()))
    }
}

/// A labeled fenced code block inside a rule (e.g. "Incorrect", "Correct").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CodeExample {
    /// Label taken from the preceding `**Label:**` line, "Example" when unlabeled
    pub label: String,
    /// Raw code between the fences, trailing blank lines trimmed
    pub code: String,
    /// Fence info string, "typescript" when empty
    pub language: String,
    /// Prose that follows the block before the next label or end of body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_text: Option<String>,
}

/// A single best-practice rule parsed from one markdown file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Rule {
    /// "<section>.<ordinal>", empty until sections are built
    pub id: String,
    pub title: String,
    /// Raw section number after classification, final number after building
    pub section: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsection: Option<u32>,
    pub impact: Impact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact_description: Option<String>,
    pub explanation: String,
    pub examples: Vec<CodeExample>,
    pub references: Vec<String>,
    pub tags: Vec<String>,
}

/// A rule together with where it came from.
#[derive(Debug, Clone)]
pub struct RuleFile {
    /// Full path of the source file
    pub path: PathBuf,
    /// File name, e.g. "opt-async-parallel.md"
    pub filename: String,
    /// Directory under the rules root the file lives in, e.g. "angular"
    pub category: String,
    /// Raw (canonical) section number, 0 for unclassified on the read path
    pub section: u32,
    pub rule: Rule,
    /// File content with line endings normalized to `\n`
    pub raw_content: String,
}

impl RuleFile {
    /// File name without the `.md` extension.
    pub fn stem(&self) -> &str {
        self.filename
            .strip_suffix(".md")
            .unwrap_or(self.filename.as_str())
    }
}

/// A numbered group of rules as it appears in a rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Final sequential number (1-based, gap-free)
    pub number: u32,
    pub title: String,
    pub impact: Impact,
    pub impact_description: Option<String>,
    pub introduction: Option<String>,
    pub rules: Vec<Rule>,
}

/// Everything the document assembler needs to render a core skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelinesDocument {
    pub version: String,
    pub organization: String,
    /// Human-readable date, injected by the caller
    pub date: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub sections: Vec<Section>,
}

/// Category of a formatting violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    LineCount,
    CodeBlocks,
    CodeTooLong,
    MissingField,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationErrorKind::LineCount => "LINE_COUNT",
            ValidationErrorKind::CodeBlocks => "CODE_BLOCKS",
            ValidationErrorKind::CodeTooLong => "CODE_TOO_LONG",
            ValidationErrorKind::MissingField => "MISSING_FIELD",
        };
        f.write_str(name)
    }
}

/// A single formatting violation found in a rule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    pub file: String,
    #[serde(rename = "type")]
    pub kind: ValidationErrorKind,
    pub message: String,
}
