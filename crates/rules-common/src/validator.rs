/// Formatting checks for rule markdown files.
///
/// Every check runs on every call; errors are collected, never short-circuited.
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::frontmatter;
use crate::model::{ValidationError, ValidationErrorKind};

static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("valid regex"));

/// Limits a rule file must respect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationConfig {
    pub max_lines: usize,
    /// Text-only rules are allowed, hence 0 by default
    pub min_code_blocks: usize,
    pub max_code_blocks: usize,
    pub max_code_block_lines: usize,
    pub required_fields: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_lines: 50,
            min_code_blocks: 0,
            max_code_blocks: 2,
            max_code_block_lines: 10,
            required_fields: vec!["title".into(), "impact".into(), "tags".into()],
        }
    }
}

/// Check `content` (a whole rule file, frontmatter included) against `config`.
pub fn validate_rule(file: &str, content: &str, config: &ValidationConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let error = |kind, message: String| ValidationError {
        file: file.to_string(),
        kind,
        message,
    };

    let line_count = content.split('\n').count();
    if line_count > config.max_lines {
        errors.push(error(
            ValidationErrorKind::LineCount,
            format!("{line_count} lines (max {})", config.max_lines),
        ));
    }

    let blocks: Vec<&str> = CODE_BLOCK_RE.find_iter(content).map(|m| m.as_str()).collect();
    if blocks.len() < config.min_code_blocks {
        errors.push(error(
            ValidationErrorKind::CodeBlocks,
            format!("{} code blocks (min {})", blocks.len(), config.min_code_blocks),
        ));
    }
    if blocks.len() > config.max_code_blocks {
        errors.push(error(
            ValidationErrorKind::CodeBlocks,
            format!("{} code blocks (max {})", blocks.len(), config.max_code_blocks),
        ));
    }

    for (i, block) in blocks.iter().enumerate() {
        // fence lines don't count
        let block_lines = block.split('\n').count().saturating_sub(2);
        if block_lines > config.max_code_block_lines {
            errors.push(error(
                ValidationErrorKind::CodeTooLong,
                format!(
                    "Code block {} has {block_lines} lines (max {})",
                    i + 1,
                    config.max_code_block_lines
                ),
            ));
        }
    }

    let fields = frontmatter::parse(content).fields;
    for field in &config.required_fields {
        let present = fields
            .get(field)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false);
        if !present {
            errors.push(error(
                ValidationErrorKind::MissingField,
                format!("Missing required field: {field}"),
            ));
        }
    }

    errors
}

/// Render errors grouped by file, files in first-seen order.
pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    for err in errors {
        match groups.iter_mut().find(|(file, _)| *file == err.file) {
            Some((_, messages)) => messages.push(err.message.as_str()),
            None => groups.push((err.file.as_str(), vec![err.message.as_str()])),
        }
    }

    let mut lines = Vec::new();
    for (file, messages) in groups {
        lines.push(format!("\n  {file}:"));
        for message in messages {
            lines.push(format!("    - {message}"));
        }
    }
    lines.join("\n")
}
