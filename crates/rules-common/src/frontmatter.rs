/// Parser for the `---` delimited key/value header at the top of a rule file.
///
/// The header is a flat list of `key: value` lines, not full YAML. Parsing is
/// lenient: lines that do not fit are skipped and the parser never fails.
/// `parse_strict` runs the same parse and additionally reports what was skipped.
use std::collections::BTreeMap;
use std::fmt;

use crate::model::Impact;

const DELIMITER: &str = "---";

/// Raw header fields, keyed by the trimmed text left of the first `:`.
pub type FrontmatterFields = BTreeMap<String, String>;

/// Typed view of the header keys the pipeline understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFrontmatter {
    pub title: Option<String>,
    pub impact: Option<Impact>,
    pub impact_description: Option<String>,
    /// Comma-separated list, trimmed and lowercased
    pub tags: Vec<String>,
    /// Explicit section override; wins over filename classification
    pub section: Option<u32>,
    pub subsection: Option<u32>,
}

impl RuleFrontmatter {
    pub fn from_fields(fields: &FrontmatterFields) -> Self {
        let text = |key: &str| {
            fields
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            title: text("title"),
            impact: fields.get("impact").and_then(|v| v.parse().ok()),
            impact_description: text("impactDescription"),
            tags: fields.get("tags").map(|v| split_tags(v)).unwrap_or_default(),
            section: fields.get("section").and_then(|v| leading_number(v)),
            subsection: fields.get("subsection").and_then(|v| leading_number(v)),
        }
    }
}

/// Result of parsing a whole rule file's header.
#[derive(Debug, Clone)]
pub struct ParsedFrontmatter<'a> {
    pub fields: FrontmatterFields,
    pub frontmatter: RuleFrontmatter,
    /// Text after the closing delimiter (trimmed), or the whole input when no
    /// header was found
    pub body: &'a str,
}

/// Something lenient parsing silently skipped or coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontmatterDiagnostic {
    /// Opening `---` without a closing one; the whole file was treated as body
    Unterminated,
    MissingColon { line: usize, content: String },
    EmptyKey { line: usize },
    InvalidNumber { key: String, value: String },
    UnknownImpact { value: String },
}

impl fmt::Display for FrontmatterDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unterminated => write!(f, "frontmatter has no closing '{DELIMITER}'"),
            Self::MissingColon { line, content } => {
                write!(f, "line {line}: no ':' separator in '{content}'")
            }
            Self::EmptyKey { line } => write!(f, "line {line}: empty key"),
            Self::InvalidNumber { key, value } => {
                write!(f, "{key}: '{value}' is not a positive integer")
            }
            Self::UnknownImpact { value } => write!(f, "impact: unknown level '{value}'"),
        }
    }
}

/// Split `text` into its raw header region and body.
///
/// The header region is returned untrimmed (it starts right after the opening
/// delimiter) so callers can compute line numbers; the body is trimmed. When
/// there is no header, or it is never closed, the header is `None` and the body
/// is the original text.
pub fn split(text: &str) -> (Option<&str>, &str) {
    let Some(rest) = text.strip_prefix(DELIMITER) else {
        return (None, text);
    };
    match rest.find("\n---") {
        Some(end) => (Some(&rest[..end]), rest[end + 1 + DELIMITER.len()..].trim()),
        None => (None, text),
    }
}

/// Parse `key: value` lines of a header region.
pub fn parse_fields(header: &str) -> FrontmatterFields {
    let mut fields = FrontmatterFields::new();
    for line in header.lines() {
        if let Some((key, value)) = split_line(line) {
            fields.insert(key.to_string(), value.to_string());
        }
    }
    fields
}

/// Lenient parse of a complete rule file.
pub fn parse(text: &str) -> ParsedFrontmatter<'_> {
    let (header, body) = split(text);
    let fields = header.map(parse_fields).unwrap_or_default();
    let frontmatter = RuleFrontmatter::from_fields(&fields);
    ParsedFrontmatter {
        fields,
        frontmatter,
        body,
    }
}

/// Same result as [`parse`], plus a diagnostic for everything it skipped.
pub fn parse_strict(text: &str) -> (ParsedFrontmatter<'_>, Vec<FrontmatterDiagnostic>) {
    let parsed = parse(text);
    let mut diagnostics = Vec::new();

    let (header, _) = split(text);
    match header {
        None if text.starts_with(DELIMITER) => diagnostics.push(FrontmatterDiagnostic::Unterminated),
        None => {}
        Some(header) => {
            for (idx, line) in header.lines().enumerate() {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                // line 1 is the opening delimiter
                let line_number = idx + 1;
                match trimmed.split_once(':') {
                    None => diagnostics.push(FrontmatterDiagnostic::MissingColon {
                        line: line_number,
                        content: trimmed.to_string(),
                    }),
                    Some((key, _)) if key.trim().is_empty() => {
                        diagnostics.push(FrontmatterDiagnostic::EmptyKey { line: line_number })
                    }
                    Some(_) => {}
                }
            }
        }
    }

    for key in ["section", "subsection"] {
        if let Some(value) = parsed.fields.get(key) {
            let valid = value.parse::<u32>().map(|n| n > 0).unwrap_or(false);
            if !valid {
                diagnostics.push(FrontmatterDiagnostic::InvalidNumber {
                    key: key.to_string(),
                    value: value.clone(),
                });
            }
        }
    }

    if let Some(value) = parsed.fields.get("impact") {
        if value.parse::<Impact>().is_err() {
            diagnostics.push(FrontmatterDiagnostic::UnknownImpact {
                value: value.clone(),
            });
        }
    }

    (parsed, diagnostics)
}

fn split_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, strip_quotes(value.trim())))
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Leading decimal digits of `value`, ignoring trailing junk ("12abc" -> 12).
/// Zero and non-numeric input yield `None`.
fn leading_number(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..digits_end].parse::<u32>().ok().filter(|n| *n > 0)
}
