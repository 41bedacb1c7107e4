/// Parser for the markdown body of a rule file (frontmatter already removed).
///
/// Extracts the title, the explanation paragraph, labeled code examples and
/// reference URLs. Code examples come from a two-state machine:
///
/// - `Outside`: a `**Label:**` line sets the label for the next block; a fence
///   line opens a block; prose after a closed block is buffered as trailing text.
/// - `InsideBlock`: lines accumulate verbatim until a bare closing fence.
///
/// A label binds to the next fence only if nothing but blank lines sits between
/// them. Trailing text attaches to the most recent example when the next label
/// appears or when input ends.
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::CodeExample;

const FENCE: &str = "```";
const DEFAULT_LANGUAGE: &str = "typescript";
const DEFAULT_LABEL: &str = "Example";

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,2}\s+(.+)$").expect("valid regex"));
static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*([^*]+?)(?:\s*\([^)]*\))?:\*\*\s*$").expect("valid regex")
});
static LABEL_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*[^*]+:\*\*").expect("valid regex"));
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s)]+").expect("valid regex"));

/// Everything extracted from a rule body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBody {
    pub title: Option<String>,
    pub explanation: String,
    pub examples: Vec<CodeExample>,
    pub references: Vec<String>,
}

pub fn parse_body(body: &str) -> ParsedBody {
    ParsedBody {
        title: extract_title(body),
        explanation: extract_explanation(body),
        examples: parse_code_examples(body),
        references: extract_references(body),
    }
}

/// First `#` or `##` heading text.
pub fn extract_title(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| HEADING_RE.captures(line))
        .map(|caps| caps[1].trim().to_string())
}

/// Prose between the first heading and the first code fence or label.
pub fn extract_explanation(body: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let mut found_heading = false;

    for line in body.lines() {
        if !found_heading && HEADING_RE.is_match(line) {
            found_heading = true;
            continue;
        }
        if line.starts_with(FENCE) || LABEL_PREFIX_RE.is_match(line) {
            break;
        }
        if line.starts_with('#') {
            continue;
        }
        let content = match line.strip_prefix('>') {
            Some(quoted) => quoted.trim(),
            None => line.trim(),
        };
        if !content.is_empty() {
            parts.push(content);
        }
    }

    parts.join(" ").trim().to_string()
}

/// Every `http(s)://` URL in the body, first occurrence order, no duplicates.
pub fn extract_references(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    URL_RE
        .find_iter(body)
        .map(|m| m.as_str())
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

#[derive(Debug)]
enum State<'a> {
    Outside { after_block: bool },
    InsideBlock { language: String, lines: Vec<&'a str> },
}

#[derive(Debug, Default)]
struct Accumulator<'a> {
    label: Option<String>,
    pending: Vec<&'a str>,
    examples: Vec<CodeExample>,
}

impl Accumulator<'_> {
    fn attach_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if let Some(last) = self.examples.last_mut() {
            last.additional_text = Some(self.pending.join("\n").trim().to_string());
        }
        self.pending.clear();
    }

    fn close_block(&mut self, language: String, lines: Vec<&str>) {
        if self.label.is_some() || !lines.is_empty() {
            self.examples.push(CodeExample {
                label: self
                    .label
                    .take()
                    .unwrap_or_else(|| DEFAULT_LABEL.to_string()),
                code: join_code(&lines),
                language,
                additional_text: None,
            });
        }
        self.pending.clear();
    }
}

/// Run the example state machine over `body`.
pub fn parse_code_examples(body: &str) -> Vec<CodeExample> {
    let mut acc = Accumulator::default();
    let mut state = State::Outside { after_block: false };

    for line in body.lines() {
        state = match state {
            State::InsideBlock { language, mut lines } => {
                if line == FENCE {
                    acc.close_block(language, lines);
                    State::Outside { after_block: true }
                } else {
                    lines.push(line);
                    State::InsideBlock { language, lines }
                }
            }
            State::Outside { after_block } => {
                if let Some(caps) = LABEL_RE.captures(line) {
                    if after_block {
                        acc.attach_pending();
                    }
                    acc.pending.clear();
                    acc.label = Some(caps[1].trim().to_string());
                    State::Outside { after_block: false }
                } else if let Some(info) = line.strip_prefix(FENCE) {
                    let info = info.trim();
                    let language = if info.is_empty() {
                        DEFAULT_LANGUAGE.to_string()
                    } else {
                        info.to_string()
                    };
                    State::InsideBlock {
                        language,
                        lines: Vec::new(),
                    }
                } else {
                    if after_block && !line.trim().is_empty() && !line.starts_with('#') {
                        acc.pending.push(line);
                    }
                    State::Outside { after_block }
                }
            }
        };
    }

    // an unterminated block never emits an example
    acc.attach_pending();
    acc.examples
}

fn join_code(lines: &[&str]) -> String {
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_examples_bind_in_order() {
        let body = "**Incorrect:**\n```ts\nA\n```\n**Correct:**\n```ts\nB\n```";
        let examples = parse_code_examples(body);
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].label, "Incorrect");
        assert_eq!(examples[0].code, "A");
        assert_eq!(examples[0].language, "ts");
        assert_eq!(examples[1].label, "Correct");
        assert_eq!(examples[1].code, "B");
        assert_eq!(examples[1].language, "ts");
    }

    #[test]
    fn unlabeled_fence_becomes_example() {
        let examples = parse_code_examples("Some prose.\n\n```\nconst x = 1;\n```\n");
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].label, "Example");
        assert_eq!(examples[0].language, "typescript");
        assert_eq!(examples[0].code, "const x = 1;");
    }

    #[test]
    fn parenthetical_annotation_is_dropped_from_label() {
        let body = "**Incorrect (slow):**\n\n```ts\nlist.find(x)\n```";
        let examples = parse_code_examples(body);
        assert_eq!(examples[0].label, "Incorrect");

        // nested parentheses cannot be split off, so the whole text is the label
        let nested = parse_code_examples("**Correct (O(1)):**\n```ts\nset.has(x)\n```");
        assert_eq!(nested[0].label, "Correct (O(1))");
    }

    #[test]
    fn trailing_text_attaches_to_previous_example() {
        let body = "\
**Incorrect:**
```ts
a()
```
This blocks the event loop.

**Correct:**
```ts
b()
```
Now it is parallel.
## Heading lines are ignored
";
        let examples = parse_code_examples(body);
        assert_eq!(examples.len(), 2);
        assert_eq!(
            examples[0].additional_text.as_deref(),
            Some("This blocks the event loop.")
        );
        assert_eq!(examples[1].additional_text.as_deref(), Some("Now it is parallel."));
    }

    #[test]
    fn prose_before_first_block_is_not_trailing_text() {
        let body = "Intro line.\n**Correct:**\n```ts\nok()\n```";
        let examples = parse_code_examples(body);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].additional_text, None);
    }

    #[test]
    fn label_lines_inside_block_are_code() {
        let body = "```md\n**Correct:**\n```";
        let examples = parse_code_examples(body);
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].label, "Example");
        assert_eq!(examples[0].code, "**Correct:**");
        assert_eq!(examples[0].language, "md");
    }

    #[test]
    fn empty_unlabeled_block_is_dropped_but_labeled_one_kept() {
        assert!(parse_code_examples("```\n```").is_empty());
        let examples = parse_code_examples("**Correct:**\n```\n```");
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].code, "");
    }

    #[test]
    fn trailing_blank_code_lines_are_trimmed() {
        let examples = parse_code_examples("```rs\nfn a() {}\n\n  \n```");
        assert_eq!(examples[0].code, "fn a() {}");
    }

    #[test]
    fn unterminated_block_emits_nothing() {
        assert!(parse_code_examples("**Correct:**\n```ts\nnever closed").is_empty());
    }

    #[test]
    fn title_prefers_first_h1_or_h2() {
        assert_eq!(
            extract_title("intro\n### Not this\n## Use Signals\n# Later").as_deref(),
            Some("Use Signals")
        );
        assert_eq!(extract_title("no headings"), None);
    }

    #[test]
    fn explanation_stops_at_label_and_keeps_blockquotes() {
        let body = "\
## Avoid Barrel Files

Barrel files pull in the whole module graph.
> Tree shaking cannot help.

### Details
More detail.

**Incorrect:**
```ts
import { x } from './index'
```";
        assert_eq!(
            extract_explanation(body),
            "Barrel files pull in the whole module graph. Tree shaking cannot help. More detail."
        );
    }

    #[test]
    fn explanation_stops_at_fence() {
        let body = "## T\nFirst.\n```ts\ncode\n```\nAfter.";
        assert_eq!(extract_explanation(body), "First.");
    }

    #[test]
    fn references_are_deduplicated_in_order() {
        let body = "See https://angular.dev/guide (and [docs](https://rxjs.dev/api)).\n\
                    Again https://angular.dev/guide and http://example.com/x";
        assert_eq!(
            extract_references(body),
            vec![
                "https://angular.dev/guide",
                "https://rxjs.dev/api",
                "http://example.com/x"
            ]
        );
    }
}
