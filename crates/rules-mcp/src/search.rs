/// Keyword search over loaded rules.
///
/// Each query term scores against the rule title, its tags and its
/// explanation; the total is normalized to `[0, 1]`.
use std::collections::HashSet;

use rules_common::mcp_api::RuleSearchResult;
use rules_common::model::RuleFile;

const MAX_SUMMARY_LEN: usize = 300;

const TITLE_WEIGHT: f32 = 3.0;
const TAG_WEIGHT: f32 = 2.0;
const TEXT_WEIGHT: f32 = 1.0;
const MAX_TERM_SCORE: f32 = TITLE_WEIGHT + TAG_WEIGHT + TEXT_WEIGHT;

pub fn search(rules: &[RuleFile], query: &str, limit: usize) -> Vec<RuleSearchResult> {
    let terms = terms(query);
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f32, &RuleFile)> = rules
        .iter()
        .map(|rule| (score(rule, &terms), rule))
        .filter(|(score, _)| *score > 0.0)
        .collect();
    scored.sort_by(|(a_score, a), (b_score, b)| {
        b_score
            .total_cmp(a_score)
            .then_with(|| a.filename.cmp(&b.filename))
    });

    scored
        .into_iter()
        .take(limit)
        .map(|(score, rule)| RuleSearchResult {
            filename: rule.filename.clone(),
            title: rule.rule.title.clone(),
            section: rule.section,
            impact: rule.rule.impact,
            score,
            summary: summarize(&rule.rule.explanation),
        })
        .collect()
}

fn terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|t| t.trim_matches('-').to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

fn score(rule: &RuleFile, terms: &[String]) -> f32 {
    let title = rule.rule.title.to_lowercase();
    let text = rule.rule.explanation.to_lowercase();

    let total: f32 = terms
        .iter()
        .map(|term| {
            let mut s = 0.0;
            if title.contains(term.as_str()) || rule.stem().contains(term.as_str()) {
                s += TITLE_WEIGHT;
            }
            if rule.rule.tags.iter().any(|tag| tag == term) {
                s += TAG_WEIGHT;
            }
            if text.contains(term.as_str()) {
                s += TEXT_WEIGHT;
            }
            s
        })
        .sum();

    total / (MAX_TERM_SCORE * terms.len() as f32)
}

fn summarize(text: &str) -> String {
    if text.chars().count() > MAX_SUMMARY_LEN {
        format!("{}...", text.chars().take(MAX_SUMMARY_LEN).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rules_common::model::{Impact, Rule};

    use super::*;

    fn rule(filename: &str, title: &str, tags: &[&str], explanation: &str) -> RuleFile {
        RuleFile {
            path: PathBuf::from(filename),
            filename: filename.to_string(),
            category: String::new(),
            section: 5,
            rule: Rule {
                id: String::new(),
                title: title.to_string(),
                section: 5,
                subsection: None,
                impact: Impact::High,
                impact_description: None,
                explanation: explanation.to_string(),
                examples: vec![],
                references: vec![],
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
            raw_content: String::new(),
        }
    }

    fn corpus() -> Vec<RuleFile> {
        vec![
            rule("signal-computed.md", "Prefer computed()", &["signals"], "Derive state from signals."),
            rule("rxjs-take-until.md", "Unsubscribe with takeUntil", &["rxjs"], "Avoid leaking subscriptions."),
            rule("signal-effect.md", "Avoid effects for state", &["signals", "effects"], "Effects are for side effects."),
        ]
    }

    #[test]
    fn title_and_tag_matches_rank_first() {
        let results = search(&corpus(), "computed signals", 10);
        assert_eq!(results[0].filename, "signal-computed.md");
        assert_eq!(results[1].filename, "signal-effect.md");
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert!(results.iter().all(|r| r.score > 0.0 && r.score <= 1.0));
    }

    #[test]
    fn limit_and_empty_queries() {
        assert_eq!(search(&corpus(), "signals", 1).len(), 1);
        assert!(search(&corpus(), "  ...  ", 10).is_empty());
        assert!(search(&corpus(), "kubernetes", 10).is_empty());
    }

    #[test]
    fn repeated_terms_count_once() {
        assert_eq!(terms("Signals computed signals"), vec!["signals", "computed"]);

        let once = search(&corpus(), "computed signals", 10);
        let repeated = search(&corpus(), "signals computed SIGNALS", 10);
        assert_eq!(once.len(), repeated.len());
        for (a, b) in once.iter().zip(&repeated) {
            assert_eq!(a.filename, b.filename);
            assert_eq!(a.score, b.score);
        }
    }

    #[test]
    fn long_explanations_are_truncated() {
        let long = "x".repeat(MAX_SUMMARY_LEN + 10);
        let results = search(&[rule("ts-any.md", "No any", &["typescript"], &long)], "typescript", 5);
        assert_eq!(results[0].summary.chars().count(), MAX_SUMMARY_LEN + 3);
    }
}
