/// Markdown rendering of guideline documents.
///
/// All functions are pure: identical input renders byte-identical output.
use crate::model::{GuidelinesDocument, Impact, Rule, Section};
use crate::taxonomy::SkillConfig;

/// Render the core skill document.
pub fn render_document(doc: &GuidelinesDocument, skill: &SkillConfig) -> String {
    let mut lines: Vec<String> = vec![
        format!("# {}", skill.title),
        String::new(),
        format!("**Version {}**", doc.version),
        doc.organization.clone(),
        doc.date.clone(),
        String::new(),
        "> **Note:**".to_string(),
        "> This document is optimized for AI agents and LLMs. It provides".to_string(),
        format!(
            "> actionable guidelines for {} with code examples",
            skill.description
        ),
        "> and impact assessments.".to_string(),
        String::new(),
        "---".to_string(),
        String::new(),
        "## Abstract".to_string(),
        String::new(),
        doc.abstract_text.clone(),
        String::new(),
        "---".to_string(),
        String::new(),
        render_table_of_contents(&doc.sections),
        String::new(),
        "---".to_string(),
        String::new(),
    ];
    lines.extend(doc.sections.iter().map(render_section));
    lines.join("\n")
}

/// Render an optional skill bundle covering `sections`.
///
/// `skill_name` is turned into a heading by dropping the `<core_name>-` prefix
/// and title-casing what is left: `angular-best-practices-ngrx` becomes
/// "Angular Ngrx Best Practices".
pub fn render_optional_skill(skill_name: &str, core: &SkillConfig, sections: &[Section]) -> String {
    let short = skill_name
        .strip_prefix(core.name.as_str())
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(skill_name);
    let title = title_case(&short.replace(&['-', '_'][..], " "));

    let mut lines: Vec<String> = vec![
        format!("# {} {} Best Practices", core.product, title),
        String::new(),
        format!("> Use with the core `{}` skill.", core.name),
        String::new(),
        "---".to_string(),
        String::new(),
    ];
    lines.extend(sections.iter().map(render_section));
    lines.join("\n")
}

pub fn render_table_of_contents(sections: &[Section]) -> String {
    let mut lines = vec!["## Table of Contents".to_string(), String::new()];

    for section in sections {
        lines.push(format!(
            "{n}. [{title}](#{n}-{anchor}) — **{impact}**",
            n = section.number,
            title = section.title,
            anchor = slugify(&section.title),
            impact = section.impact,
        ));
        for rule in &section.rules {
            lines.push(format!(
                "   - {id} [{title}](#{flat}-{anchor})",
                id = rule.id,
                title = rule.title,
                flat = rule.id.replacen('.', "", 1),
                anchor = slugify(&rule.title),
            ));
        }
    }

    lines.join("\n")
}

pub fn render_section(section: &Section) -> String {
    let mut lines = vec![
        format!("## {}. {}", section.number, section.title),
        String::new(),
        impact_line(section.impact, section.impact_description.as_deref()),
        String::new(),
    ];

    if let Some(intro) = section.introduction.as_deref().filter(|i| !i.is_empty()) {
        lines.push(intro.to_string());
        lines.push(String::new());
    }

    lines.extend(section.rules.iter().map(render_rule));
    lines.push("---".to_string());
    lines.push(String::new());
    lines.join("\n")
}

pub fn render_rule(rule: &Rule) -> String {
    let mut lines = vec![
        format!("### {} {}", rule.id, rule.title),
        String::new(),
        impact_line(rule.impact, rule.impact_description.as_deref()),
        String::new(),
    ];

    if !rule.explanation.is_empty() {
        lines.push(rule.explanation.clone());
        lines.push(String::new());
    }

    for example in &rule.examples {
        lines.push(format!("**{}:**", example.label));
        lines.push(String::new());
        lines.push(format!("```{}", example.language));
        lines.push(example.code.clone());
        lines.push("```".to_string());
        lines.push(String::new());

        if let Some(text) = example.additional_text.as_deref().filter(|t| !t.is_empty()) {
            lines.push(text.to_string());
            lines.push(String::new());
        }
    }

    if !rule.references.is_empty() {
        lines.push("**References:**".to_string());
        lines.extend(rule.references.iter().map(|r| format!("- {r}")));
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Anchor slug: lowercase, every run of non `[a-z0-9]` characters becomes `-`.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

/// Upper-case the first character of every word.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if at_word_start && ch.is_alphanumeric() {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !(ch.is_alphanumeric() || ch == '_');
    }
    out
}

fn impact_line(impact: Impact, description: Option<&str>) -> String {
    match description.filter(|d| !d.is_empty()) {
        Some(description) => format!("**Impact: {impact}** ({description})"),
        None => format!("**Impact: {impact}**"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CodeExample;
    use crate::taxonomy::Taxonomy;

    fn sample_rule() -> Rule {
        Rule {
            id: "1.1".to_string(),
            title: "Use Promise.all()".to_string(),
            section: 1,
            subsection: None,
            impact: Impact::Critical,
            impact_description: Some("2-10x".to_string()),
            explanation: "Run independent requests together.".to_string(),
            examples: vec![
                CodeExample {
                    label: "Incorrect".to_string(),
                    code: "await a();\nawait b();".to_string(),
                    language: "ts".to_string(),
                    additional_text: Some("Two round trips.".to_string()),
                },
                CodeExample {
                    label: "Correct".to_string(),
                    code: "await Promise.all([a(), b()]);".to_string(),
                    language: "ts".to_string(),
                    additional_text: None,
                },
            ],
            references: vec!["https://developer.mozilla.org/".to_string()],
            tags: vec!["async".to_string()],
        }
    }

    fn sample_document() -> GuidelinesDocument {
        GuidelinesDocument {
            version: "1.2.3".to_string(),
            organization: "Example Org".to_string(),
            date: "October 18, 2026".to_string(),
            abstract_text: "Guidelines.".to_string(),
            sections: vec![Section {
                number: 1,
                title: "Signals & Reactivity".to_string(),
                impact: Impact::High,
                impact_description: Some("Reactive state management".to_string()),
                introduction: None,
                rules: vec![sample_rule()],
            }],
        }
    }

    #[test]
    fn rule_renders_all_parts() {
        let expected = "\
### 1.1 Use Promise.all()

**Impact: CRITICAL** (2-10x)

Run independent requests together.

**Incorrect:**

```ts
await a();
await b();
```

Two round trips.

**Correct:**

```ts
await Promise.all([a(), b()]);
```

**References:**
- https://developer.mozilla.org/
";
        assert_eq!(render_rule(&sample_rule()), expected);
    }

    #[test]
    fn bare_rule_skips_optional_parts() {
        let rule = Rule {
            impact_description: None,
            explanation: String::new(),
            examples: vec![],
            references: vec![],
            ..sample_rule()
        };
        assert_eq!(render_rule(&rule), "### 1.1 Use Promise.all()\n\n**Impact: CRITICAL**\n");
    }

    #[test]
    fn table_of_contents_links_sections_and_rules() {
        let toc = render_table_of_contents(&sample_document().sections);
        assert_eq!(
            toc,
            "## Table of Contents\n\n\
             1. [Signals & Reactivity](#1-signals-reactivity) — **HIGH**\n   \
             - 1.1 [Use Promise.all()](#11-use-promise-all-)"
        );
    }

    #[test]
    fn document_has_header_abstract_and_sections() {
        let taxonomy = Taxonomy::angular();
        let text = render_document(&sample_document(), &taxonomy.skill);
        assert!(text.starts_with(
            "# Angular Best Practices\n\n**Version 1.2.3**\nExample Org\nOctober 18, 2026\n\n> **Note:**\n"
        ));
        assert!(text.contains("> actionable guidelines for Angular applications with code examples\n"));
        assert!(text.contains("## Abstract\n\nGuidelines.\n\n---\n\n## Table of Contents"));
        assert!(text.contains("## 1. Signals & Reactivity\n\n**Impact: HIGH** (Reactive state management)\n\n### 1.1"));
        assert!(text.ends_with("---\n"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let taxonomy = Taxonomy::angular();
        let doc = sample_document();
        assert_eq!(
            render_document(&doc, &taxonomy.skill),
            render_document(&doc.clone(), &taxonomy.skill)
        );
    }

    #[test]
    fn optional_skill_heading_and_pointer() {
        let taxonomy = Taxonomy::angular();
        let sections = sample_document().sections;
        let text = render_optional_skill("angular-best-practices-tanstack", &taxonomy.skill, &sections);
        assert!(text.starts_with(
            "# Angular Tanstack Best Practices\n\n> Use with the core `angular-best-practices` skill.\n\n---\n\n## 1. "
        ));

        let foreign = render_optional_skill("signal_store-extras", &taxonomy.skill, &[]);
        assert!(foreign.starts_with("# Angular Signal Store Extras Best Practices\n"));
    }

    #[test]
    fn slug_and_title_case_helpers() {
        assert_eq!(slugify("SSR & Hydration"), "ssr-hydration");
        assert_eq!(slugify("Use O(1) Lookups!"), "use-o-1-lookups-");
        assert_eq!(title_case("ngrx signal store"), "Ngrx Signal Store");
        assert_eq!(title_case("a11y"), "A11y");
    }
}
