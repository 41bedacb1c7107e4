/// Section taxonomy and skill configuration.
///
/// Section metadata is keyed by the canonical (raw) section number that the
/// classifier assigns, never by a rule's position in a rendered document.
/// The built-in [`Taxonomy::angular`] tables can be replaced by a JSON file.
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::model::Impact;
use crate::validator::ValidationConfig;

/// Identity of the core skill and its rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillConfig {
    /// Skill identifier, also the output directory name
    pub name: String,
    /// Document heading, e.g. "Angular Best Practices"
    pub title: String,
    /// Subject named in the agent note, e.g. "Angular applications"
    pub description: String,
    /// Framework name used in optional skill headings, e.g. "Angular"
    pub product: String,
}

/// Static metadata for one canonical section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMeta {
    pub title: String,
    pub impact: Impact,
    #[serde(default)]
    pub impact_description: Option<String>,
    #[serde(default)]
    pub introduction: Option<String>,
}

/// An add-on bundle covering a subset of sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalSkill {
    pub name: String,
    pub description: String,
    pub sections: Vec<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub globs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    pub skill: SkillConfig,
    /// Filename prefix -> canonical section number
    pub section_map: BTreeMap<String, u32>,
    /// Canonical section number -> metadata
    pub sections: BTreeMap<u32, SectionMeta>,
    #[serde(default)]
    pub optional_skills: Vec<OptionalSkill>,
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl Taxonomy {
    /// Load a taxonomy from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, RuleError> {
        let content = std::fs::read_to_string(path).map_err(|e| RuleError::io(path, e))?;
        let taxonomy: Taxonomy = serde_json::from_str(&content)?;
        taxonomy.check()?;
        Ok(taxonomy)
    }

    /// Reject tables that cannot classify anything sensibly.
    pub fn check(&self) -> Result<(), RuleError> {
        if let Some((prefix, _)) = self.section_map.iter().find(|(_, n)| **n == 0) {
            return Err(RuleError::Taxonomy(format!(
                "prefix '{prefix}' maps to section 0, which is reserved for unclassified rules"
            )));
        }
        if let Some(prefix) = self.section_map.keys().find(|p| p.trim().is_empty()) {
            return Err(RuleError::Taxonomy(format!("empty prefix '{prefix}'")));
        }
        for skill in &self.optional_skills {
            if skill.sections.is_empty() {
                return Err(RuleError::Taxonomy(format!(
                    "optional skill '{}' lists no sections",
                    skill.name
                )));
            }
        }
        Ok(())
    }

    pub fn section_meta(&self, raw: u32) -> Option<&SectionMeta> {
        self.sections.get(&raw)
    }

    /// Every section owned by some optional skill.
    pub fn optional_section_numbers(&self) -> BTreeSet<u32> {
        self.optional_skills
            .iter()
            .flat_map(|s| s.sections.iter().copied())
            .collect()
    }

    /// The Angular rule set's tables.
    pub fn angular() -> Self {
        let section_map = [
            ("async", 1),
            ("opt-async", 1),
            ("bundle", 2),
            ("opt", 3),
            ("performance", 3),
            ("ts", 4),
            ("signal", 5),
            ("component", 6),
            ("rxjs", 7),
            ("cd", 8),
            ("template", 9),
            ("ssr", 10),
            ("form", 11),
            ("ngrx", 12),
            ("signalstore", 13),
            ("tanstack", 14),
            ("arch", 15),
            ("test", 16),
            ("core", 17),
            ("error-handling", 17),
            ("observability", 17),
            ("pattern", 17),
            ("routing", 17),
            ("security", 17),
            ("ui", 18),
            ("a11y", 18),
            ("loading", 18),
            ("dialogs", 18),
            ("theming", 18),
            ("http", 19),
            ("mapper", 19),
            ("material", 20),
            ("primeng", 21),
            ("spartan", 22),
            ("transloco", 23),
        ]
        .into_iter()
        .map(|(prefix, n)| (prefix.to_string(), n))
        .collect();

        let sections = [
            (1, "Eliminating Waterfalls", Impact::Critical, "2-10× improvement"),
            (2, "Bundle Optimization", Impact::Critical, "Reduces initial load"),
            (3, "JavaScript Performance", Impact::High, "Runtime performance"),
            (4, "TypeScript Best Practices", Impact::Medium, "Type safety & maintainability"),
            (5, "Signals & Reactivity", Impact::High, "Reactive state management"),
            (6, "Component Patterns", Impact::High, "Component architecture"),
            (7, "RxJS Patterns", Impact::High, "Memory leaks & cancellation"),
            (8, "Change Detection", Impact::High, "Rendering performance"),
            (9, "Template Optimization", Impact::High, "Lazy loading & pipes"),
            (10, "SSR & Hydration", Impact::High, "Initial render & SEO"),
            (11, "Forms", Impact::Medium, "Form handling"),
            (12, "NgRx State Management", Impact::High, "Global state"),
            (13, "SignalStore", Impact::High, "Local/feature state"),
            (14, "TanStack Query", Impact::High, "Server state"),
            (15, "Architecture", Impact::High, "Scalability"),
            (16, "Testing", Impact::High, "Reliability"),
            (17, "Infrastructure", Impact::Medium, "Cross-cutting concerns"),
            (18, "UI & Accessibility", Impact::Medium, "User experience"),
            (19, "Data Handling", Impact::Medium, "API integration"),
            (20, "Angular Material", Impact::Medium, "Component usage & theming"),
            (21, "PrimeNG", Impact::Medium, "Component imports & theming"),
            (22, "Spartan UI", Impact::Medium, "Headless components"),
            (23, "Transloco", Impact::Medium, "Runtime i18n"),
        ]
        .into_iter()
        .map(|(n, title, impact, description)| {
            (
                n,
                SectionMeta {
                    title: title.to_string(),
                    impact,
                    impact_description: Some(description.to_string()),
                    introduction: None,
                },
            )
        })
        .collect();

        let optional = |name: &str, description: &str, section: u32, tags: &[&str], globs: &[&str]| {
            OptionalSkill {
                name: name.to_string(),
                description: description.to_string(),
                sections: vec![section],
                tags: tags.iter().map(|t| t.to_string()).collect(),
                globs: globs.iter().map(|g| g.to_string()).collect(),
            }
        };

        Self {
            skill: SkillConfig {
                name: "angular-best-practices".to_string(),
                title: "Angular Best Practices".to_string(),
                description: "Angular applications".to_string(),
                product: "Angular".to_string(),
            },
            section_map,
            sections,
            optional_skills: vec![
                optional(
                    "angular-best-practices-ngrx",
                    "NgRx state management best practices for Angular. Install alongside angular-best-practices.",
                    12,
                    &["angular", "ngrx", "state-management"],
                    &["**/*.ts", "**/*.reducer.ts", "**/*.effects.ts", "**/*.selectors.ts"],
                ),
                optional(
                    "angular-best-practices-signalstore",
                    "NgRx SignalStore best practices for Angular. Install alongside angular-best-practices.",
                    13,
                    &["angular", "ngrx-signals", "signalstore", "state-management"],
                    &["**/*.ts", "**/*.store.ts"],
                ),
                optional(
                    "angular-best-practices-tanstack",
                    "TanStack Query best practices for Angular. Install alongside angular-best-practices.",
                    14,
                    &["angular", "tanstack-query", "server-state"],
                    &["**/*.ts", "**/*.service.ts"],
                ),
                optional(
                    "angular-best-practices-material",
                    "Angular Material component usage, theming, CDK utilities and test harnesses. Install alongside angular-best-practices.",
                    20,
                    &["angular", "angular-material", "cdk", "theming"],
                    &["**/*.ts", "**/*.html", "**/*.scss"],
                ),
                optional(
                    "angular-best-practices-primeng",
                    "PrimeNG component imports, theming system and table patterns. Install alongside angular-best-practices.",
                    21,
                    &["angular", "primeng", "theming"],
                    &["**/*.ts", "**/*.html"],
                ),
                optional(
                    "angular-best-practices-spartan",
                    "Spartan UI brain/helm headless components with Tailwind. Install alongside angular-best-practices.",
                    22,
                    &["angular", "spartan", "tailwind"],
                    &["**/*.ts", "**/*.html"],
                ),
                optional(
                    "angular-best-practices-transloco",
                    "Transloco runtime i18n, lazy-loaded translations and test mocking. Install alongside angular-best-practices.",
                    23,
                    &["angular", "transloco", "i18n"],
                    &["**/*.ts", "**/*.html", "**/i18n/*.json"],
                ),
            ],
            validation: ValidationConfig::default(),
        }
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::angular()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angular_tables_are_consistent() {
        let taxonomy = Taxonomy::angular();
        taxonomy.check().expect("built-in taxonomy is valid");
        for (prefix, n) in &taxonomy.section_map {
            assert!(
                taxonomy.section_meta(*n).is_some(),
                "prefix {prefix} maps to section {n} without metadata"
            );
        }
        assert_eq!(
            taxonomy.optional_section_numbers().into_iter().collect::<Vec<_>>(),
            vec![12, 13, 14, 20, 21, 22, 23]
        );
    }

    #[test]
    fn json_round_trip_and_defaults() {
        let json = r#"{
            "skill": {"name": "demo", "title": "Demo Practices", "description": "demo apps", "product": "Demo"},
            "sectionMap": {"perf": 4},
            "sections": {"4": {"title": "Performance", "impact": "HIGH"}}
        }"#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("taxonomy.json");
        std::fs::write(&path, json).expect("write taxonomy");

        let taxonomy = Taxonomy::from_json_file(&path).expect("load taxonomy");
        assert_eq!(taxonomy.section_map["perf"], 4);
        assert_eq!(taxonomy.sections[&4].impact, Impact::High);
        assert_eq!(taxonomy.sections[&4].impact_description, None);
        assert!(taxonomy.optional_skills.is_empty());
        assert_eq!(taxonomy.validation, ValidationConfig::default());
    }

    #[test]
    fn zero_section_is_rejected() {
        let mut taxonomy = Taxonomy::angular();
        taxonomy.section_map.insert("bad".to_string(), 0);
        assert!(matches!(taxonomy.check(), Err(RuleError::Taxonomy(_))));
    }
}
