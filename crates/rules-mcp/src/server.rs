use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::AppError;
use crate::search;
use rules_common::classify::{self, UnclassifiedPolicy, UNCLASSIFIED_SECTION};
use rules_common::frontmatter;
use rules_common::loader;
use rules_common::mcp_api::{
    GetRuleParams, ListSectionParams, ReloadRulesResponse, RenderCandidateParams,
    RenderCandidateResponse, RuleDetailResponse, RuleSummary, SearchRulesParams,
    SearchRulesResponse, SectionInfo, SectionListResponse, SectionsResponse, ValidateRuleParams,
    ValidateRuleResponse,
};
use rules_common::model::{Impact, RuleFile};
use rules_common::taxonomy::Taxonomy;
use rules_common::validator;

pub struct AppState {
    pub rules: Vec<RuleFile>,
    pub fingerprint: String,
}

impl AppState {
    /// Load every rule under `rules_dir`; unclassified files land in section 0.
    pub fn load(rules_dir: &std::path::Path, taxonomy: &Taxonomy) -> Result<Self, AppError> {
        let mut rules = loader::load_rules(rules_dir, taxonomy, UnclassifiedPolicy::Sentinel)?;
        rules.sort_by(|a, b| (a.section, &a.filename).cmp(&(b.section, &b.filename)));
        let fingerprint = loader::corpus_fingerprint(&rules);
        Ok(Self { rules, fingerprint })
    }
}

#[derive(Clone)]
pub struct RulesServer {
    state: Arc<RwLock<AppState>>,
    taxonomy: Arc<Taxonomy>,
    rules_dir: PathBuf,
    tool_router: ToolRouter<RulesServer>,
}

impl RulesServer {
    pub fn new(state: AppState, taxonomy: Taxonomy, rules_dir: PathBuf) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            taxonomy: Arc::new(taxonomy),
            rules_dir,
            tool_router: Self::tool_router(),
        }
    }

    fn section_info(&self, number: u32, rule_count: usize) -> SectionInfo {
        let optional_skill = self
            .taxonomy
            .optional_skills
            .iter()
            .find(|s| s.sections.contains(&number))
            .map(|s| s.name.clone());

        match self.taxonomy.section_meta(number) {
            Some(meta) => SectionInfo {
                number,
                title: meta.title.clone(),
                impact: meta.impact,
                impact_description: meta.impact_description.clone(),
                rule_count,
                optional_skill,
            },
            None => SectionInfo {
                number,
                title: if number == UNCLASSIFIED_SECTION {
                    "Unclassified".to_string()
                } else {
                    format!("Section {number}")
                },
                impact: Impact::Medium,
                impact_description: None,
                rule_count,
                optional_skill,
            },
        }
    }
}

#[tool_router]
impl RulesServer {
    #[tool(description = "List every section that has rules, with title, impact and rule count. Section 0 holds unclassified rules.")]
    async fn list_sections(&self) -> Result<Json<SectionsResponse>, String> {
        let state = self.state.read().await;

        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for rule in &state.rules {
            *counts.entry(rule.section).or_default() += 1;
        }

        let sections = counts
            .into_iter()
            .map(|(number, count)| self.section_info(number, count))
            .collect();

        Ok(Json(SectionsResponse {
            sections,
            total_rules: state.rules.len(),
        }))
    }

    #[tool(description = "List the rules in one section by its canonical number (e.g. 5 for Signals & Reactivity).")]
    async fn list_section(
        &self,
        Parameters(params): Parameters<ListSectionParams>,
    ) -> Result<Json<SectionListResponse>, String> {
        let state = self.state.read().await;

        let rules: Vec<RuleSummary> = state
            .rules
            .iter()
            .filter(|r| r.section == params.section)
            .map(to_summary)
            .collect();

        let known = params.section == UNCLASSIFIED_SECTION
            || self.taxonomy.section_meta(params.section).is_some();
        if rules.is_empty() && !known {
            let available: Vec<String> = self.taxonomy.sections.keys().map(u32::to_string).collect();
            return Err(format!(
                "unknown section: {}. Available sections: {}",
                params.section,
                available.join(", ")
            ));
        }

        Ok(Json(SectionListResponse {
            section: self.section_info(params.section, rules.len()),
            rules,
        }))
    }

    #[tool(description = "Get a rule by filename or stem (e.g. 'signal-computed' or 'ts-enums.md').")]
    async fn get_rule(
        &self,
        Parameters(params): Parameters<GetRuleParams>,
    ) -> Result<Json<RuleDetailResponse>, String> {
        let name = params.rule.trim();
        if name.is_empty() {
            return Err("rule must not be empty".to_string());
        }
        let stem = name.strip_suffix(".md").unwrap_or(name);

        let state = self.state.read().await;
        let rule = state
            .rules
            .iter()
            .find(|r| r.stem().eq_ignore_ascii_case(stem))
            .ok_or_else(|| format!("rule not found: {name}"))?;

        let section_title = self.section_info(rule.section, 0).title;
        Ok(Json(RuleDetailResponse {
            filename: rule.filename.clone(),
            path: rule.path.display().to_string(),
            category: rule.category.clone(),
            section: rule.section,
            section_title,
            title: rule.rule.title.clone(),
            impact: rule.rule.impact,
            impact_description: rule.rule.impact_description.clone(),
            tags: rule.rule.tags.clone(),
            references: rule.rule.references.clone(),
            raw_markdown: rule.raw_content.clone(),
        }))
    }

    #[tool(description = "Search rules by keywords matched against titles, tags and explanations.")]
    async fn search_rules(
        &self,
        Parameters(params): Parameters<SearchRulesParams>,
    ) -> Result<Json<SearchRulesResponse>, String> {
        let query = params.query.trim().to_string();
        if query.is_empty() {
            return Err("query must not be empty".to_string());
        }

        let limit = params.limit.unwrap_or(10).min(50) as usize;

        let state = self.state.read().await;
        let results = search::search(&state.rules, &query, limit);

        Ok(Json(SearchRulesResponse { results }))
    }

    #[tool(description = "Check rule markdown (frontmatter included) against the line, code block and required field limits.")]
    async fn validate_rule(
        &self,
        Parameters(params): Parameters<ValidateRuleParams>,
    ) -> Result<Json<ValidateRuleResponse>, String> {
        let file = params.filename.as_deref().unwrap_or("candidate.md");
        let content = params.content.replace("\r\n", "\n");

        let errors = validator::validate_rule(file, &content, &self.taxonomy.validation);
        let (_, diagnostics) = frontmatter::parse_strict(&content);

        Ok(Json(ValidateRuleResponse {
            valid: errors.is_empty(),
            errors,
            warnings: diagnostics.iter().map(ToString::to_string).collect(),
        }))
    }

    #[tool(description = "Render a generated rule candidate to markdown and report contract and validation problems.")]
    async fn render_candidate(
        &self,
        Parameters(params): Parameters<RenderCandidateParams>,
    ) -> Result<Json<RenderCandidateResponse>, String> {
        let candidate = params.rule;
        let path = if candidate.category.is_empty() {
            candidate.filename.clone()
        } else {
            format!("{}/{}", candidate.category, candidate.filename)
        };
        let markdown = candidate.to_markdown();

        Ok(Json(RenderCandidateResponse {
            validation_errors: validator::validate_rule(&path, &markdown, &self.taxonomy.validation),
            shape_problems: candidate.check_shape(),
            inferred_section: classify::infer_section(&candidate.filename, &self.taxonomy.section_map),
            path,
            markdown,
        }))
    }

    #[tool(description = "Re-read the rules directory and refresh in-memory state if any rule changed.")]
    async fn reload_rules(&self) -> Result<Json<ReloadRulesResponse>, String> {
        info!("reload_rules tool invoked");

        let rules_dir = self.rules_dir.clone();
        let taxonomy = Arc::clone(&self.taxonomy);
        let fresh = tokio::task::spawn_blocking(move || AppState::load(&rules_dir, &taxonomy))
            .await
            .map_err(|e| format!("reload task failed: {e}"))?
            .map_err(|e| format!("reload failed: {e}"))?;

        let mut state = self.state.write().await;
        let updated = fresh.fingerprint != state.fingerprint;
        if updated {
            *state = fresh;
            info!(
                rule_count = state.rules.len(),
                fingerprint = %state.fingerprint,
                "in-memory state updated"
            );
        }

        Ok(Json(ReloadRulesResponse {
            updated,
            fingerprint: state.fingerprint.clone(),
            rule_count: state.rules.len(),
        }))
    }
}

fn to_summary(rule: &RuleFile) -> RuleSummary {
    RuleSummary {
        filename: rule.filename.clone(),
        title: rule.rule.title.clone(),
        category: rule.category.clone(),
        section: rule.section,
        impact: rule.rule.impact,
        tags: rule.rule.tags.clone(),
    }
}

#[tool_handler]
impl ServerHandler for RulesServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "rules-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                "{} rule browser. Use list_sections and list_section to browse by section, \
                 get_rule for a specific rule file, search_rules for keyword queries, \
                 validate_rule and render_candidate to check new rules before submitting them, \
                 and reload_rules after the rules directory changes.",
                self.taxonomy.skill.title
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_common::candidate::{CandidateFrontmatter, GeneratedRule};

    fn write(root: &std::path::Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn server(root: &std::path::Path) -> RulesServer {
        let taxonomy = Taxonomy::angular();
        let state = AppState::load(root, &taxonomy).unwrap();
        RulesServer::new(state, taxonomy, root.to_path_buf())
    }

    fn corpus() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(
            root,
            "angular/signal-computed.md",
            "---\ntitle: Prefer computed()\nimpact: HIGH\ntags: signals\n---\n\n## Prefer computed()\n\nDerive state.\n",
        );
        write(root, "angular/signal-untracked.md", "## Use untracked()\n\nRead without tracking.\n");
        write(root, "misc/notes-draft.md", "## Draft\n");
        dir
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = RulesServer::tool_router().list_all();
        for name in [
            "list_sections",
            "list_section",
            "get_rule",
            "search_rules",
            "validate_rule",
            "render_candidate",
            "reload_rules",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }

    #[tokio::test]
    async fn sections_include_unclassified_bucket() {
        let dir = corpus();
        let server = server(dir.path());

        let Json(response) = server.list_sections().await.unwrap();
        assert_eq!(response.total_rules, 3);
        let summary: Vec<(u32, &str, usize)> = response
            .sections
            .iter()
            .map(|s| (s.number, s.title.as_str(), s.rule_count))
            .collect();
        assert_eq!(
            summary,
            vec![(0, "Unclassified", 1), (5, "Signals & Reactivity", 2)]
        );

        let Json(listing) = server
            .list_section(Parameters(ListSectionParams { section: 5 }))
            .await
            .unwrap();
        let files: Vec<&str> = listing.rules.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(files, vec!["signal-computed.md", "signal-untracked.md"]);

        let Json(empty) = server
            .list_section(Parameters(ListSectionParams { section: 12 }))
            .await
            .unwrap();
        assert!(empty.rules.is_empty());
        assert_eq!(empty.section.optional_skill.as_deref(), Some("angular-best-practices-ngrx"));

        assert!(server
            .list_section(Parameters(ListSectionParams { section: 99 }))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn get_rule_accepts_stem_or_filename() {
        let dir = corpus();
        let server = server(dir.path());

        for query in ["signal-computed", "Signal-Computed.md"] {
            let Json(rule) = server
                .get_rule(Parameters(GetRuleParams { rule: query.to_string() }))
                .await
                .unwrap();
            assert_eq!(rule.filename, "signal-computed.md");
            assert_eq!(rule.section_title, "Signals & Reactivity");
            assert_eq!(rule.impact, Impact::High);
            assert!(rule.raw_markdown.starts_with("---\ntitle: Prefer computed()"));
        }

        let err = server
            .get_rule(Parameters(GetRuleParams { rule: "nope".to_string() }))
            .await
            .err();
        assert_eq!(err.as_deref(), Some("rule not found: nope"));
    }

    #[tokio::test]
    async fn search_clamps_limit_and_rejects_blank_queries() {
        let dir = corpus();
        let server = server(dir.path());

        let Json(found) = server
            .search_rules(Parameters(SearchRulesParams {
                query: "computed".to_string(),
                limit: Some(500),
            }))
            .await
            .unwrap();
        assert_eq!(found.results[0].filename, "signal-computed.md");

        assert!(server
            .search_rules(Parameters(SearchRulesParams {
                query: "   ".to_string(),
                limit: None,
            }))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn validate_and_render_candidate() {
        let dir = corpus();
        let server = server(dir.path());

        let Json(report) = server
            .validate_rule(Parameters(ValidateRuleParams {
                content: "---\ntitle: T\nbroken line\n---\n\nbody\n".to_string(),
                filename: None,
            }))
            .await
            .unwrap();
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors.iter().all(|e| e.file == "candidate.md"));
        assert_eq!(report.warnings.len(), 1);

        let candidate = GeneratedRule {
            filename: "signal-linked.md".to_string(),
            category: "angular".to_string(),
            section: 5,
            frontmatter: CandidateFrontmatter {
                title: "Use linkedSignal() for Resettable State".to_string(),
                impact: Impact::Medium,
                impact_description: "fewer effects".to_string(),
                tags: vec!["signals".to_string(), "state".to_string()],
            },
            body: "## Use linkedSignal() for Resettable State\n\nReset derived state when the source changes.".to_string(),
            reasoning: "Signals section.".to_string(),
        };
        let Json(rendered) = server
            .render_candidate(Parameters(RenderCandidateParams { rule: candidate }))
            .await
            .unwrap();
        assert_eq!(rendered.path, "angular/signal-linked.md");
        assert_eq!(rendered.inferred_section, Some(5));
        assert!(rendered.shape_problems.is_empty());
        assert!(rendered.validation_errors.is_empty());
        assert!(rendered.markdown.contains("\ntags: signals, state\n"));
    }

    #[tokio::test]
    async fn reload_only_updates_on_change() {
        let dir = corpus();
        let server = server(dir.path());

        let Json(unchanged) = server.reload_rules().await.unwrap();
        assert!(!unchanged.updated);
        assert_eq!(unchanged.rule_count, 3);

        write(dir.path(), "angular/ts-enums.md", "## Prefer union types\n");
        let Json(changed) = server.reload_rules().await.unwrap();
        assert!(changed.updated);
        assert_eq!(changed.rule_count, 4);
        assert_ne!(changed.fingerprint, unchanged.fingerprint);
    }
}
