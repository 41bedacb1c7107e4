use std::path::PathBuf;

use rules_common::taxonomy::Taxonomy;

use crate::error::AppError;

/// Application configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the rule markdown files.
    pub rules_dir: PathBuf,
    /// JSON taxonomy replacing the built-in tables. `None` uses the built-ins.
    pub taxonomy_path: Option<PathBuf>,
}

impl Config {
    /// Required:
    /// - `RULES_DIR`: path to the rules directory
    ///
    /// Optional:
    /// - `RULES_TAXONOMY`: path to a taxonomy JSON file
    pub fn from_env() -> Result<Self, AppError> {
        let rules_dir = std::env::var("RULES_DIR").map_err(|_| {
            AppError::Config("RULES_DIR environment variable is required".to_string())
        })?;
        Self::new(rules_dir, std::env::var("RULES_TAXONOMY").ok())
    }

    pub fn new(
        rules_dir: impl Into<PathBuf>,
        taxonomy_path: Option<impl Into<PathBuf>>,
    ) -> Result<Self, AppError> {
        let rules_dir = rules_dir.into();
        if !rules_dir.is_dir() {
            return Err(AppError::Config(format!(
                "rules directory not found: {}",
                rules_dir.display()
            )));
        }

        let taxonomy_path = taxonomy_path.map(Into::into);
        if let Some(path) = &taxonomy_path {
            if !path.is_file() {
                return Err(AppError::Config(format!(
                    "taxonomy file not found: {}",
                    path.display()
                )));
            }
        }

        Ok(Self {
            rules_dir,
            taxonomy_path,
        })
    }

    pub fn load_taxonomy(&self) -> Result<Taxonomy, AppError> {
        match &self.taxonomy_path {
            Some(path) => Ok(Taxonomy::from_json_file(path)?),
            None => Ok(Taxonomy::angular()),
        }
    }
}
