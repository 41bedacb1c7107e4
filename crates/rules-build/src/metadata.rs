/// Document metadata kept in `metadata.json` next to the rules directory.
use std::path::Path;

use rules_common::error::RuleError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub version: String,
    pub organization: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            organization: "Angular Best Practices".to_string(),
            abstract_text:
                "Comprehensive guidelines for building performant, maintainable Angular applications."
                    .to_string(),
        }
    }
}

impl Metadata {
    /// Read `path`, falling back to the defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, RuleError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| RuleError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write as pretty JSON with a trailing newline.
    pub fn save(&self, path: &Path) -> Result<(), RuleError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json).map_err(|e| RuleError::io(path, e))
    }

    pub fn upgrade_version(&mut self) -> Result<(), RuleError> {
        self.version = increment_version(&self.version)?;
        Ok(())
    }
}

/// Bump the patch component: `1.2.3` -> `1.2.4`, `1.2` -> `1.2.1`.
pub fn increment_version(version: &str) -> Result<String, RuleError> {
    let mut parts = version
        .trim()
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| RuleError::Metadata(format!("invalid version '{version}'")))
        })
        .collect::<Result<Vec<u64>, _>>()?;

    if parts.len() < 3 {
        parts.resize(3, 0);
    }
    parts[2] += 1;

    Ok(parts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join("."))
}
