/// Error types shared by the rule pipeline crates.
///
/// These cover failures that are not part of rule content itself (I/O, taxonomy
/// and metadata files). Malformed rule markdown never produces an error here; the
/// parsers degrade to defaults instead. Binary crates wrap `RuleError` via `#[from]`.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {}: {message}", root.display())]
    Walk { root: PathBuf, message: String },

    #[error("taxonomy error: {0}")]
    Taxonomy(String),

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuleError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
