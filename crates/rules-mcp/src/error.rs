use rules_common::error::RuleError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("config error: {0}")]
    Config(String),
}
