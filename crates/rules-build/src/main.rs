use std::process::ExitCode;

use clap::Parser;
use rules_common::validator::format_validation_errors;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rules_build::build::{self, BuildOutcome};
use rules_build::config::{BuildConfig, Cli};

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = BuildConfig::from_cli(Cli::parse())?;

    match build::run(&config)? {
        BuildOutcome::Built(report) => {
            info!(
                version = %report.version,
                skills = report.optional.len() + 1,
                rules = report.total_rules(),
                "build finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        BuildOutcome::ValidationFailed(errors) => {
            eprintln!("\nValidation failed:");
            eprintln!("{}", format_validation_errors(&errors));
            error!(
                errors = errors.len(),
                "fix violations or use --skip-validation to bypass"
            );
            Ok(ExitCode::from(1))
        }
        BuildOutcome::FrontmatterRejected(diagnostics) => {
            for diagnostic in &diagnostics {
                eprintln!("  {diagnostic}");
            }
            error!(
                problems = diagnostics.len(),
                "frontmatter rejected (drop --strict-frontmatter to tolerate)"
            );
            Ok(ExitCode::from(1))
        }
    }
}
