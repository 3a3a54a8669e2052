pub mod args;
pub mod commands;
pub mod render;

pub use args::{AnalyzeArgs, Cli, Commands, OutputFormat, UnifyArgs};

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::consolidate::RunStatus;
use commands::analyze::AnalyzeCommand;
use commands::unify::UnifyCommand;
use commands::Command;

/// Parse arguments, run the command and return the process exit code
pub fn run_cli() -> i32 {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli.command) {
        Ok(status) => status.exit_code(),
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            RunStatus::UnexpectedFailure.exit_code()
        }
    }
}

fn execute(command: Commands) -> Result<RunStatus> {
    match command {
        Commands::Unify(args) => UnifyCommand::new(args).execute(),
        Commands::Analyze(args) => AnalyzeCommand::new(args).execute(),
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("build_props={}", log_level)));
    // Logs go to stderr so stdout stays parseable with --format json
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_path_exits_with_no_input() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        let missing = missing.to_str().unwrap();

        for args in [
            vec!["buildprops", "unify", missing, "--dry-run"],
            vec!["buildprops", "analyze", missing],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            let status = execute(cli.command).unwrap();
            assert_eq!(status, RunStatus::NoInput);
            assert_eq!(status.exit_code(), 2);
        }
    }
}
