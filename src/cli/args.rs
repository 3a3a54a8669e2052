use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::analyzers::AnalyzerKind;

/// Consolidates duplicated build properties and package references of a
/// multi-project tree into one shared descriptor.
///
/// # Examples
///
/// ```bash
/// # Show what would move into Directory.Build.props
/// buildprops unify ./src --dry-run
///
/// # Apply without prompting, requiring 80% agreement
/// buildprops unify App.sln --threshold 0.8 --force
///
/// # Report version drift and mixed target frameworks as JSON
/// buildprops analyze App.sln --format json
/// ```
#[derive(Parser)]
#[command(name = "buildprops")]
#[command(about = "Consolidate shared project settings into a single build descriptor")]
#[command(version)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Move declarations shared by most projects into the shared descriptor
    Unify(UnifyArgs),

    /// Report dependency conflicts across projects
    Analyze(AnalyzeArgs),
}

#[derive(Args, Clone, Debug)]
pub struct UnifyArgs {
    /// Solution file, project file or directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Fraction of projects that must agree on a value (0 < t <= 1)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// File name of the shared descriptor, created next to the solution
    #[arg(long)]
    pub shared_descriptor: Option<String>,

    /// Show the candidates without changing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Args, Clone, Debug)]
pub struct AnalyzeArgs {
    /// Solution file, project file or directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Run only the given analyzers (repeatable)
    #[arg(long = "analyzer", value_enum)]
    pub analyzers: Vec<AnalyzerArg>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalyzerArg {
    Versions,
    Environments,
}

impl From<AnalyzerArg> for AnalyzerKind {
    fn from(arg: AnalyzerArg) -> Self {
        match arg {
            AnalyzerArg::Versions => AnalyzerKind::VersionInconsistency,
            AnalyzerArg::Environments => AnalyzerKind::EnvironmentAlignment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unify_flags() {
        let cli = Cli::try_parse_from([
            "buildprops",
            "unify",
            "App.sln",
            "--threshold",
            "0.75",
            "--dry-run",
            "--format",
            "json",
        ])
        .unwrap();
        let Commands::Unify(args) = cli.command else {
            panic!("expected unify");
        };
        assert_eq!(args.path, PathBuf::from("App.sln"));
        assert_eq!(args.threshold, Some(0.75));
        assert!(args.dry_run && !args.force);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_analyze_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["buildprops", "-v", "analyze", "--analyzer", "versions"]).unwrap();
        assert!(cli.verbose);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.path, PathBuf::from("."));
        assert_eq!(args.analyzers, vec![AnalyzerArg::Versions]);
    }
}
