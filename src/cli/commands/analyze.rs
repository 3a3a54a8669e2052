use anyhow::{Context, Result};

use crate::analyzers::{AnalyzerKind, AnalyzerRegistry};
use crate::cli::args::{AnalyzeArgs, OutputFormat};
use crate::cli::commands::utils::load_tree;
use crate::cli::commands::Command;
use crate::cli::render;
use crate::consolidate::{run_analysis, RunStatus};
use crate::core::config::ConfigOverrides;
use crate::project::environment::DescriptorEnvironmentLookup;
use crate::project::source::XmlDeclarationSource;

pub struct AnalyzeCommand {
    args: AnalyzeArgs,
}

impl AnalyzeCommand {
    pub fn new(args: AnalyzeArgs) -> Self {
        Self { args }
    }
}

impl Command for AnalyzeCommand {
    fn execute(&self) -> Result<RunStatus> {
        let Some((discovery, _config)) = load_tree(&self.args.path, ConfigOverrides::default())? else {
            return Ok(RunStatus::NoInput);
        };

        let lookup = DescriptorEnvironmentLookup;
        let registry = if self.args.analyzers.is_empty() {
            AnalyzerRegistry::standard(&lookup)
        } else {
            let kinds: Vec<AnalyzerKind> = self.args.analyzers.iter().map(|&a| a.into()).collect();
            AnalyzerRegistry::with_kinds(&kinds, &lookup)
        };

        let outcome = run_analysis(&discovery.projects, &XmlDeclarationSource, &registry);
        match self.args.format {
            OutputFormat::Text => print!(
                "{}",
                render::analysis_report(&outcome.report, &outcome.warnings)
            ),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&outcome)
                    .context("Failed to serialize analysis report")?;
                println!("{}", json);
            }
        }
        Ok(outcome.status)
    }
}
