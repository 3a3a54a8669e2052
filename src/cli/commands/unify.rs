use anyhow::{Context, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use tracing::warn;

use crate::cli::args::{OutputFormat, UnifyArgs};
use crate::cli::commands::utils::load_tree;
use crate::cli::commands::Command;
use crate::cli::render;
use crate::consolidate::{run_unify, ConfirmationGate, ConsensusPlan, RunStatus, UnifyRequest};
use crate::core::config::ConfigOverrides;
use crate::project::source::XmlDeclarationSource;

pub struct UnifyCommand {
    args: UnifyArgs,
}

impl UnifyCommand {
    pub fn new(args: UnifyArgs) -> Self {
        Self { args }
    }
}

impl Command for UnifyCommand {
    fn execute(&self) -> Result<RunStatus> {
        let overrides = ConfigOverrides {
            threshold: self.args.threshold,
            shared_descriptor: self.args.shared_descriptor.clone(),
        };
        let Some((discovery, config)) = load_tree(&self.args.path, overrides)? else {
            return Ok(RunStatus::NoInput);
        };

        let request = UnifyRequest {
            shared_descriptor: discovery.root.join(&config.shared_descriptor),
            projects: discovery.projects,
            config,
            preview: self.args.dry_run,
            force: self.args.force,
        };
        // A prompt would corrupt JSON output
        let gate: &dyn ConfirmationGate = match self.args.format {
            OutputFormat::Text => &StdinConfirmation,
            OutputFormat::Json => &RequireForce,
        };
        let outcome = run_unify(&request, &XmlDeclarationSource, gate);

        match self.args.format {
            OutputFormat::Text => print!("{}", render::unify_outcome(&outcome, request.preview)),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&outcome)
                    .context("Failed to serialize consolidation outcome")?;
                println!("{}", json);
            }
        }
        Ok(outcome.status)
    }
}

/// Declines every plan; only `--force` applies changes
pub struct RequireForce;

impl ConfirmationGate for RequireForce {
    fn confirm(&self, _plan: &ConsensusPlan) -> bool {
        warn!("Pass --force to apply changes");
        false
    }
}

/// Asks on stdin before writing. When stdin is not a terminal there is
/// nobody to ask, so the run is declined.
pub struct StdinConfirmation;

impl ConfirmationGate for StdinConfirmation {
    fn confirm(&self, plan: &ConsensusPlan) -> bool {
        if atty::isnt(atty::Stream::Stdin) {
            warn!("Not running interactively; pass --force to apply changes");
            return false;
        }

        print!("{}", render::plan_summary(plan));
        print!("\n{} Apply {} changes? [y/N] ", "?".cyan(), plan.len());
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(err) => {
                warn!("Failed to read confirmation: {}", err);
                false
            }
        }
    }
}
