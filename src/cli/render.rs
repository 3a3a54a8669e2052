//! Human-readable rendering of run outcomes

use colored::Colorize;
use std::fmt::Write;

use crate::analyzers::{AnalysisReport, IssueSeverity};
use crate::consolidate::{ConsensusPlan, RunStatus, UnifyOutcome};
use crate::core::types::Warning;

pub fn plan_summary(plan: &ConsensusPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} Candidates shared by at least {} of {} projects (threshold {:.0}%)",
        "→".blue(),
        plan.required_count,
        plan.total_projects,
        plan.threshold * 100.0
    );
    if plan.is_empty() {
        let _ = writeln!(out, "  (none)");
        return out;
    }

    if !plan.properties.is_empty() {
        let _ = writeln!(out, "\n{}", "Properties".bold());
        for candidate in &plan.properties {
            let _ = writeln!(
                out,
                "  {} = {}  [{}/{}]",
                candidate.identity.cyan(),
                candidate.representative.value,
                candidate.occurrence_count,
                candidate.total_projects
            );
        }
    }
    if !plan.items.is_empty() {
        let _ = writeln!(out, "\n{}", "Items".bold());
        for candidate in &plan.items {
            let metadata = if candidate.signature.as_str().is_empty() {
                String::new()
            } else {
                format!(" ({})", candidate.signature)
            };
            let _ = writeln!(
                out,
                "  {}{}  [{}/{}]",
                candidate.identity.to_string().cyan(),
                metadata,
                candidate.occurrence_count,
                candidate.total_projects
            );
        }
    }
    out
}

pub fn unify_outcome(outcome: &UnifyOutcome, preview: bool) -> String {
    let mut out = plan_summary(&outcome.plan);
    out.push_str(&warnings(&outcome.warnings));

    let _ = writeln!(out);
    match outcome.status {
        RunStatus::NoInput => {
            let _ = writeln!(out, "{} No readable projects found", "!".yellow());
        }
        RunStatus::UnexpectedFailure => {
            let _ = writeln!(
                out,
                "{} Consolidation incomplete: {} files written",
                "✗".red(),
                outcome.files_written.len()
            );
        }
        RunStatus::Success if outcome.applied => {
            let _ = writeln!(
                out,
                "{} Consolidated {} declarations, removed {} duplicates, {} files written",
                "✓".green(),
                outcome.plan.len(),
                outcome.declarations_removed,
                outcome.files_written.len()
            );
            for file in &outcome.files_written {
                let _ = writeln!(out, "  {}", file.display());
            }
        }
        RunStatus::Success if outcome.plan.is_empty() => {
            let _ = writeln!(out, "{} Nothing to consolidate", "✓".green());
        }
        RunStatus::Success if preview => {
            let _ = writeln!(out, "{} Dry run, no files changed", "→".blue());
        }
        RunStatus::Success => {
            let _ = writeln!(out, "{} Cancelled, no files changed", "!".yellow());
        }
    }
    out
}

pub fn analysis_report(report: &AnalysisReport, run_warnings: &[Warning]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} Scanned {} projects, {} package references",
        "→".blue(),
        report.projects_scanned,
        report.total_package_references
    );

    for result in &report.results {
        let _ = writeln!(out, "\n{}", result.analyzer_name.bold());
        if !result.has_issues() {
            let _ = writeln!(out, "  {} no issues", "✓".green());
            continue;
        }
        for issue in &result.issues {
            let marker = match issue.severity() {
                IssueSeverity::Error => "✗".red(),
                IssueSeverity::Warning => "!".yellow(),
            };
            let _ = writeln!(out, "  {} {}: {}", marker, issue.subject().bold(), issue.description());
            let _ = writeln!(out, "    affects: {}", issue.affected_projects().join(", "));
        }
    }

    out.push_str(&warnings(run_warnings));
    let _ = writeln!(out, "\n{} issues found", report.total_issues());
    out
}

fn warnings(warnings: &[Warning]) -> String {
    let mut out = String::new();
    if warnings.is_empty() {
        return out;
    }
    let _ = writeln!(out, "\n{}", "Warnings".yellow().bold());
    for warning in warnings {
        let _ = writeln!(out, "  {warning}");
    }
    out
}
