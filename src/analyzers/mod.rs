//! Conflict analyzers over the flattened dependency references of a tree
//!
//! Analyzers are read-only and independent of the consensus engine: they see
//! only package references and, through an [`EnvironmentLookup`], each
//! project's target environment.
//!
//! [`EnvironmentLookup`]: crate::project::environment::EnvironmentLookup

pub mod environment_analyzer;
pub mod registry;
pub mod types;
pub mod version_analyzer;

use crate::core::types::DependencyReference;

pub use environment_analyzer::EnvironmentAlignmentAnalyzer;
pub use registry::{AnalyzerKind, AnalyzerRegistry};
pub use types::{AnalysisIssue, AnalysisReport, AnalyzerResult, IssueSeverity};
pub use version_analyzer::VersionInconsistencyAnalyzer;

/// A named check over every dependency reference of a tree
pub trait Analyzer {
    fn name(&self) -> &str;

    fn analyze(&self, references: &[DependencyReference]) -> AnalyzerResult;
}
