//! Explicit registry of the conflict analyzers run over a tree

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::environment_analyzer::EnvironmentAlignmentAnalyzer;
use super::types::AnalysisReport;
use super::version_analyzer::VersionInconsistencyAnalyzer;
use super::Analyzer;
use crate::core::types::DependencyReference;
use crate::project::environment::EnvironmentLookup;

/// Built-in analyzers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalyzerKind {
    VersionInconsistency,
    EnvironmentAlignment,
}

impl AnalyzerKind {
    pub const ALL: [AnalyzerKind; 2] = [Self::VersionInconsistency, Self::EnvironmentAlignment];
}

/// Analyzers in registration order
pub struct AnalyzerRegistry<'a> {
    analyzers: Vec<Box<dyn Analyzer + 'a>>,
}

impl<'a> AnalyzerRegistry<'a> {
    pub fn new() -> Self {
        Self {
            analyzers: Vec::new(),
        }
    }

    /// Every built-in analyzer
    pub fn standard(lookup: &'a dyn EnvironmentLookup) -> Self {
        Self::with_kinds(&AnalyzerKind::ALL, lookup)
    }

    pub fn with_kinds(kinds: &[AnalyzerKind], lookup: &'a dyn EnvironmentLookup) -> Self {
        let mut registry = Self::new();
        for kind in kinds {
            match kind {
                AnalyzerKind::VersionInconsistency => {
                    registry.register(VersionInconsistencyAnalyzer::new())
                }
                AnalyzerKind::EnvironmentAlignment => {
                    registry.register(EnvironmentAlignmentAnalyzer::new(lookup))
                }
            }
        }
        registry
    }

    pub fn register(&mut self, analyzer: impl Analyzer + 'a) {
        self.analyzers.push(Box::new(analyzer));
    }

    pub fn names(&self) -> Vec<&str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Run every analyzer over the same reference list
    pub fn analyze(&self, projects_scanned: usize, references: &[DependencyReference]) -> AnalysisReport {
        let results = self
            .analyzers
            .iter()
            .map(|analyzer| {
                let result = analyzer.analyze(references);
                debug!("{}: {} issues", analyzer.name(), result.issues.len());
                result
            })
            .collect();
        AnalysisReport {
            projects_scanned,
            total_package_references: references.len(),
            results,
        }
    }
}

impl Default for AnalyzerRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{AnalysisIssue, AnalyzerResult, IssueSeverity};
    use std::path::Path;

    struct SameEverywhere;

    impl EnvironmentLookup for SameEverywhere {
        fn target_environment(&self, _project: &Path) -> String {
            "net8.0".to_string()
        }
    }

    /// Flags every package named "Legacy"
    struct LegacyPackages;

    impl Analyzer for LegacyPackages {
        fn name(&self) -> &str {
            "Legacy Packages"
        }

        fn analyze(&self, references: &[DependencyReference]) -> AnalyzerResult {
            let issues = references
                .iter()
                .filter(|r| r.package_name == "Legacy")
                .map(|r| AnalysisIssue::new("Legacy", "deprecated", vec![r.project_name()], IssueSeverity::Warning))
                .collect();
            AnalyzerResult::new(self.name(), issues)
        }
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = AnalyzerRegistry::standard(&SameEverywhere);
        assert_eq!(registry.names(), vec!["Version Inconsistencies", "Environment Alignment"]);
    }

    #[test]
    fn test_custom_analyzer_runs_alongside_builtins() {
        let mut registry = AnalyzerRegistry::with_kinds(&[AnalyzerKind::VersionInconsistency], &SameEverywhere);
        registry.register(LegacyPackages);

        let report = registry.analyze(
            2,
            &[
                DependencyReference::new("Legacy", "1.0", "/a/A.csproj"),
                DependencyReference::new("Legacy", "1.0", "/b/B.csproj"),
            ],
        );
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.total_package_references, 2);
        assert_eq!(report.total_issues(), 2);
        assert!(!report.results[0].has_issues());
    }
}
