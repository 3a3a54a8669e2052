//! Detects trees whose projects target more than one environment

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::types::{AnalysisIssue, AnalyzerResult, IssueSeverity};
use super::Analyzer;
use crate::core::types::{file_name, DependencyReference};
use crate::project::environment::EnvironmentLookup;

pub const NAME: &str = "Environment Alignment";
pub const MULTIPLE_ENVIRONMENTS: &str = "Multiple Target Environments";

/// Resolves the target environment of every project that references a
/// package and warns when more than one environment is in use
pub struct EnvironmentAlignmentAnalyzer<'a> {
    lookup: &'a dyn EnvironmentLookup,
}

impl<'a> EnvironmentAlignmentAnalyzer<'a> {
    pub fn new(lookup: &'a dyn EnvironmentLookup) -> Self {
        Self { lookup }
    }
}

impl Analyzer for EnvironmentAlignmentAnalyzer<'_> {
    fn name(&self) -> &str {
        NAME
    }

    fn analyze(&self, references: &[DependencyReference]) -> AnalyzerResult {
        let projects: BTreeSet<&Path> = references.iter().map(|r| r.project_path.as_path()).collect();

        let mut by_environment: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for project in projects {
            by_environment
                .entry(self.lookup.target_environment(project))
                .or_default()
                .push(file_name(project));
        }

        if by_environment.len() < 2 {
            return AnalyzerResult::new(NAME, Vec::new());
        }

        let environments: Vec<&str> = by_environment.keys().map(String::as_str).collect();
        let description = format!(
            "Tree uses {} different target environments: {}. Package versions must be compatible with all of them.",
            environments.len(),
            environments.join(", ")
        );
        let affected = by_environment.into_values().flatten().collect();
        AnalyzerResult::new(
            NAME,
            vec![AnalysisIssue::new(
                MULTIPLE_ENVIRONMENTS,
                description,
                affected,
                IssueSeverity::Warning,
            )],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    struct FixedLookup(HashMap<PathBuf, String>);

    impl EnvironmentLookup for FixedLookup {
        fn target_environment(&self, project: &Path) -> String {
            self.0.get(project).cloned().unwrap_or_else(|| "unknown".to_string())
        }
    }

    fn lookup(entries: &[(&str, &str)]) -> FixedLookup {
        FixedLookup(
            entries
                .iter()
                .map(|(p, env)| (PathBuf::from(p), env.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_single_environment_is_clean() {
        let lookup = lookup(&[("/a/A.csproj", "net8.0"), ("/b/B.csproj", "net8.0")]);
        let result = EnvironmentAlignmentAnalyzer::new(&lookup).analyze(&[
            DependencyReference::new("X", "1.0", "/a/A.csproj"),
            DependencyReference::new("Y", "1.0", "/b/B.csproj"),
        ]);
        assert!(!result.has_issues());
    }

    #[test]
    fn test_multiple_environments_raise_one_warning() {
        let lookup = lookup(&[
            ("/a/A.csproj", "net8.0"),
            ("/b/B.csproj", "net48"),
            ("/c/C.csproj", "net8.0"),
        ]);
        let result = EnvironmentAlignmentAnalyzer::new(&lookup).analyze(&[
            DependencyReference::new("X", "1.0", "/c/C.csproj"),
            DependencyReference::new("X", "1.0", "/a/A.csproj"),
            DependencyReference::new("Y", "1.0", "/a/A.csproj"),
            DependencyReference::new("Y", "1.0", "/b/B.csproj"),
        ]);

        assert_eq!(result.analyzer_name, "Environment Alignment");
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.subject(), "Multiple Target Environments");
        assert_eq!(issue.severity(), IssueSeverity::Warning);
        assert!(issue.description().contains("net48, net8.0"));
        assert_eq!(issue.affected_projects(), ["B.csproj", "A.csproj", "C.csproj"]);
    }

    #[test]
    fn test_no_references_no_lookup() {
        let lookup = lookup(&[]);
        let result = EnvironmentAlignmentAnalyzer::new(&lookup).analyze(&[]);
        assert!(!result.has_issues());
    }
}
