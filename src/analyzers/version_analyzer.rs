//! Detects packages referenced with different versions across projects

use std::collections::HashMap;

use super::types::{AnalysisIssue, AnalyzerResult, IssueSeverity};
use super::Analyzer;
use crate::core::types::DependencyReference;

pub const NAME: &str = "Version Inconsistencies";

/// Groups references by package name, ignoring case, and reports every
/// package declared with more than one version string
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionInconsistencyAnalyzer;

/// References of one package, in the order they were seen
struct PackageGroup<'r> {
    /// Casing of the first reference seen
    display_name: &'r str,
    references: Vec<&'r DependencyReference>,
}

impl VersionInconsistencyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    fn group<'r>(references: &'r [DependencyReference]) -> Vec<PackageGroup<'r>> {
        let mut groups: Vec<PackageGroup<'r>> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for reference in references {
            let key = reference.package_name.to_lowercase();
            let position = *positions.entry(key).or_insert_with(|| {
                groups.push(PackageGroup {
                    display_name: &reference.package_name,
                    references: Vec::new(),
                });
                groups.len() - 1
            });
            groups[position].references.push(reference);
        }
        groups
    }

    fn inspect(group: &PackageGroup<'_>) -> Option<AnalysisIssue> {
        // version -> project names, both in first-seen order
        let mut versions: Vec<(&str, Vec<String>)> = Vec::new();
        for reference in &group.references {
            if reference.version.is_empty() {
                continue;
            }
            let project = reference.project_name();
            match versions.iter_mut().find(|(v, _)| *v == reference.version) {
                Some((_, projects)) => {
                    if !projects.contains(&project) {
                        projects.push(project);
                    }
                }
                None => versions.push((reference.version.as_str(), vec![project])),
            }
        }
        if versions.len() < 2 {
            return None;
        }

        let description = versions
            .iter()
            .map(|(version, projects)| format!("{} ({})", version, projects.join(", ")))
            .collect::<Vec<_>>()
            .join(", ");

        let mut affected: Vec<String> = Vec::new();
        for reference in &group.references {
            let project = reference.project_name();
            if !affected.contains(&project) {
                affected.push(project);
            }
        }

        Some(AnalysisIssue::new(
            group.display_name,
            description,
            affected,
            IssueSeverity::Error,
        ))
    }
}

impl Analyzer for VersionInconsistencyAnalyzer {
    fn name(&self) -> &str {
        NAME
    }

    fn analyze(&self, references: &[DependencyReference]) -> AnalyzerResult {
        let issues = Self::group(references)
            .iter()
            .filter_map(Self::inspect)
            .collect();
        AnalyzerResult::new(NAME, issues)
    }
}
