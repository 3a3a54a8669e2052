//! Conflict analysis result types

use serde::Serialize;

/// How seriously an issue should be taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Builds diverge today
    Error,
    /// Builds may diverge once dependencies are centrally managed
    Warning,
}

/// A single finding. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisIssue {
    subject: String,
    description: String,
    affected_projects: Vec<String>,
    severity: IssueSeverity,
}

impl AnalysisIssue {
    pub fn new(
        subject: impl Into<String>,
        description: impl Into<String>,
        affected_projects: Vec<String>,
        severity: IssueSeverity,
    ) -> Self {
        Self {
            subject: subject.into(),
            description: description.into(),
            affected_projects,
            severity,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn affected_projects(&self) -> &[String] {
        &self.affected_projects
    }

    pub fn severity(&self) -> IssueSeverity {
        self.severity
    }
}

/// Issues reported by one analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzerResult {
    pub analyzer_name: String,
    pub issues: Vec<AnalysisIssue>,
}

impl AnalyzerResult {
    pub fn new(analyzer_name: impl Into<String>, issues: Vec<AnalysisIssue>) -> Self {
        Self {
            analyzer_name: analyzer_name.into(),
            issues,
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Results of every registered analyzer plus scan counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub projects_scanned: usize,
    pub total_package_references: usize,
    pub results: Vec<AnalyzerResult>,
}

impl AnalysisReport {
    pub fn total_issues(&self) -> usize {
        self.results.iter().map(|r| r.issues.len()).sum()
    }

    pub fn has_issues(&self) -> bool {
        self.results.iter().any(AnalyzerResult::has_issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_counts_follow_results() {
        let issue = AnalysisIssue::new("PackageX", "1.0 (A), 2.0 (B)", vec!["A".into(), "B".into()], IssueSeverity::Error);
        let mut report = AnalysisReport {
            projects_scanned: 2,
            total_package_references: 2,
            results: vec![AnalyzerResult::new("Empty", Vec::new())],
        };
        assert!(!report.has_issues());
        assert_eq!(report.total_issues(), 0);

        report.results.push(AnalyzerResult::new("Versions", vec![issue.clone(), issue]));
        assert!(report.has_issues());
        assert_eq!(report.total_issues(), 2);
    }
}
