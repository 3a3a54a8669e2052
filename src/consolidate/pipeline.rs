//! Entry points tying the consensus engine and the analyzers together

use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use super::consensus::{self, ConsensusPlan};
use super::executor::{self, failure_warning};
use super::index::FrequencyIndexer;
use crate::analyzers::{AnalysisReport, AnalyzerRegistry};
use crate::core::config::ConsolidationConfig;
use crate::core::errors::error_chain;
use crate::core::types::{file_name, Warning};
use crate::project::source::{dependency_references, DeclarationSource};
use crate::project::store::{DescriptorStore, FileStore};

/// Final state of a run, mapped to a process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    /// Nothing to work on: the path is missing, it holds no projects, or
    /// none could be read
    NoInput,
    /// A file could not be updated
    UnexpectedFailure,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::UnexpectedFailure => 1,
            Self::NoInput => 2,
        }
    }
}

/// Asked before anything is written, unless the run is forced
pub trait ConfirmationGate {
    fn confirm(&self, plan: &ConsensusPlan) -> bool;
}

/// Gate that always agrees
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl ConfirmationGate for AutoConfirm {
    fn confirm(&self, _plan: &ConsensusPlan) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct UnifyRequest {
    /// Projects in discovery order
    pub projects: Vec<PathBuf>,
    /// Resolved location of the shared descriptor
    pub shared_descriptor: PathBuf,
    pub config: ConsolidationConfig,
    /// Compute and report candidates without touching any file
    pub preview: bool,
    /// Skip the confirmation gate
    pub force: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnifyOutcome {
    pub status: RunStatus,
    pub plan: ConsensusPlan,
    pub warnings: Vec<Warning>,
    pub files_written: Vec<PathBuf>,
    /// Whether the executor ran
    pub applied: bool,
    pub projects_indexed: usize,
    pub declarations_removed: usize,
}

impl UnifyOutcome {
    fn new(status: RunStatus, plan: ConsensusPlan) -> Self {
        Self {
            status,
            plan,
            warnings: Vec::new(),
            files_written: Vec::new(),
            applied: false,
            projects_indexed: 0,
            declarations_removed: 0,
        }
    }
}

/// Index, select and, unless previewing or declined, apply the plan.
///
/// Candidates the shared descriptor already sets to another value are
/// withheld and reported; the shared value is never replaced. A failure to
/// update the shared descriptor stops the run before any project is pruned,
/// so no declaration is removed without its consolidated copy in place.
pub fn run_unify(
    request: &UnifyRequest,
    source: &dyn DeclarationSource,
    gate: &dyn ConfirmationGate,
) -> UnifyOutcome {
    run_unify_in(request, source, &FileStore, gate)
}

/// [`run_unify`] with the executor loading and saving through `store`
pub fn run_unify_in(
    request: &UnifyRequest,
    source: &dyn DeclarationSource,
    store: &dyn DescriptorStore,
    gate: &dyn ConfirmationGate,
) -> UnifyOutcome {
    let threshold = request.config.threshold;
    if request.projects.is_empty() {
        info!("No projects found");
        return UnifyOutcome::new(RunStatus::NoInput, consensus::select(&Default::default(), threshold));
    }

    let index = FrequencyIndexer::new(&request.config).index(&request.projects, source);
    let plan = consensus::select(&index, threshold);
    let mut outcome = UnifyOutcome::new(RunStatus::Success, plan);
    outcome.projects_indexed = index.indexed_projects.len();
    outcome.warnings = index.warnings;

    if index.indexed_projects.is_empty() {
        warn!("None of the {} projects could be read", index.total_projects);
        outcome.status = RunStatus::NoInput;
        return outcome;
    }

    match executor::withhold_shared_conflicts(&mut outcome.plan, &request.shared_descriptor, store) {
        Ok(conflicts) => outcome.warnings.extend(conflicts),
        Err(err) => {
            let warning = failure_warning(&request.shared_descriptor, &err);
            warn!("{}; projects left unchanged", warning);
            outcome.warnings.push(warning);
            outcome.status = RunStatus::UnexpectedFailure;
            return outcome;
        }
    }

    info!(
        "{} properties and {} items shared by at least {} of {} projects",
        outcome.plan.properties.len(),
        outcome.plan.items.len(),
        outcome.plan.required_count,
        outcome.plan.total_projects
    );

    if outcome.plan.is_empty() {
        info!("Nothing to consolidate");
        return outcome;
    }
    if request.preview {
        info!("Preview only, no files changed");
        return outcome;
    }
    if !request.force && !gate.confirm(&outcome.plan) {
        info!("Consolidation cancelled");
        return outcome;
    }

    outcome.applied = true;
    match executor::merge_into_shared_in(&outcome.plan, &request.shared_descriptor, store) {
        Ok(summary) => {
            if summary.written {
                outcome.files_written.push(summary.path);
            }
        }
        Err(err) => {
            let warning = failure_warning(&request.shared_descriptor, &err);
            warn!("{}; projects left unchanged", warning);
            outcome.warnings.push(warning);
            outcome.status = RunStatus::UnexpectedFailure;
            return outcome;
        }
    }

    let report = executor::prune_projects_in(&outcome.plan, &index.indexed_projects, store);
    outcome
        .files_written
        .extend(report.files_written().map(|p| p.to_path_buf()));
    outcome.declarations_removed = report.declarations_removed();
    outcome.warnings.extend(report.warnings);
    if report.failures > 0 {
        outcome.status = RunStatus::UnexpectedFailure;
    }
    outcome
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub status: RunStatus,
    pub report: AnalysisReport,
    pub warnings: Vec<Warning>,
}

/// Collect package references from every readable project and run each
/// registered analyzer over them
pub fn run_analysis(
    projects: &[PathBuf],
    source: &dyn DeclarationSource,
    registry: &AnalyzerRegistry<'_>,
) -> AnalysisOutcome {
    let mut warnings = Vec::new();
    let mut references = Vec::new();
    let mut scanned = 0;

    for project in projects {
        match source.declarations(project) {
            Ok(declarations) => {
                references.extend(dependency_references(&declarations));
                scanned += 1;
            }
            Err(err) => {
                let warning = Warning::ParseFailure {
                    project: file_name(project),
                    message: error_chain(&err),
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    let report = registry.analyze(scanned, &references);
    let status = if scanned == 0 {
        RunStatus::NoInput
    } else {
        RunStatus::Success
    };
    info!(
        "Scanned {} projects, {} package references, {} issues",
        report.projects_scanned,
        report.total_package_references,
        report.total_issues()
    );
    AnalysisOutcome {
        status,
        report,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::source::testing::MemorySource;
    use std::cell::Cell;

    struct Decline(Cell<usize>);

    impl ConfirmationGate for Decline {
        fn confirm(&self, _plan: &ConsensusPlan) -> bool {
            self.0.set(self.0.get() + 1);
            false
        }
    }

    fn request(projects: &[&str]) -> UnifyRequest {
        UnifyRequest {
            projects: projects.iter().map(PathBuf::from).collect(),
            shared_descriptor: PathBuf::from("/nonexistent/Directory.Build.props"),
            config: ConsolidationConfig::default(),
            preview: false,
            force: false,
        }
    }

    fn shared_source() -> MemorySource {
        MemorySource::new()
            .property("A.csproj", "Nullable", "enable")
            .property("B.csproj", "Nullable", "enable")
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunStatus::Success.exit_code(), 0);
        assert_eq!(RunStatus::UnexpectedFailure.exit_code(), 1);
        assert_eq!(RunStatus::NoInput.exit_code(), 2);
    }

    #[test]
    fn test_empty_project_list_is_no_input() {
        let outcome = run_unify(&request(&[]), &MemorySource::new(), &AutoConfirm);
        assert_eq!(outcome.status, RunStatus::NoInput);
        assert!(outcome.plan.is_empty());
    }

    #[test]
    fn test_unreadable_tree_is_no_input() {
        let source = MemorySource::new().broken("A.csproj", "bad");
        let outcome = run_unify(&request(&["A.csproj"]), &source, &AutoConfirm);
        assert_eq!(outcome.status, RunStatus::NoInput);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_preview_skips_gate_and_writes() {
        let gate = Decline(Cell::new(0));
        let mut req = request(&["A.csproj", "B.csproj"]);
        req.preview = true;
        let outcome = run_unify(&req, &shared_source(), &gate);
        assert_eq!(outcome.status, RunStatus::Success);
        assert_eq!(outcome.plan.properties.len(), 1);
        assert!(!outcome.applied);
        assert_eq!(gate.0.get(), 0);
    }

    #[test]
    fn test_declined_confirmation_writes_nothing() {
        let gate = Decline(Cell::new(0));
        let outcome = run_unify(&request(&["A.csproj", "B.csproj"]), &shared_source(), &gate);
        assert_eq!(outcome.status, RunStatus::Success);
        assert!(!outcome.applied);
        assert!(outcome.files_written.is_empty());
        assert_eq!(gate.0.get(), 1);
    }

    #[test]
    fn test_shared_descriptor_failure_stops_pruning() {
        let mut req = request(&["A.csproj", "B.csproj"]);
        req.force = true;
        let outcome = run_unify(&req, &shared_source(), &Decline(Cell::new(0)));
        assert!(outcome.applied);
        assert_eq!(outcome.status, RunStatus::UnexpectedFailure);
        assert_eq!(outcome.declarations_removed, 0);
        assert!(matches!(
            outcome.warnings.last(),
            Some(Warning::PersistenceFailure { file, .. }) if file == "Directory.Build.props"
        ));
    }

    #[test]
    fn test_project_save_failure_ends_in_unexpected_failure() {
        use crate::project::source::XmlDeclarationSource;
        use crate::project::store::testing::FailingSave;
        use std::fs;

        let dir = tempfile::TempDir::new().unwrap();
        let projects: Vec<PathBuf> = ["A.csproj", "B.csproj"]
            .iter()
            .map(|name| dir.path().join(name))
            .collect();
        for (i, project) in projects.iter().enumerate() {
            fs::write(
                project,
                format!("<Project>\n  <PropertyGroup>\n    <Nullable>enable</Nullable>\n    <Other>{i}</Other>\n  </PropertyGroup>\n</Project>\n"),
            )
            .unwrap();
        }
        let req = UnifyRequest {
            projects: projects.clone(),
            shared_descriptor: dir.path().join("Directory.Build.props"),
            config: ConsolidationConfig::default(),
            preview: false,
            force: true,
        };
        let store = FailingSave {
            target: projects[0].clone(),
        };

        let outcome = run_unify_in(&req, &XmlDeclarationSource, &store, &AutoConfirm);
        assert_eq!(outcome.status, RunStatus::UnexpectedFailure);
        assert!(matches!(
            &outcome.warnings[..],
            [Warning::PersistenceFailure { file, .. }] if file == "A.csproj"
        ));
        assert_eq!(outcome.declarations_removed, 1);
        assert_eq!(
            outcome.files_written,
            vec![req.shared_descriptor.clone(), projects[1].clone()]
        );
        assert!(fs::read_to_string(&projects[0]).unwrap().contains("<Nullable>enable</Nullable>"));
        assert!(!fs::read_to_string(&projects[1]).unwrap().contains("Nullable"));
    }

    #[test]
    fn test_unreadable_shared_descriptor_stops_before_writing() {
        use std::fs;

        let dir = tempfile::TempDir::new().unwrap();
        let shared = dir.path().join("Directory.Build.props");
        fs::write(&shared, "<Project><PropertyGroup></Project>").unwrap();
        let mut req = request(&["A.csproj", "B.csproj"]);
        req.shared_descriptor = shared.clone();
        req.preview = true;

        let outcome = run_unify(&req, &shared_source(), &AutoConfirm);
        assert_eq!(outcome.status, RunStatus::UnexpectedFailure);
        assert!(!outcome.applied);
        assert!(matches!(
            outcome.warnings.last(),
            Some(Warning::ParseFailure { project, .. }) if project == "Directory.Build.props"
        ));
        assert_eq!(fs::read_to_string(&shared).unwrap(), "<Project><PropertyGroup></Project>");
    }

    #[test]
    fn test_analysis_counts_only_readable_projects() {
        let source = MemorySource::new()
            .item("A.csproj", "PackageReference", "PackageX", &[("Version", "1.0")])
            .item("B.csproj", "PackageReference", "PackageX", &[("Version", "2.0")])
            .broken("C.csproj", "bad");
        let projects: Vec<PathBuf> = ["A.csproj", "B.csproj", "C.csproj"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let lookup = crate::project::environment::DescriptorEnvironmentLookup;
        let registry = AnalyzerRegistry::standard(&lookup);

        let outcome = run_analysis(&projects, &source, &registry);
        assert_eq!(outcome.status, RunStatus::Success);
        assert_eq!(outcome.report.projects_scanned, 2);
        assert_eq!(outcome.report.total_package_references, 2);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.report.has_issues());
    }
}
