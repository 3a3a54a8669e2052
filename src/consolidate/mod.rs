//! Cross-project consensus engine
//!
//! [`index`] counts identical declarations across projects, [`consensus`]
//! picks the majority value of each identity that clears the threshold,
//! [`executor`] moves the accepted values into the shared descriptor and
//! [`pipeline`] runs the whole sequence.

pub mod consensus;
pub mod executor;
pub mod index;
pub mod pipeline;

pub use consensus::{required_count, select, Candidate, ConsensusPlan, ItemCandidate, PropertyCandidate};
pub use executor::{
    merge_into_shared, merge_into_shared_in, prune_project, prune_projects, prune_projects_in,
    withhold_shared_conflicts, MergeSummary, PruneReport,
};
pub use index::{DeclarationIndex, FrequencyIndexer, OccurrenceIndex};
pub use pipeline::{
    run_analysis, run_unify, run_unify_in, AnalysisOutcome, AutoConfirm, ConfirmationGate, RunStatus,
    UnifyOutcome, UnifyRequest,
};
