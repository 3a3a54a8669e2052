//! # buildprops
//!
//! Finds build properties and package/using items that most projects of a
//! multi-project tree declare identically, moves them into one shared
//! descriptor (`Directory.Build.props` by default) and removes the duplicates.
//! A companion analysis reports dependency version drift and mixed target
//! environments across the same tree.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use build_props::consolidate::{run_unify, AutoConfirm, UnifyRequest};
//! use build_props::core::ConsolidationConfig;
//! use build_props::project::{discover, XmlDeclarationSource};
//! use std::path::Path;
//!
//! let config = ConsolidationConfig::default();
//! let tree = discover(Path::new("App.sln"), &config)?;
//! let request = UnifyRequest {
//!     shared_descriptor: tree.root.join(&config.shared_descriptor),
//!     projects: tree.projects,
//!     config,
//!     preview: true,
//!     force: false,
//! };
//! let outcome = run_unify(&request, &XmlDeclarationSource, &AutoConfirm);
//! println!("{} candidates", outcome.plan.len());
//! # Ok::<(), build_props::core::DiscoveryError>(())
//! ```
//!
//! ## Module Overview
//!
//! - [`core`] - Declarations, signatures, configuration, errors and file I/O
//! - [`project`] - Descriptor documents, declaration sources and discovery
//! - [`consolidate`] - Frequency indexing, consensus selection and migration
//! - [`analyzers`] - Version and target-environment conflict analyzers
//! - [`cli`] - Command-line interface

/// Version and target-environment conflict analyzers
pub mod analyzers;
/// Command-line interface and argument parsing
#[cfg(feature = "cli")]
pub mod cli;
/// Frequency indexing, consensus selection and migration
pub mod consolidate;
/// Core types, configuration, errors and file I/O
pub mod core;
/// Project descriptors, declaration sources and discovery
pub mod project;

pub use crate::core::errors::{BuildPropsError, BuildPropsResult};
pub use analyzers::{AnalysisReport, AnalyzerRegistry};
pub use consolidate::{run_analysis, run_unify, ConsensusPlan, RunStatus, UnifyOutcome};
