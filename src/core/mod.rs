//! Core types, settings and I/O shared by the consolidation engine and the
//! conflict analyzers.

pub mod config;
pub mod constants;
pub mod errors;
pub mod io_utils;
pub mod types;

pub use config::{ConfigOverrides, ConsolidationConfig};
pub use errors::{
    BuildPropsError, BuildPropsResult, ConfigError, DescriptorError, DiscoveryError, PersistError,
};
pub use types::{
    DependencyReference, ItemDeclaration, ItemIdentity, Metadata, ProjectDeclarations,
    PropertyDeclaration, Signature, Warning,
};
