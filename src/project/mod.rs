//! Project model: descriptor documents and the store that loads and saves
//! them, the declaration source built on them, target-environment lookup and
//! project discovery.

pub mod descriptor;
pub mod discovery;
pub mod environment;
pub mod source;
pub mod store;

pub use descriptor::{DescriptorDocument, DescriptorElement, DescriptorGroup, GroupKind};
pub use discovery::{discover, Discovery};
pub use environment::{DescriptorEnvironmentLookup, EnvironmentLookup};
pub use source::{dependency_references, DeclarationSource, XmlDeclarationSource};
pub use store::{DescriptorStore, FileStore};
