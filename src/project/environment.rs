//! Target-environment lookup for the environment-alignment analyzer

use std::path::Path;
use tracing::debug;

use crate::core::constants::well_known;
use crate::project::descriptor::{DescriptorDocument, GroupKind};

/// Resolves the target-environment tag (e.g. a target framework) of a project
pub trait EnvironmentLookup {
    fn target_environment(&self, project: &Path) -> String;
}

/// Reads `TargetFramework`, falling back to `TargetFrameworks`, from the
/// project's unconditional property groups
#[derive(Debug, Default, Clone, Copy)]
pub struct DescriptorEnvironmentLookup;

impl EnvironmentLookup for DescriptorEnvironmentLookup {
    fn target_environment(&self, project: &Path) -> String {
        match DescriptorDocument::load(project) {
            Ok(document) => environment_of(&document),
            Err(err) => {
                debug!("Cannot resolve target environment of {:?}: {}", project, err);
                well_known::UNKNOWN_ENVIRONMENT.to_string()
            }
        }
    }
}

pub fn environment_of(document: &DescriptorDocument) -> String {
    let lookup = |name: &str| {
        document
            .groups()
            .iter()
            .filter(|g| g.kind == GroupKind::Property && !g.is_conditional())
            .flat_map(|g| g.elements.iter())
            .find(|e| e.name == name && !e.is_conditional() && !e.value().is_empty())
            .map(|e| e.value().to_string())
    };

    lookup(well_known::TARGET_FRAMEWORK)
        .or_else(|| lookup(well_known::TARGET_FRAMEWORKS))
        .unwrap_or_else(|| well_known::UNKNOWN_ENVIRONMENT.to_string())
}
