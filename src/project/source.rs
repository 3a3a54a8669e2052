//! Declaration sources: turn project descriptors into property and item
//! declarations for the consensus engine and the dependency analyzers.

use std::path::Path;

use crate::core::constants::{item_kinds, well_known};
use crate::core::errors::DescriptorError;
use crate::core::types::{
    DependencyReference, ItemDeclaration, ProjectDeclarations, PropertyDeclaration,
};
use crate::project::descriptor::{DescriptorDocument, GroupKind};

/// Yields the declarations of one project, in document order.
///
/// Parse failures are returned per project so a batch can skip the project
/// and carry on.
pub trait DeclarationSource {
    fn declarations(&self, project: &Path) -> Result<ProjectDeclarations, DescriptorError>;
}

/// Reads declarations straight from the descriptor XML, without evaluation
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlDeclarationSource;

impl DeclarationSource for XmlDeclarationSource {
    fn declarations(&self, project: &Path) -> Result<ProjectDeclarations, DescriptorError> {
        let document = DescriptorDocument::load(project)?;
        Ok(declarations_of(&document, project))
    }
}

/// Extract declarations from an already loaded document. Items without an
/// `Include` (updates, removals) carry no identity and are skipped.
pub fn declarations_of(document: &DescriptorDocument, project: &Path) -> ProjectDeclarations {
    let mut declarations = ProjectDeclarations {
        project_path: project.to_path_buf(),
        ..Default::default()
    };

    for group in document.groups() {
        let group_conditional = group.is_conditional();
        match group.kind {
            GroupKind::Property => {
                for element in &group.elements {
                    declarations.properties.push(PropertyDeclaration {
                        name: element.name.clone(),
                        value: element.value().to_string(),
                        project_path: project.to_path_buf(),
                        conditional: group_conditional || element.is_conditional(),
                    });
                }
            }
            GroupKind::Item => {
                for element in &group.elements {
                    let Some(include) = element.include() else {
                        continue;
                    };
                    declarations.items.push(ItemDeclaration {
                        item_type: element.name.clone(),
                        identifier: include.to_string(),
                        metadata: element.metadata(),
                        project_path: project.to_path_buf(),
                        conditional: group_conditional || element.is_conditional(),
                    });
                }
            }
        }
    }

    declarations
}

/// Non-conditional package references of one project. References without a
/// version are kept with an empty version string.
pub fn dependency_references(declarations: &ProjectDeclarations) -> Vec<DependencyReference> {
    declarations
        .items
        .iter()
        .filter(|item| !item.conditional && item.item_type == item_kinds::PACKAGE_REFERENCE)
        .map(|item| DependencyReference {
            package_name: item.identifier.clone(),
            version: item
                .metadata
                .get(well_known::VERSION)
                .unwrap_or_default()
                .to_string(),
            project_path: item.project_path.clone(),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory declaration source for unit tests

    use super::*;
    use crate::core::types::Metadata;
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[derive(Default)]
    pub struct MemorySource {
        projects: HashMap<PathBuf, ProjectDeclarations>,
        broken: HashMap<PathBuf, String>,
    }

    impl MemorySource {
        pub fn new() -> Self {
            Self::default()
        }

        fn entry(&mut self, path: &str) -> &mut ProjectDeclarations {
            self.projects
                .entry(PathBuf::from(path))
                .or_insert_with(|| ProjectDeclarations {
                    project_path: PathBuf::from(path),
                    ..Default::default()
                })
        }

        /// Register a project with no declarations
        pub fn project(mut self, path: &str) -> Self {
            self.entry(path);
            self
        }

        pub fn property(mut self, path: &str, name: &str, value: &str) -> Self {
            self.entry(path).properties.push(PropertyDeclaration {
                name: name.to_string(),
                value: value.to_string(),
                project_path: PathBuf::from(path),
                conditional: false,
            });
            self
        }

        pub fn conditional_property(mut self, path: &str, name: &str, value: &str) -> Self {
            self.entry(path).properties.push(PropertyDeclaration {
                name: name.to_string(),
                value: value.to_string(),
                project_path: PathBuf::from(path),
                conditional: true,
            });
            self
        }

        pub fn item(
            mut self,
            path: &str,
            item_type: &str,
            identifier: &str,
            metadata: &[(&str, &str)],
        ) -> Self {
            self.entry(path).items.push(ItemDeclaration {
                item_type: item_type.to_string(),
                identifier: identifier.to_string(),
                metadata: metadata.iter().copied().collect::<Metadata>(),
                project_path: PathBuf::from(path),
                conditional: false,
            });
            self
        }

        pub fn broken(mut self, path: &str, message: &str) -> Self {
            self.broken.insert(PathBuf::from(path), message.to_string());
            self
        }
    }

    impl DeclarationSource for MemorySource {
        fn declarations(&self, project: &Path) -> Result<ProjectDeclarations, DescriptorError> {
            if let Some(message) = self.broken.get(project) {
                return Err(DescriptorError::malformed(
                    &project.display().to_string(),
                    0,
                    message,
                ));
            }
            self.projects
                .get(project)
                .cloned()
                .ok_or_else(|| DescriptorError::MissingRoot {
                    context: project.display().to_string(),
                })
        }
    }
}
