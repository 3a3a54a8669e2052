//! Frequency indexing of declarations across projects

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::config::ConsolidationConfig;
use crate::core::errors::error_chain;
use crate::core::types::{
    file_name, ItemDeclaration, ItemIdentity, ProjectDeclarations, PropertyDeclaration, Signature,
    Warning,
};
use crate::project::source::DeclarationSource;

/// Declaration that can be indexed by identity and signature
pub trait Indexed {
    type Identity: Ord + Clone + std::fmt::Debug;

    fn identity(&self) -> Self::Identity;
    fn signature(&self) -> Signature;
    fn project_path(&self) -> &Path;
}

impl Indexed for PropertyDeclaration {
    type Identity = String;

    fn identity(&self) -> String {
        self.name.clone()
    }

    fn signature(&self) -> Signature {
        PropertyDeclaration::signature(self)
    }

    fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Indexed for ItemDeclaration {
    type Identity = ItemIdentity;

    fn identity(&self) -> ItemIdentity {
        ItemDeclaration::identity(self)
    }

    fn signature(&self) -> Signature {
        ItemDeclaration::signature(self)
    }

    fn project_path(&self) -> &Path {
        &self.project_path
    }
}

/// Declarations sharing an exact identity and signature, in project order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket<D> {
    declarations: Vec<D>,
    projects: Vec<PathBuf>,
}

impl<D: Indexed> Bucket<D> {
    fn new() -> Self {
        Self {
            declarations: Vec::new(),
            projects: Vec::new(),
        }
    }

    fn push(&mut self, declaration: D) {
        if !self.projects.iter().any(|p| p == declaration.project_path()) {
            self.projects.push(declaration.project_path().to_path_buf());
        }
        self.declarations.push(declaration);
    }

    pub fn declarations(&self) -> &[D] {
        &self.declarations
    }

    /// Distinct projects declaring this exact identity and signature
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn projects(&self) -> &[PathBuf] {
        &self.projects
    }
}

/// Map from `(identity, signature)` to the declarations carrying it.
/// Iteration is ordered by identity, then signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceIndex<D: Indexed> {
    buckets: BTreeMap<(D::Identity, Signature), Bucket<D>>,
}

impl<D: Indexed> Default for OccurrenceIndex<D> {
    fn default() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }
}

impl<D: Indexed> OccurrenceIndex<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, declaration: D) {
        let key = (declaration.identity(), declaration.signature());
        self.buckets
            .entry(key)
            .or_insert_with(Bucket::new)
            .push(declaration);
    }

    pub fn get(&self, identity: &D::Identity, signature: &Signature) -> Option<&Bucket<D>> {
        self.buckets.get(&(identity.clone(), signature.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&D::Identity, &Signature, &Bucket<D>)> {
        self.buckets
            .iter()
            .map(|((identity, signature), bucket)| (identity, signature, bucket))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

pub type PropertyIndex = OccurrenceIndex<PropertyDeclaration>;
pub type ItemIndex = OccurrenceIndex<ItemDeclaration>;

/// Both occurrence indexes of one run, plus what happened while building them
#[derive(Debug, Clone, Default)]
pub struct DeclarationIndex {
    pub properties: PropertyIndex,
    pub items: ItemIndex,
    /// Every project handed to the indexer, including ones that failed to parse
    pub total_projects: usize,
    /// Projects whose declarations were read
    pub indexed_projects: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Builds occurrence indexes, leaving out conditional declarations,
/// per-project properties and item kinds that are not consolidated
#[derive(Debug, Clone)]
pub struct FrequencyIndexer {
    excluded_properties: HashSet<String>,
    item_kinds: HashSet<String>,
}

impl FrequencyIndexer {
    pub fn new(config: &ConsolidationConfig) -> Self {
        Self {
            excluded_properties: config.excluded_property_set(),
            item_kinds: config.item_kinds.iter().cloned().collect(),
        }
    }

    /// Index every project in order. A project that cannot be read is
    /// recorded as a warning and skipped.
    pub fn index(&self, projects: &[PathBuf], source: &dyn DeclarationSource) -> DeclarationIndex {
        let mut index = DeclarationIndex {
            total_projects: projects.len(),
            ..Default::default()
        };

        for project in projects {
            match source.declarations(project) {
                Ok(declarations) => {
                    self.index_project(declarations, &mut index);
                    index.indexed_projects.push(project.clone());
                }
                Err(err) => {
                    let warning = Warning::ParseFailure {
                        project: file_name(project),
                        message: error_chain(&err),
                    };
                    warn!("{}", warning);
                    index.warnings.push(warning);
                }
            }
        }

        debug!(
            "Indexed {} of {} projects: {} property buckets, {} item buckets",
            index.indexed_projects.len(),
            index.total_projects,
            index.properties.len(),
            index.items.len()
        );
        index
    }

    pub fn index_project(&self, declarations: ProjectDeclarations, index: &mut DeclarationIndex) {
        for property in declarations.properties {
            if self.accepts_property(&property) {
                index.properties.insert(property);
            }
        }
        for item in declarations.items {
            if self.accepts_item(&item) {
                index.items.insert(item);
            }
        }
    }

    pub fn accepts_property(&self, property: &PropertyDeclaration) -> bool {
        !property.conditional
            && !self
                .excluded_properties
                .contains(&property.name.to_ascii_lowercase())
    }

    pub fn accepts_item(&self, item: &ItemDeclaration) -> bool {
        !item.conditional && self.item_kinds.contains(&item.item_type)
    }
}
