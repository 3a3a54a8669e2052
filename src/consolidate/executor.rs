//! Migration executor: merges accepted candidates into the shared descriptor
//! and prunes the matching declarations from each project.
//!
//! Every file is loaded into its own [`DescriptorDocument`], edited and saved
//! at most once. Declarations that share a candidate's identity but not its
//! value are never removed; they are reported as mismatches instead.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::consensus::{ConsensusPlan, PlanLookup};
use crate::core::errors::{error_chain, BuildPropsError, DescriptorError};
use crate::core::types::{file_name, ItemIdentity, Warning};
use crate::project::descriptor::{DescriptorDocument, GroupKind};
use crate::project::store::{DescriptorStore, FileStore};

/// What a merge did to the shared descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub path: PathBuf,
    pub created: bool,
    pub written: bool,
    pub properties_updated: usize,
    pub properties_added: usize,
    pub items_written: usize,
}

/// Apply every candidate of `plan` to the shared descriptor at `path`.
///
/// Properties overwrite a same-named property in the first unconditional
/// property group or are appended to it. Items replace every unconditional
/// copy of the same type and identifier. The file is saved once, and only
/// when its content changed.
pub fn merge_into_shared(plan: &ConsensusPlan, path: &Path) -> Result<MergeSummary, BuildPropsError> {
    merge_into_shared_in(plan, path, &FileStore)
}

/// [`merge_into_shared`] against an explicit store
pub fn merge_into_shared_in(
    plan: &ConsensusPlan,
    path: &Path,
    store: &dyn DescriptorStore,
) -> Result<MergeSummary, BuildPropsError> {
    let (mut document, created) = store.load_or_create(path)?;
    let original = document.render();
    let mut summary = MergeSummary {
        path: path.to_path_buf(),
        created,
        written: false,
        properties_updated: 0,
        properties_added: 0,
        items_written: 0,
    };

    if !plan.properties.is_empty() {
        let group = document.ensure_unconditional_group(GroupKind::Property)?;
        for candidate in &plan.properties {
            let value = candidate.representative.value.as_str();
            let existing = document.groups()[group]
                .elements
                .iter()
                .position(|e| e.name == candidate.identity && !e.is_conditional());
            match existing {
                Some(element) => {
                    if document.groups()[group].elements[element].value() != value {
                        document.set_property_value(group, element, value)?;
                        summary.properties_updated += 1;
                    }
                }
                None => {
                    document.append_property(group, &candidate.identity, value)?;
                    summary.properties_added += 1;
                }
            }
        }
    }

    for candidate in &plan.items {
        let copies = unconditional_items(&document, &candidate.identity);
        if let [(g, e)] = copies.as_slice() {
            let current = document.groups()[*g].elements[*e].metadata().signature();
            if current == candidate.signature {
                continue;
            }
        }
        document.remove_elements(&copies)?;
        let group = document.ensure_unconditional_group(GroupKind::Item)?;
        document.append_item(
            group,
            &candidate.identity.item_type,
            &candidate.identity.identifier,
            &candidate.representative.metadata,
        )?;
        summary.items_written += 1;
    }

    if created || document.render() != original {
        store.save(&document, path)?;
        summary.written = true;
        info!(
            "Updated shared descriptor {:?}: {} properties added, {} updated, {} items written",
            path, summary.properties_added, summary.properties_updated, summary.items_written
        );
    } else {
        debug!("Shared descriptor {:?} already up to date", path);
    }

    Ok(summary)
}

fn unconditional_items(document: &DescriptorDocument, identity: &ItemIdentity) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    for (g, group) in document.groups().iter().enumerate() {
        if group.kind != GroupKind::Item || group.is_conditional() {
            continue;
        }
        for (e, element) in group.elements.iter().enumerate() {
            if !element.is_conditional()
                && element.name == identity.item_type
                && element.include() == Some(identity.identifier.as_str())
            {
                found.push((g, e));
            }
        }
    }
    found
}

/// Drop from `plan` every candidate whose identity the shared descriptor at
/// `path` already declares, unconditionally, with a different value. Each
/// dropped candidate is returned as a [`Warning::SharedConflict`].
///
/// A missing shared descriptor conflicts with nothing.
pub fn withhold_shared_conflicts(
    plan: &mut ConsensusPlan,
    path: &Path,
    store: &dyn DescriptorStore,
) -> Result<Vec<Warning>, BuildPropsError> {
    if plan.is_empty() || !path.exists() {
        return Ok(Vec::new());
    }
    let document = store.load(path)?;
    let file = file_name(path);
    let mut conflicts = Vec::new();

    plan.properties.retain(|candidate| {
        let current = document
            .groups()
            .iter()
            .filter(|g| g.kind == GroupKind::Property && !g.is_conditional())
            .flat_map(|g| g.elements.iter())
            .find(|e| {
                e.name == candidate.identity
                    && !e.is_conditional()
                    && e.value() != candidate.representative.value
            });
        match current {
            Some(element) => {
                conflicts.push(Warning::SharedConflict {
                    file: file.clone(),
                    identity: candidate.identity.clone(),
                    current: element.value().to_string(),
                    proposed: candidate.representative.value.clone(),
                });
                false
            }
            None => true,
        }
    });

    plan.items.retain(|candidate| {
        let current = unconditional_items(&document, &candidate.identity)
            .into_iter()
            .map(|(g, e)| document.groups()[g].elements[e].metadata().signature())
            .find(|signature| *signature != candidate.signature);
        match current {
            Some(signature) => {
                conflicts.push(Warning::SharedConflict {
                    file: file.clone(),
                    identity: candidate.identity.to_string(),
                    current: signature.to_string(),
                    proposed: candidate.signature.to_string(),
                });
                false
            }
            None => true,
        }
    });

    for conflict in &conflicts {
        warn!("{}", conflict);
    }
    Ok(conflicts)
}

/// Declarations chosen for removal from one document
#[derive(Debug, Default)]
pub struct Removals {
    elements: Vec<(usize, usize)>,
    touched_groups: BTreeSet<usize>,
}

impl Removals {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}

/// Walk the unconditional groups of `document` and pick the declarations that
/// exactly match a candidate. Identity matches with a different value are
/// pushed to `warnings` and left alone.
pub fn select_removals(
    document: &DescriptorDocument,
    project: &Path,
    lookup: &PlanLookup<'_>,
    warnings: &mut Vec<Warning>,
) -> Removals {
    let mut removals = Removals::default();

    for (g, group) in document.groups().iter().enumerate() {
        if group.is_conditional() {
            continue;
        }
        for (e, element) in group.elements.iter().enumerate() {
            if element.is_conditional() {
                continue;
            }
            let verdict = match group.kind {
                GroupKind::Property => lookup.property(&element.name).map(|candidate| {
                    let found = element.value();
                    if found == candidate.representative.value {
                        Ok(())
                    } else {
                        Err(Warning::ValueMismatch {
                            project: file_name(project),
                            identity: candidate.identity.clone(),
                            expected: candidate.representative.value.clone(),
                            found: found.to_string(),
                        })
                    }
                }),
                GroupKind::Item => element.include().and_then(|include| {
                    let identity = ItemIdentity::new(&element.name, include);
                    lookup.item(&identity).map(|candidate| {
                        let found = element.metadata().signature();
                        if found == candidate.signature {
                            Ok(())
                        } else {
                            Err(Warning::ValueMismatch {
                                project: file_name(project),
                                identity: candidate.identity.to_string(),
                                expected: candidate.signature.to_string(),
                                found: found.to_string(),
                            })
                        }
                    })
                }),
            };

            match verdict {
                Some(Ok(())) => {
                    removals.elements.push((g, e));
                    removals.touched_groups.insert(g);
                }
                Some(Err(mismatch)) => {
                    warn!("{}", mismatch);
                    warnings.push(mismatch);
                }
                None => {}
            }
        }
    }

    removals
}

/// Remove the selected elements, then any unconditional group they left
/// empty. Returns the number of groups removed.
pub fn apply_removals(
    document: &mut DescriptorDocument,
    removals: &Removals,
) -> Result<usize, DescriptorError> {
    document.remove_elements(&removals.elements)?;
    // Element removal never drops a group, so group indices are still valid
    let emptied: Vec<usize> = removals
        .touched_groups
        .iter()
        .copied()
        .filter(|&g| {
            document
                .groups()
                .get(g)
                .is_some_and(|group| group.elements.is_empty() && !group.is_conditional())
        })
        .collect();
    document.remove_groups(&emptied)?;
    Ok(emptied.len())
}

/// Outcome of pruning a single project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPrune {
    pub path: PathBuf,
    pub declarations_removed: usize,
    pub groups_removed: usize,
    pub written: bool,
}

/// Load, prune and save one project. Mismatch warnings land in `warnings`
/// even when saving fails afterwards.
pub fn prune_project(
    plan: &ConsensusPlan,
    project: &Path,
    warnings: &mut Vec<Warning>,
) -> Result<ProjectPrune, BuildPropsError> {
    prune_with_lookup(&plan.lookup(), project, &FileStore, warnings)
}

fn prune_with_lookup(
    lookup: &PlanLookup<'_>,
    project: &Path,
    store: &dyn DescriptorStore,
    warnings: &mut Vec<Warning>,
) -> Result<ProjectPrune, BuildPropsError> {
    let mut document = store.load(project)?;
    let removals = select_removals(&document, project, lookup, warnings);
    let mut outcome = ProjectPrune {
        path: project.to_path_buf(),
        declarations_removed: removals.len(),
        groups_removed: 0,
        written: false,
    };
    if removals.is_empty() {
        return Ok(outcome);
    }

    outcome.groups_removed = apply_removals(&mut document, &removals)?;
    store.save(&document, project)?;
    outcome.written = true;
    debug!(
        "Pruned {:?}: {} declarations, {} empty groups",
        project, outcome.declarations_removed, outcome.groups_removed
    );
    Ok(outcome)
}

/// Aggregate result of pruning a batch of projects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub projects: Vec<ProjectPrune>,
    pub warnings: Vec<Warning>,
    /// Projects whose update could not be read or saved
    pub failures: usize,
}

impl PruneReport {
    pub fn files_written(&self) -> impl Iterator<Item = &Path> {
        self.projects
            .iter()
            .filter(|p| p.written)
            .map(|p| p.path.as_path())
    }

    pub fn declarations_removed(&self) -> usize {
        self.projects.iter().map(|p| p.declarations_removed).sum()
    }
}

/// Prune every project in order. A project that fails to load or save is
/// recorded as a warning and the batch continues.
pub fn prune_projects(plan: &ConsensusPlan, projects: &[PathBuf]) -> PruneReport {
    prune_projects_in(plan, projects, &FileStore)
}

/// [`prune_projects`] against an explicit store
pub fn prune_projects_in(
    plan: &ConsensusPlan,
    projects: &[PathBuf],
    store: &dyn DescriptorStore,
) -> PruneReport {
    let lookup = plan.lookup();
    let mut report = PruneReport::default();

    for project in projects {
        match prune_with_lookup(&lookup, project, store, &mut report.warnings) {
            Ok(outcome) => report.projects.push(outcome),
            Err(err) => {
                let warning = failure_warning(project, &err);
                warn!("{}", warning);
                report.warnings.push(warning);
                report.failures += 1;
            }
        }
    }

    info!(
        "Removed {} consolidated declarations from {} projects",
        report.declarations_removed(),
        report.files_written().count()
    );
    report
}

/// Warning describing a failed file operation
pub fn failure_warning(path: &Path, err: &BuildPropsError) -> Warning {
    let message = error_chain(err);
    match err {
        BuildPropsError::Descriptor(_) => Warning::ParseFailure {
            project: file_name(path),
            message,
        },
        _ => Warning::PersistenceFailure {
            file: file_name(path),
            message,
        },
    }
}
