//! Consensus selection: majority value per identity, gated by a threshold

use serde::Serialize;
use std::collections::HashMap;

use super::index::{DeclarationIndex, Indexed, OccurrenceIndex};
use crate::core::types::{ItemDeclaration, ItemIdentity, PropertyDeclaration, Signature};

/// An identity whose majority value is shared by enough projects to be
/// moved into the shared descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate<K, D> {
    pub identity: K,
    pub signature: Signature,
    pub representative: D,
    pub occurrence_count: usize,
    pub total_projects: usize,
}

pub type PropertyCandidate = Candidate<String, PropertyDeclaration>;
pub type ItemCandidate = Candidate<ItemIdentity, ItemDeclaration>;

/// Accepted candidates of one run, sorted by identity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusPlan {
    pub properties: Vec<PropertyCandidate>,
    pub items: Vec<ItemCandidate>,
    pub total_projects: usize,
    pub threshold: f64,
    pub required_count: usize,
}

impl ConsensusPlan {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len() + self.items.len()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyCandidate> {
        self.properties.iter().find(|c| c.identity == name)
    }

    pub fn item(&self, identity: &ItemIdentity) -> Option<&ItemCandidate> {
        self.items.iter().find(|c| &c.identity == identity)
    }

    /// Hash lookups for callers that check every declaration of a tree
    pub fn lookup(&self) -> PlanLookup<'_> {
        PlanLookup {
            properties: self
                .properties
                .iter()
                .map(|c| (c.identity.as_str(), c))
                .collect(),
            items: self.items.iter().map(|c| (&c.identity, c)).collect(),
        }
    }
}

pub struct PlanLookup<'a> {
    properties: HashMap<&'a str, &'a PropertyCandidate>,
    items: HashMap<&'a ItemIdentity, &'a ItemCandidate>,
}

impl<'a> PlanLookup<'a> {
    pub fn property(&self, name: &str) -> Option<&'a PropertyCandidate> {
        self.properties.get(name).copied()
    }

    pub fn item(&self, identity: &ItemIdentity) -> Option<&'a ItemCandidate> {
        self.items.get(identity).copied()
    }
}

/// `ceil(total * threshold)`. A small tolerance keeps products such as
/// `10 * 0.7 = 7.000000000000001` from rounding up an extra project.
pub fn required_count(total_projects: usize, threshold: f64) -> usize {
    let exact = total_projects as f64 * threshold;
    (exact - 1e-9).ceil().max(0.0) as usize
}

/// Pick the majority signature per identity and keep the ones meeting the
/// threshold. Ties on the maximum count go to the lexicographically smallest
/// signature.
pub fn select(index: &DeclarationIndex, threshold: f64) -> ConsensusPlan {
    let total = index.total_projects;
    let required = required_count(total, threshold);
    ConsensusPlan {
        properties: select_from(&index.properties, total, required),
        items: select_from(&index.items, total, required),
        total_projects: total,
        threshold,
        required_count: required,
    }
}

fn select_from<D: Indexed + Clone>(
    index: &OccurrenceIndex<D>,
    total_projects: usize,
    required: usize,
) -> Vec<Candidate<D::Identity, D>> {
    let mut candidates = Vec::new();
    let mut best: Option<Candidate<D::Identity, D>> = None;

    // Buckets arrive ordered by identity, then signature, so each identity's
    // variants are contiguous and a strict `>` keeps the smallest signature
    // on ties.
    for (identity, signature, bucket) in index.iter() {
        let count = bucket.project_count();
        let Some(representative) = bucket.declarations().first() else {
            continue;
        };

        match &mut best {
            Some(current) if &current.identity == identity => {
                if count > current.occurrence_count {
                    current.signature = signature.clone();
                    current.representative = representative.clone();
                    current.occurrence_count = count;
                }
            }
            _ => {
                if let Some(finished) = best.take() {
                    if finished.occurrence_count >= required {
                        candidates.push(finished);
                    }
                }
                best = Some(Candidate {
                    identity: identity.clone(),
                    signature: signature.clone(),
                    representative: representative.clone(),
                    occurrence_count: count,
                    total_projects,
                });
            }
        }
    }

    if let Some(finished) = best {
        if finished.occurrence_count >= required {
            candidates.push(finished);
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::index::FrequencyIndexer;
    use crate::core::config::ConsolidationConfig;
    use crate::project::source::testing::MemorySource;
    use std::path::PathBuf;
    use test_case::test_case;

    fn index_of(source: &MemorySource, projects: &[&str]) -> DeclarationIndex {
        let projects: Vec<PathBuf> = projects.iter().map(PathBuf::from).collect();
        FrequencyIndexer::new(&ConsolidationConfig::default()).index(&projects, source)
    }

    #[test_case(1, 0.6 => 1 ; "single project always qualifies")]
    #[test_case(5, 0.6 => 3 ; "five projects")]
    #[test_case(10, 0.7 => 7 ; "float product stays exact")]
    #[test_case(3, 1.0 => 3 ; "unanimous")]
    #[test_case(4, 0.5 => 2 ; "half")]
    #[test_case(0, 0.6 => 0 ; "empty tree")]
    fn test_required_count(total: usize, threshold: f64) -> usize {
        required_count(total, threshold)
    }

    #[test]
    fn test_majority_value_selected() {
        let source = MemorySource::new()
            .property("A.csproj", "LangVersion", "latest")
            .property("B.csproj", "LangVersion", "latest")
            .property("C.csproj", "LangVersion", "latest")
            .property("D.csproj", "LangVersion", "10")
            .property("E.csproj", "Nullable", "enable");
        let index = index_of(&source, &["A.csproj", "B.csproj", "C.csproj", "D.csproj", "E.csproj"]);

        let plan = select(&index, 0.6);
        assert_eq!(plan.required_count, 3);
        assert_eq!(plan.properties.len(), 1);
        let candidate = &plan.properties[0];
        assert_eq!(candidate.identity, "LangVersion");
        assert_eq!(candidate.signature.as_str(), "latest");
        assert_eq!(candidate.occurrence_count, 3);
        assert_eq!(candidate.total_projects, 5);
        assert_eq!(candidate.representative.project_path, PathBuf::from("A.csproj"));
    }

    #[test]
    fn test_below_threshold_rejected() {
        let source = MemorySource::new()
            .property("A.csproj", "LangVersion", "latest")
            .property("B.csproj", "LangVersion", "latest")
            .project("C.csproj")
            .project("D.csproj");
        let index = index_of(&source, &["A.csproj", "B.csproj", "C.csproj", "D.csproj"]);
        assert!(select(&index, 0.6).is_empty());
        assert_eq!(select(&index, 0.5).properties.len(), 1);
    }

    #[test]
    fn test_tie_breaks_to_smallest_signature() {
        let source = MemorySource::new()
            .property("A.csproj", "WarningLevel", "5")
            .property("B.csproj", "WarningLevel", "4")
            .property("C.csproj", "WarningLevel", "5")
            .property("D.csproj", "WarningLevel", "4");
        let index = index_of(&source, &["A.csproj", "B.csproj", "C.csproj", "D.csproj"]);
        let plan = select(&index, 0.5);
        assert_eq!(plan.properties.len(), 1);
        assert_eq!(plan.properties[0].signature.as_str(), "4");
        assert_eq!(plan.properties[0].representative.project_path, PathBuf::from("B.csproj"));
    }

    #[test]
    fn test_single_project_edge_case() {
        let source = MemorySource::new().property("Only.csproj", "Deterministic", "true");
        let index = index_of(&source, &["Only.csproj"]);
        let plan = select(&index, 0.6);
        assert_eq!(plan.properties.len(), 1);
        assert_eq!(plan.properties[0].occurrence_count, 1);
    }

    #[test]
    fn test_excluded_property_never_selected() {
        let source = MemorySource::new()
            .property("A.csproj", "AssemblyOriginatorKeyFile", "key.snk")
            .property("B.csproj", "AssemblyOriginatorKeyFile", "key.snk");
        let index = index_of(&source, &["A.csproj", "B.csproj"]);
        assert!(select(&index, 0.6).is_empty());
    }

    #[test]
    fn test_item_candidates_sorted_by_identity() {
        let source = MemorySource::new()
            .item("A.csproj", "Using", "System.Linq", &[])
            .item("A.csproj", "PackageReference", "Serilog", &[("Version", "3.1.0")])
            .item("B.csproj", "Using", "System.Linq", &[])
            .item("B.csproj", "PackageReference", "Serilog", &[("Version", "3.1.0")])
            .item("B.csproj", "PackageReference", "Dapper", &[("Version", "2.1.0")]);
        let index = index_of(&source, &["A.csproj", "B.csproj"]);
        let plan = select(&index, 0.6);

        let identities: Vec<String> = plan.items.iter().map(|c| c.identity.to_string()).collect();
        assert_eq!(
            identities,
            vec!["PackageReference 'Serilog'", "Using 'System.Linq'"]
        );
        assert_eq!(plan.items[0].signature.as_str(), "Version=3.1.0");
    }

    #[test]
    fn test_case_sensitive_property_grouping() {
        let source = MemorySource::new()
            .property("A.csproj", "Nullable", "enable")
            .property("B.csproj", "nullable", "enable");
        let index = index_of(&source, &["A.csproj", "B.csproj"]);
        assert!(select(&index, 1.0).is_empty());
    }
}
