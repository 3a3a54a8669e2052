use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Item metadata. Key order carries no meaning, so the map is kept sorted and
/// an item without metadata is the same as one with an empty map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_optional(map: Option<BTreeMap<String, String>>) -> Self {
        Self(map.unwrap_or_default())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Sorted `key=value` pairs joined by `;`. Separators inside values are
    /// backslash-escaped so distinct maps never collide.
    pub fn signature(&self) -> Signature {
        let joined = self
            .0
            .iter()
            .map(|(k, v)| format!("{}={}", escape_signature_part(k), escape_signature_part(v)))
            .collect::<Vec<_>>()
            .join(";");
        Signature(joined)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn escape_signature_part(part: &str) -> String {
    let mut escaped = String::with_capacity(part.len());
    for ch in part.chars() {
        if matches!(ch, '\\' | ';' | '=') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Canonical value dimension of a declaration: a property's literal value or
/// an item's metadata signature. Ordered lexicographically, which is also the
/// tie-break order used by the consensus selector.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn of_value(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grouping identity of an item; metadata is deliberately not part of it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemIdentity {
    pub item_type: String,
    pub identifier: String,
}

impl ItemIdentity {
    pub fn new(item_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.item_type, self.identifier)
    }
}

/// A property found in a project descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDeclaration {
    pub name: String,
    pub value: String,
    pub project_path: PathBuf,
    /// Declared inside a conditional group or carrying its own condition
    #[serde(default)]
    pub conditional: bool,
}

impl PropertyDeclaration {
    pub fn signature(&self) -> Signature {
        Signature::of_value(&self.value)
    }
}

/// An item (`Using`, `PackageReference`, ...) found in a project descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDeclaration {
    pub item_type: String,
    pub identifier: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub project_path: PathBuf,
    #[serde(default)]
    pub conditional: bool,
}

impl ItemDeclaration {
    pub fn identity(&self) -> ItemIdentity {
        ItemIdentity::new(&self.item_type, &self.identifier)
    }

    pub fn signature(&self) -> Signature {
        self.metadata.signature()
    }
}

/// Everything the declaration source yields for one project, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDeclarations {
    pub project_path: PathBuf,
    pub properties: Vec<PropertyDeclaration>,
    pub items: Vec<ItemDeclaration>,
}

/// A dependency (package) reference of one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReference {
    pub package_name: String,
    pub version: String,
    pub project_path: PathBuf,
}

impl DependencyReference {
    pub fn new(
        package_name: impl Into<String>,
        version: impl Into<String>,
        project_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            version: version.into(),
            project_path: project_path.into(),
        }
    }

    /// Project file name without extension
    pub fn project_name(&self) -> String {
        project_name(&self.project_path)
    }
}

pub fn project_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Recoverable conditions recorded while a run continues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A descriptor could not be read; the project was skipped
    ParseFailure { project: String, message: String },
    /// A declaration shares a candidate's identity but not its value; it was kept
    ValueMismatch {
        project: String,
        identity: String,
        expected: String,
        found: String,
    },
    /// A file could not be saved; its previous content is untouched
    PersistenceFailure { file: String, message: String },
    /// The shared descriptor already sets a different value for a candidate;
    /// the candidate was not applied
    SharedConflict {
        file: String,
        identity: String,
        current: String,
        proposed: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParseFailure { project, message } => {
                write!(f, "Failed to analyze {project}: {message}")
            }
            Self::ValueMismatch {
                project,
                identity,
                expected,
                found,
            } => write!(
                f,
                "Skipped removing {identity} in {project}: value mismatch (expected '{expected}', found '{found}')"
            ),
            Self::PersistenceFailure { file, message } => {
                write!(f, "Failed to save {file}: {message}")
            }
            Self::SharedConflict {
                file,
                identity,
                current,
                proposed,
            } => write!(
                f,
                "Skipped consolidating {identity}: {file} already sets '{current}', projects agree on '{proposed}'"
            ),
        }
    }
}
