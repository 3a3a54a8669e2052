//! Locate the project descriptors of a build tree
//!
//! A solution listing (`.sln` or `.slnx`) wins when one is present; otherwise
//! the directory is walked for project files. Order is preserved from the
//! listing, or sorted by path for directory walks, so downstream indexing is
//! reproducible.

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::core::config::ConsolidationConfig;
use crate::core::constants::{PROJECT_EXTENSIONS, SKIPPED_DIRECTORIES};
use crate::core::errors::DiscoveryError;

// `Project("{type-guid}") = "Name", "relative\path.csproj", "{project-guid}"`
static SLN_PROJECT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let mut patterns = Vec::new();
    if let Ok(line) = Regex::new(r#"(?m)^\s*Project\("\{[^}]*\}"\)\s*=\s*"[^"]*"\s*,\s*"([^"]+)""#) {
        patterns.push(line);
    }
    patterns
});

/// Projects of a build tree and the directory that receives the shared descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub root: PathBuf,
    pub projects: Vec<PathBuf>,
}

/// Discover projects from a solution file, a single project file or a directory
pub fn discover(path: &Path, config: &ConsolidationConfig) -> Result<Discovery, DiscoveryError> {
    if !path.exists() {
        return Err(DiscoveryError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let (root, projects) = if path.is_file() {
        let root = parent_dir(path);
        let projects = match extension(path).as_deref() {
            Some("sln") => projects_from_sln(path)?,
            Some("slnx") => projects_from_slnx(path)?,
            _ if is_project_file(path) => vec![path.to_path_buf()],
            _ => {
                return Err(DiscoveryError::Malformed {
                    path: path.to_path_buf(),
                    message: "not a solution or project file".to_string(),
                })
            }
        };
        (root, projects)
    } else {
        let solutions = solution_listings(path)?;
        match solutions.as_slice() {
            [] => (path.to_path_buf(), walk_projects(path)),
            [solution] => {
                info!("Using solution listing {:?}", solution);
                let projects = if extension(solution).as_deref() == Some("slnx") {
                    projects_from_slnx(solution)?
                } else {
                    projects_from_sln(solution)?
                };
                (path.to_path_buf(), projects)
            }
            many => {
                return Err(DiscoveryError::AmbiguousSolution {
                    dir: path.to_path_buf(),
                    count: many.len(),
                })
            }
        }
    };

    let patterns = config.exclude_patterns();
    let projects = dedup(projects)
        .into_iter()
        .filter(|p| {
            let relative = p.strip_prefix(&root).unwrap_or(p);
            let excluded = patterns.iter().any(|pattern| pattern.matches_path(relative));
            if excluded {
                debug!("Excluding {:?} by pattern", relative);
            }
            !excluded
        })
        .collect();

    Ok(Discovery { root, projects })
}

/// Project paths listed in a classic `.sln` file. Entries that are not project
/// files (solution folders) or do not exist on disk are dropped.
pub fn projects_from_sln(path: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let content = std::fs::read_to_string(path).map_err(|source| DiscoveryError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let base = parent_dir(path);

    Ok(SLN_PROJECT_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(&content))
        .filter_map(|caps| caps.get(1))
        .map(|m| base.join(normalize_separators(m.as_str())))
        .filter(|p| is_project_file(p) && existing(p))
        .collect())
}

/// Project paths listed in an XML `.slnx` file
pub fn projects_from_slnx(path: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let content = std::fs::read_to_string(path).map_err(|source| DiscoveryError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let base = parent_dir(path);
    let malformed = |message: String| DiscoveryError::Malformed {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = Reader::from_str(&content);
    let mut projects = Vec::new();
    loop {
        match reader.read_event().map_err(|e| malformed(e.to_string()))? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Project" => {
                let Some(attr) = e
                    .try_get_attribute("Path")
                    .map_err(|err| malformed(err.to_string()))?
                else {
                    continue;
                };
                let value = attr
                    .unescape_value()
                    .map_err(|err| malformed(err.to_string()))?;
                let project = base.join(normalize_separators(&value));
                if is_project_file(&project) && existing(&project) {
                    projects.push(project);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(projects)
}

/// Every project file below `root`, sorted by path
pub fn walk_projects(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_project_file(e.path()))
        .map(|e| e.into_path())
        .collect()
}

fn solution_listings(dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let entries = std::fs::read_dir(dir).map_err(|source| DiscoveryError::ReadFailed {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut listings: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && matches!(extension(p).as_deref(), Some("sln" | "slnx")))
        .collect();
    listings.sort();
    Ok(listings)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRECTORIES.contains(&name.as_ref())
}

fn is_project_file(path: &Path) -> bool {
    extension(path).is_some_and(|ext| PROJECT_EXTENSIONS.contains(&ext.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

fn existing(path: &Path) -> bool {
    let exists = path.is_file();
    if !exists {
        debug!("Listed project {:?} does not exist, skipping", path);
    }
    exists
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn normalize_separators(raw: &str) -> PathBuf {
    raw.split(['\\', '/']).filter(|s| !s.is_empty()).collect()
}

fn dedup(projects: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    projects
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}
