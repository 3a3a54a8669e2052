use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use crate::core::constants::{self, item_kinds};
use crate::core::errors::ConfigError;

/// Settings that shape indexing, selection and migration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Fraction of projects that must share a value, in (0, 1]
    pub threshold: f64,

    /// File name of the shared descriptor, written at the tree root
    pub shared_descriptor: String,

    /// Extra property names to treat as per-project, on top of the built-ins
    pub excluded_properties: Vec<String>,

    /// Item kinds considered for consolidation
    pub item_kinds: Vec<String>,

    /// Glob patterns (relative to the root) of projects to leave out
    pub exclude_paths: Vec<String>,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            threshold: constants::DEFAULT_THRESHOLD,
            shared_descriptor: constants::SHARED_DESCRIPTOR_FILE.to_string(),
            excluded_properties: Vec::new(),
            item_kinds: item_kinds::DEFAULT_INDEXED
                .iter()
                .map(|k| k.to_string())
                .collect(),
            exclude_paths: Vec::new(),
        }
    }
}

/// Values supplied on the command line; `None` keeps the loaded value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub threshold: Option<f64>,
    pub shared_descriptor: Option<String>,
}

impl ConsolidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `buildprops.toml` from `root` if present, otherwise defaults
    pub fn load_or_default(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(constants::CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            debug!("No {} in {:?}, using defaults", constants::CONFIG_FILE, root);
            Ok(Self::new())
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::InvalidToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(threshold) = overrides.threshold {
            self.threshold = threshold;
        }
        if let Some(name) = overrides.shared_descriptor {
            self.shared_descriptor = name;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "threshold".to_string(),
                reason: format!("{} is not in (0, 1]", self.threshold),
            });
        }

        let name = self.shared_descriptor.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue {
                field: "shared_descriptor".to_string(),
                reason: "must be a plain file name".to_string(),
            });
        }

        if self.item_kinds.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "item_kinds".to_string(),
                reason: "item kinds cannot be blank".to_string(),
            });
        }

        for pattern in &self.exclude_paths {
            glob::Pattern::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Property names that are never indexed, compared case-insensitively
    pub fn excluded_property_set(&self) -> HashSet<String> {
        constants::PER_PROJECT_PROPERTIES
            .iter()
            .map(|p| p.to_string())
            .chain(self.excluded_properties.iter().cloned())
            .map(|p| p.to_ascii_lowercase())
            .collect()
    }

    /// Compiled exclude patterns; call after [`validate`](Self::validate)
    pub fn exclude_patterns(&self) -> Vec<glob::Pattern> {
        self.exclude_paths
            .iter()
            .filter_map(|p| glob::Pattern::new(p).ok())
            .collect()
    }
}
