use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, warn};

use crate::core::config::{ConfigOverrides, ConsolidationConfig};
use crate::core::errors::DiscoveryError;
use crate::consolidate::RunStatus;
use crate::project::discovery::{discover, Discovery};

pub mod analyze;
pub mod unify;

/// Trait for CLI command implementations
pub trait Command {
    /// Execute the command, returning the status that decides the exit code
    fn execute(&self) -> Result<RunStatus>;
}

/// Common utilities for command implementations
pub mod utils {
    use super::*;

    /// Discover the projects under `path` and load the configuration found
    /// at the tree root, with command-line overrides applied.
    ///
    /// Returns `None` when `path` does not exist.
    pub fn load_tree(
        path: &Path,
        overrides: ConfigOverrides,
    ) -> Result<Option<(Discovery, ConsolidationConfig)>> {
        // Discovery needs exclude patterns, which live in the config at the
        // tree root, so the root is located first.
        let root = if path.is_dir() {
            path.to_path_buf()
        } else {
            path.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| Path::new(".").to_path_buf())
        };
        let config = ConsolidationConfig::load_or_default(&root)
            .with_context(|| format!("Failed to load configuration from {}", root.display()))?
            .with_overrides(overrides)
            .context("Invalid command-line override")?;

        let discovery = match discover(path, &config) {
            Ok(discovery) => discovery,
            Err(DiscoveryError::NotFound { path }) => {
                warn!("Path does not exist: {}", path.display());
                return Ok(None);
            }
            Err(err) => {
                return Err(anyhow::Error::new(err)
                    .context(format!("Failed to discover projects under {}", path.display())))
            }
        };
        debug!(
            "Discovered {} projects under {:?}",
            discovery.projects.len(),
            discovery.root
        );
        Ok(Some((discovery, config)))
    }
}
