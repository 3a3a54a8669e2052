/// File persistence helpers
///
/// Descriptor writes are all-or-nothing: content is staged in a temporary file
/// in the target's directory and renamed over the target once flushed.
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::core::errors::{DescriptorError, PersistError};

/// Read a descriptor file to a string
pub fn read_descriptor(path: &Path) -> Result<String, DescriptorError> {
    std::fs::read_to_string(path).map_err(|source| DescriptorError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Atomically replace (or create) `path` with `content`
pub fn write_atomic(path: &Path, content: &str) -> Result<(), PersistError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(PersistError::InvalidTarget {
                path: path.to_path_buf(),
                reason: "path has no parent directory".to_string(),
            })
        }
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(|source| PersistError::Stage {
        path: path.to_path_buf(),
        source,
    })?;

    staged
        .write_all(content.as_bytes())
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|source| PersistError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    // Dropping the temp file on any error above removes it.
    staged.persist(path).map_err(|e| PersistError::Replace {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    Ok(())
}
