//! Where the migration executor loads descriptors from and saves them to

use std::path::Path;

use crate::core::errors::{DescriptorError, PersistError};
use crate::project::descriptor::DescriptorDocument;

/// Load and save seam for descriptor files.
///
/// Each call hands out or takes a whole document; nothing is cached between
/// calls, so every file operation works on a freshly loaded copy.
pub trait DescriptorStore {
    fn load(&self, path: &Path) -> Result<DescriptorDocument, DescriptorError>;

    fn save(&self, document: &DescriptorDocument, path: &Path) -> Result<(), PersistError>;

    /// Load `path`, or start an empty descriptor when it does not exist.
    /// The flag is true when the document was created.
    fn load_or_create(&self, path: &Path) -> Result<(DescriptorDocument, bool), DescriptorError> {
        if path.exists() {
            Ok((self.load(path)?, false))
        } else {
            DescriptorDocument::load_or_create(path)
        }
    }
}

/// Descriptors on the local file system, replaced atomically on save
#[derive(Debug, Default, Clone, Copy)]
pub struct FileStore;

impl DescriptorStore for FileStore {
    fn load(&self, path: &Path) -> Result<DescriptorDocument, DescriptorError> {
        DescriptorDocument::load(path)
    }

    fn save(&self, document: &DescriptorDocument, path: &Path) -> Result<(), PersistError> {
        document.save(path)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::path::PathBuf;

    /// File store whose saves to one path always fail
    pub struct FailingSave {
        pub target: PathBuf,
    }

    impl DescriptorStore for FailingSave {
        fn load(&self, path: &Path) -> Result<DescriptorDocument, DescriptorError> {
            FileStore.load(path)
        }

        fn save(&self, document: &DescriptorDocument, path: &Path) -> Result<(), PersistError> {
            if path == self.target {
                return Err(PersistError::Replace {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only file system"),
                });
            }
            FileStore.save(document, path)
        }
    }
}
