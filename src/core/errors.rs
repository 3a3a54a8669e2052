/// Domain-specific error types for buildprops using thiserror
///
/// Per-project parse problems and per-declaration mismatches are not errors at
/// the batch level; they surface as [`Warning`](crate::core::types::Warning)
/// values. The types here describe what went wrong for a single file or setting.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for buildprops operations
#[derive(Error, Debug)]
pub enum BuildPropsError {
    #[error("Descriptor could not be read")]
    Descriptor(#[from] DescriptorError),

    #[error("Descriptor could not be saved")]
    Persist(#[from] PersistError),

    #[error("Configuration error")]
    Config(#[from] ConfigError),

    #[error("Project discovery failed")]
    Discovery(#[from] DiscoveryError),
}

/// Failures reading or parsing a project or shared descriptor
#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("Failed to read {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed XML in {context} at byte {position}: {message}")]
    MalformedXml {
        context: String,
        position: usize,
        message: String,
    },

    #[error("No root element found in {context}")]
    MissingRoot { context: String },

    #[error("Element <{element}> in {context} is never closed")]
    Unclosed { context: String, element: String },
}

/// Failures writing a descriptor back to disk
///
/// A failed persist never leaves a partially written file behind: content is
/// staged in a sibling temporary file and only renamed over the target once
/// fully flushed.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to stage temporary file next to {path}")]
    Stage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to replace {path}")]
    Replace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Refusing to write {path}: {reason}")]
    InvalidTarget { path: PathBuf, reason: String },
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration in {path}")]
    InvalidToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid exclude pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Errors locating the projects of a build tree
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Path does not exist: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read solution listing {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse solution listing {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Found {count} solution listings in {dir}; pass one explicitly")]
    AmbiguousSolution { dir: PathBuf, count: usize },
}

/// Result type alias for buildprops operations
pub type BuildPropsResult<T> = Result<T, BuildPropsError>;

impl DescriptorError {
    pub fn malformed(context: &str, position: usize, err: impl std::fmt::Display) -> Self {
        Self::MalformedXml {
            context: context.to_string(),
            position,
            message: err.to_string(),
        }
    }
}

/// Render an error followed by each of its sources, joined by `: `
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err = DescriptorError::MissingRoot {
            context: "App.csproj".to_string(),
        };
        let top: BuildPropsError = err.into();
        assert!(matches!(top, BuildPropsError::Descriptor(_)));
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = DescriptorError::malformed("Lib.csproj", 42, "unexpected end of file");
        let message = err.to_string();
        assert!(message.contains("Lib.csproj"));
        assert!(message.contains("42"));
        assert!(message.contains("unexpected end of file"));

        let err = ConfigError::InvalidValue {
            field: "threshold".to_string(),
            reason: "must be in (0, 1]".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for 'threshold': must be in (0, 1]"
        );
    }

    #[test]
    fn test_error_chain_includes_io_cause() {
        let err: BuildPropsError = DescriptorError::ReadFailed {
            path: PathBuf::from("App.csproj"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        }
        .into();
        assert_eq!(
            error_chain(&err),
            "Descriptor could not be read: Failed to read App.csproj: access denied"
        );
    }
}
