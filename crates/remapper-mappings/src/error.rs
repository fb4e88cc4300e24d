//! Errors raised while loading mappings or the forced-propagation list.

use std::path::PathBuf;

use remapper_classfile::ClassFileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read mappings: {0}")]
    Read(#[from] std::io::Error),

    #[error("mapping file is empty or lacks a `v1` header")]
    MissingHeader,

    #[error("unsupported mapping format `{0}` (expected `v1`)")]
    UnsupportedFormat(String),

    #[error("namespace `{namespace}` not found (available: {})", available.join(", "))]
    UnknownNamespace {
        namespace: String,
        available: Vec<String>,
    },

    #[error("line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("line {line}: {source}")]
    InvalidDescriptor {
        line: usize,
        #[source]
        source: ClassFileError,
    },
}

pub type Result<T, E = MappingError> = std::result::Result<T, E>;
