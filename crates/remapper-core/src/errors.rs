//! Fatal errors of a remapping run.
//!
//! Anything here stops the run without output. Non-fatal conditions are
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s instead.

use remapper_classfile::ClassFileError;
use remapper_mappings::MappingError;
use thiserror::Error;

use crate::diagnostics::DiagnosticReport;

#[derive(Debug, Error)]
pub enum RemapError {
    /// A module failed structural parsing. Aborts at the ingest barrier.
    #[error("malformed module {module}{}: {source}", offset_suffix(.source))]
    MalformedModule {
        module: String,
        #[source]
        source: ClassFileError,
    },

    /// Two modules declare the same class name.
    #[error("duplicate class {name}")]
    DuplicateClass { name: String },

    /// Rewriting needed more constant pool slots than the format allows.
    #[error("constant pool overflow while rewriting {class}: {source}")]
    ConstantPoolOverflow {
        class: String,
        #[source]
        source: ClassFileError,
    },

    /// A rewrite-set class could not be re-encoded.
    #[error("failed to rewrite {class}: {source}")]
    Rewrite {
        class: String,
        #[source]
        source: ClassFileError,
    },

    /// `rewrite` was asked for a class that is not in the rewrite set.
    #[error("class {name} is not part of the rewrite set")]
    UnknownClass { name: String },

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

/// A rewrite that aborted after diagnostics were already collected.
///
/// `report` holds everything gathered up to the abort: absent supertypes,
/// ambiguous mappings and unresolved symbols of the classes that did succeed.
#[derive(Debug, Error)]
#[error("remapping aborted ({} diagnostics collected)", .report.len())]
pub struct RewriteFailure {
    #[source]
    pub error: RemapError,
    pub report: DiagnosticReport,
}

fn offset_suffix(source: &ClassFileError) -> String {
    source
        .offset()
        .map(|offset| format!(" at byte {offset}"))
        .unwrap_or_default()
}

impl RemapError {
    /// Wrap a class file failure raised while re-encoding `class`.
    pub(crate) fn rewrite(class: &str, source: ClassFileError) -> Self {
        match source {
            ClassFileError::ConstantPoolOverflow { .. } => RemapError::ConstantPoolOverflow {
                class: class.to_string(),
                source,
            },
            source => RemapError::Rewrite {
                class: class.to_string(),
                source,
            },
        }
    }
}

pub type Result<T, E = RemapError> = std::result::Result<T, E>;
