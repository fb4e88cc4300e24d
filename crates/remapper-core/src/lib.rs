//! Remapping engine for compiled JVM classes.
//!
//! A run moves through three phases, each owning the data the next one needs:
//!
//! 1. **Ingest** ([`pipeline::IngestSession`]): every rewrite-set and
//!    classpath module is parsed on the worker pool and registered in the
//!    [`hierarchy::HierarchyBuilder`].
//! 2. **Propagation** ([`propagation::propagate`]): the closed
//!    [`hierarchy::ClassHierarchy`] is walked once per explicit method entry
//!    so every override closure carries one target name.
//! 3. **Rewrite** ([`pipeline::FinalizedRemapper`]): each rewrite-set class
//!    is rewritten independently against the read-only table.
//!
//! ```ignore
//! let mut session = Remapper::new(config, &loader, forced)?.start()?;
//! session.ingest_all(classpath, ModuleRole::Classpath)?;
//! session.ingest_all(inputs, ModuleRole::RewriteTarget)?;
//! let (classes, report) = session.finalize_mappings().rewrite_all().into_result()?;
//! ```
//!
//! Fatal problems are [`RemapError`]s; everything else ends up in the
//! [`DiagnosticReport`] returned next to the output. A rewrite that aborts
//! hands the report back inside a [`RewriteFailure`].

pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod hierarchy;
pub mod pipeline;
pub mod propagation;
pub mod rewriter;

pub use config::RemapperConfig;
pub use diagnostics::{Diagnostic, DiagnosticReport, DiagnosticSummary};
pub use errors::{RemapError, Result, RewriteFailure};
pub use hierarchy::{ClassHierarchy, ClassNode, HierarchyBuilder, MemberDecl, ModuleRole};
pub use pipeline::{FinalizedRemapper, IngestSession, ModuleSource, Remapper, RewriteOutcome};
pub use propagation::{method_closure, propagate, PropagationOutcome};
pub use rewriter::{RewrittenClass, Rewriter};
