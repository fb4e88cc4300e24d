//! class-remapper: rename classes, fields and methods across compiled JVM
//! classes.
//!
//! The engine lives in the workspace crates:
//!
//! - `remapper-classfile`: class file model, constant pool editing and
//!   descriptor/signature rewriting.
//! - `remapper-mappings`: Tiny v1 mappings, the forced-propagation list and the
//!   mapping table.
//! - `remapper-core`: hierarchy graph, propagation, rewriting and the phased
//!   pipeline.
//!
//! This crate adds archive I/O ([`archive`]) and the end-to-end run used by
//! the `class-remapper` binary ([`remap`]).

pub mod archive;
pub mod remap;

pub use archive::{read_classes, read_entries, write_jar, ArchiveEntry};
pub use remap::{remap, MappingStats, RemapOptions, RunSummary};
