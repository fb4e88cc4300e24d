//! JVM class file model for the remapper.
//!
//! This crate only knows about bytes and constant pool indices. It parses a
//! class file into [`ClassFile`], writes it back, and offers the primitives the
//! rewriter needs to substitute class names inside descriptors and generic
//! signatures. Nothing here resolves names across classes.

pub mod access;
pub mod annotations;
pub mod attributes;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod builder;
pub mod class;
pub mod constant_pool;
pub mod descriptor;
pub mod error;
pub mod frames;
pub mod reader;
pub mod writer;

pub use attributes::{Attribute, AttributeContext, AttributeInfo, CodeAttribute};
#[cfg(any(test, feature = "test-fixtures"))]
pub use builder::{AnnotationSpec, ClassFileBuilder, CodeBuilder, ElementSpec, MemberBuilder};
pub use class::{ClassFile, MemberInfo};
pub use constant_pool::{Constant, ConstantPool, MemberRef, PoolEditor, RefKind, Utf8Entry};
pub use descriptor::{inner_simple_name, map_class_or_array, map_descriptor, map_signature};
pub use error::{ClassFileError, Result};
pub use frames::{StackMapFrame, VerificationType};
