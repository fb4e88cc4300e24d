//! Mapping sources and the mapping table.
//!
//! - [`MappingLoader`] produces a [`MappingSet`] by value; [`TinyMappingLoader`]
//!   reads Tiny v1 files.
//! - [`parse_forced_list`] reads the forced-propagation list.
//! - [`MappingTable`] combines both and is what propagation completes and the
//!   rewriter reads.

pub mod error;
pub mod forced;
pub mod key;
pub mod set;
pub mod table;
pub mod tiny;

pub use error::{MappingError, Result};
pub use forced::{parse_forced_list, read_forced_list};
pub use key::{MemberKey, MemberKind};
pub use set::{MappingLoader, MappingSet};
pub use table::{EntryOrigin, MappingEntry, MappingTable};
pub use tiny::{read_tiny, TinyMappingLoader};
