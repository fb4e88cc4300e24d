//! Loaded mapping data and the loader abstraction.

use indexmap::IndexMap;

use crate::error::Result;
use crate::key::{MemberKey, MemberKind};

/// The `{classes, fields, methods}` triple produced by a mapping source.
///
/// Keys are in the source namespace; values are target names (internal class
/// names for classes, simple names for members). Insertion order is the
/// registration order used for conflict resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingSet {
    pub classes: IndexMap<String, String>,
    pub fields: IndexMap<MemberKey, String>,
    pub methods: IndexMap<MemberKey, String>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.classes.insert(from.into(), to.into());
        self
    }

    pub fn add_field(&mut self, key: MemberKey, to: impl Into<String>) -> &mut Self {
        self.fields.insert(key, to.into());
        self
    }

    pub fn add_method(&mut self, key: MemberKey, to: impl Into<String>) -> &mut Self {
        self.methods.insert(key, to.into());
        self
    }

    /// Add a field or method entry, choosing the table from the descriptor.
    pub fn add_member(&mut self, key: MemberKey, to: impl Into<String>) -> &mut Self {
        match key.kind() {
            MemberKind::Field => self.add_field(key, to),
            MemberKind::Method => self.add_method(key, to),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.fields.is_empty() && self.methods.is_empty()
    }
}

/// A source of mappings.
///
/// Loaders return the complete set by value; the engine owns the resulting
/// table from then on.
pub trait MappingLoader {
    fn load_mappings(&self) -> Result<MappingSet>;
}

impl MappingLoader for MappingSet {
    fn load_mappings(&self) -> Result<MappingSet> {
        Ok(self.clone())
    }
}

impl<L: MappingLoader + ?Sized> MappingLoader for &L {
    fn load_mappings(&self) -> Result<MappingSet> {
        (**self).load_mappings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_member_routes_by_descriptor() {
        let mut set = MappingSet::new();
        set.add_member(MemberKey::new("a", "b", "I"), "count")
            .add_member(MemberKey::new("a", "c", "()V"), "run");
        assert_eq!(set.fields.len(), 1);
        assert_eq!(set.methods.len(), 1);
        assert_eq!(set.load_mappings().unwrap(), set);
    }
}
