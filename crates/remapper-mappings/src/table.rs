//! The mapping table consulted by propagation and rewriting.
//!
//! Explicit entries keep the order in which the loader registered them; that
//! sequence number decides conflicts. Entries added by propagation are marked
//! [`EntryOrigin::Inferred`].

use indexmap::{IndexMap, IndexSet};

use crate::key::{MemberKey, MemberKind};
use crate::set::MappingSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Supplied by the mapping source.
    Explicit,
    /// Supplied by the mapping source and listed for forced propagation.
    Forced,
    /// Added by propagation.
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub target: String,
    pub origin: EntryOrigin,
    /// Registration order among explicit entries; inferred entries sort last.
    pub sequence: usize,
}

impl MappingEntry {
    pub fn is_explicit(&self) -> bool {
        !matches!(self.origin, EntryOrigin::Inferred)
    }

    /// Ordering key for conflict resolution: forced before plain explicit,
    /// then registration order.
    pub fn priority(&self) -> (u8, usize) {
        let rank = match self.origin {
            EntryOrigin::Forced => 0,
            EntryOrigin::Explicit => 1,
            EntryOrigin::Inferred => 2,
        };
        (rank, self.sequence)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    classes: IndexMap<String, String>,
    fields: IndexMap<MemberKey, MappingEntry>,
    methods: IndexMap<MemberKey, MappingEntry>,
    forced: IndexSet<MemberKey>,
}

impl MappingTable {
    pub fn new(set: MappingSet, forced: IndexSet<MemberKey>) -> Self {
        let mut sequence = 0usize;
        let mut entries = |members: IndexMap<MemberKey, String>| {
            members
                .into_iter()
                .map(|(key, target)| {
                    let origin = if forced.contains(&key) {
                        EntryOrigin::Forced
                    } else {
                        EntryOrigin::Explicit
                    };
                    sequence += 1;
                    let entry = MappingEntry {
                        target,
                        origin,
                        sequence,
                    };
                    (key, entry)
                })
                .collect::<IndexMap<_, _>>()
        };
        let fields = entries(set.fields);
        let methods = entries(set.methods);
        Self {
            classes: set.classes,
            fields,
            methods,
            forced,
        }
    }

    /// Explicit target of a class, if any.
    pub fn lookup_class(&self, name: &str) -> Option<&str> {
        self.classes.get(name).map(String::as_str)
    }

    /// Target of a class name, following the outer class for unmapped inner
    /// classes (`a$b` with `a -> pkg/Outer` becomes `pkg/Outer$b`).
    pub fn map_class(&self, name: &str) -> Option<String> {
        if let Some(target) = self.lookup_class(name) {
            return Some(target.to_string());
        }
        let (outer, inner) = name.rsplit_once('$')?;
        if outer.is_empty() || inner.is_empty() {
            return None;
        }
        self.map_class(outer)
            .map(|mapped_outer| format!("{mapped_outer}${inner}"))
    }

    pub fn lookup_member(&self, kind: MemberKind, key: &MemberKey) -> Option<&MappingEntry> {
        self.members(kind).get(key)
    }

    /// Target name of a member, if any.
    pub fn member_target(&self, kind: MemberKind, key: &MemberKey) -> Option<&str> {
        self.lookup_member(kind, key).map(|entry| entry.target.as_str())
    }

    /// Record a target for `key`. Existing entries keep their origin and
    /// sequence; new ones are marked inferred. Returns the previous target.
    pub fn set_member(
        &mut self,
        kind: MemberKind,
        key: MemberKey,
        target: impl Into<String>,
    ) -> Option<String> {
        let target = target.into();
        let members = match kind {
            MemberKind::Field => &mut self.fields,
            MemberKind::Method => &mut self.methods,
        };
        match members.get_mut(&key) {
            Some(entry) => Some(std::mem::replace(&mut entry.target, target)),
            None => {
                members.insert(
                    key,
                    MappingEntry {
                        target,
                        origin: EntryOrigin::Inferred,
                        sequence: usize::MAX,
                    },
                );
                None
            }
        }
    }

    pub fn forced_members(&self) -> &IndexSet<MemberKey> {
        &self.forced
    }

    pub fn is_forced(&self, key: &MemberKey) -> bool {
        self.forced.contains(key)
    }

    pub fn members(&self, kind: MemberKind) -> &IndexMap<MemberKey, MappingEntry> {
        match kind {
            MemberKind::Field => &self.fields,
            MemberKind::Method => &self.methods,
        }
    }

    pub fn classes(&self) -> &IndexMap<String, String> {
        &self.classes
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}
