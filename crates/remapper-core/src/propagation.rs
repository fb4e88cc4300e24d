//! Override-closure propagation.
//!
//! For every explicitly mapped method the engine computes the set of
//! declarations that must share its name and assigns the winning target to
//! all of them. Closures are built with an iterative up/down walk:
//!
//! ```text
//!   start ──up──▶ declaring ancestors ──down──▶ every descendant
//!     ▲                                              │
//!     └──────────── each descendant walks up again ◀─┘
//! ```
//!
//! The second upward walk catches implementations inherited from an
//! unrelated superclass (`class B extends A implements I` where `A.m`
//! implements `I.m`). The walk stops when no new class is discovered.
//!
//! Fields do not override, so field entries are never propagated; inherited
//! field references are resolved by the rewriter instead.

use std::collections::{BTreeSet, HashSet, VecDeque};

use remapper_mappings::{MappingEntry, MappingTable, MemberKey, MemberKind};
use tracing::{debug, info, warn};

use crate::config::RemapperConfig;
use crate::diagnostics::Diagnostic;
use crate::hierarchy::{ClassHierarchy, MemberDecl};

/// Result of the propagation phase.
#[derive(Debug)]
pub struct PropagationOutcome {
    /// The completed, read-only mapping table.
    pub table: MappingTable,
    pub diagnostics: Vec<Diagnostic>,
    /// Closures that contained more than one declaration.
    pub closures: usize,
    /// Entries added for members that had no explicit mapping.
    pub inferred: usize,
}

/// Decides which declarations take part in closures.
struct Eligibility<'a> {
    table: &'a MappingTable,
    propagate_private: bool,
}

impl Eligibility<'_> {
    fn allows(&self, owner: &str, decl: &MemberDecl) -> bool {
        if self.table.is_forced(&MemberKey::new(owner, &decl.name, &decl.descriptor)) {
            return true;
        }
        !decl.is_static()
            && !decl.is_initializer()
            && (self.propagate_private || !decl.is_private())
    }

    fn declares(&self, hierarchy: &ClassHierarchy, class: &str, name: &str, desc: &str) -> bool {
        hierarchy
            .get(class)
            .and_then(|node| node.method(name, desc))
            .is_some_and(|decl| self.allows(class, decl))
    }
}

/// Every declaration sharing an override relationship with `key`, sorted.
///
/// `key` itself is always part of the result, even when its owner is not in
/// the hierarchy or the declaration is not eligible.
pub fn method_closure(
    hierarchy: &ClassHierarchy,
    table: &MappingTable,
    config: &RemapperConfig,
    key: &MemberKey,
) -> Vec<MemberKey> {
    let eligibility = Eligibility {
        table,
        propagate_private: config.propagate_private,
    };
    let (name, desc) = (key.name.as_str(), key.descriptor.as_str());
    let mut members: BTreeSet<&str> = BTreeSet::new();

    let start_declares = hierarchy
        .get(&key.owner)
        .and_then(|node| node.method(name, desc));
    let walk = match start_declares {
        Some(decl) => eligibility.allows(&key.owner, decl),
        // Mapped on a class that only inherits the method: start the walk
        // from there so the inherited declaration is found.
        None => hierarchy.contains(&key.owner),
    };

    if walk {
        let mut up_seen: HashSet<&str> = HashSet::new();
        let mut down_seen: HashSet<&str> = HashSet::new();
        let mut up_queue: VecDeque<&str> = VecDeque::new();
        if let Some(node) = hierarchy.get(&key.owner) {
            up_seen.insert(node.name.as_str());
            up_queue.push_back(node.name.as_str());
        }

        while let Some(class) = up_queue.pop_front() {
            let tops = std::iter::once(class).chain(hierarchy.ancestors_of(class));
            for top in tops {
                if !eligibility.declares(hierarchy, top, name, desc) {
                    continue;
                }
                members.insert(top);
                if !down_seen.insert(top) {
                    continue;
                }
                for below in hierarchy.descendants_of(top) {
                    if eligibility.declares(hierarchy, below, name, desc) {
                        members.insert(below);
                    }
                    if up_seen.insert(below) {
                        up_queue.push_back(below);
                    }
                }
            }
        }
    }

    let mut closure: Vec<MemberKey> = members
        .into_iter()
        .map(|owner| key.with_owner(owner))
        .collect();
    if !closure.contains(key) {
        closure.push(key.clone());
        closure.sort();
    }
    closure
}

/// Complete `table` so that every closure carries one target name.
pub fn propagate(
    hierarchy: &ClassHierarchy,
    mut table: MappingTable,
    config: &RemapperConfig,
) -> PropagationOutcome {
    let mut seeds: Vec<(MemberKey, MappingEntry)> = table
        .members(MemberKind::Method)
        .iter()
        .filter(|(_, entry)| entry.is_explicit())
        .map(|(key, entry)| (key.clone(), entry.clone()))
        .collect();
    seeds.sort_by_key(|(_, entry)| entry.priority());

    let mut assigned: HashSet<MemberKey> = HashSet::new();
    let mut diagnostics = Vec::new();
    let mut closures = 0usize;
    let mut inferred = 0usize;

    for (seed, _) in &seeds {
        if assigned.contains(seed) {
            continue;
        }
        let closure: Vec<MemberKey> = method_closure(hierarchy, &table, config, seed)
            .into_iter()
            .filter(|member| member == seed || !assigned.contains(member))
            .collect();

        // Explicit entries inside the closure compete; lowest priority wins.
        let mut explicit: Vec<(&MemberKey, &MappingEntry)> = closure
            .iter()
            .filter_map(|member| {
                table
                    .lookup_member(MemberKind::Method, member)
                    .filter(|entry| entry.is_explicit())
                    .map(|entry| (member, entry))
            })
            .collect();
        explicit.sort_by_key(|(_, entry)| entry.priority());
        let Some(&(winner, winner_entry)) = explicit.first() else {
            continue;
        };
        let target = winner_entry.target.clone();
        let winner = winner.clone();

        let mut rejected = BTreeSet::new();
        for (member, entry) in explicit.iter().skip(1) {
            if entry.target != target && rejected.insert(entry.target.clone()) {
                let diagnostic = Diagnostic::ambiguous(
                    MemberKind::Method,
                    &winner,
                    &target,
                    member,
                    &entry.target,
                );
                warn!("{diagnostic}");
                diagnostics.push(diagnostic);
            }
        }

        if closure.len() > 1 {
            closures += 1;
            debug!(seed = %seed, members = closure.len(), target = %target, "closure");
        }
        for member in closure {
            if table
                .set_member(MemberKind::Method, member.clone(), target.clone())
                .is_none()
            {
                inferred += 1;
            }
            assigned.insert(member);
        }
    }

    info!(
        seeds = seeds.len(),
        closures,
        inferred,
        conflicts = diagnostics.len(),
        "propagation complete"
    );
    PropagationOutcome {
        table,
        diagnostics,
        closures,
        inferred,
    }
}
