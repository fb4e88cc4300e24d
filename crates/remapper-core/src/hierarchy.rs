//! Cross-module inheritance graph.
//!
//! ```text
//!   HierarchyBuilder  --ingest (concurrent)-->  close()  -->  ClassHierarchy
//!   (Mutex-guarded)                                           (immutable)
//! ```
//!
//! Nodes are class names; edges run from a class to its superclass and to each
//! implemented interface. A supertype that was never ingested is *absent*: it
//! is recorded but terminates every walk.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use parking_lot::Mutex;
use remapper_classfile::access::{is_interface, is_private, is_static};
use remapper_classfile::{ClassFile, ClassFileError, MemberInfo};
use smallvec::SmallVec;
use tracing::debug;

use crate::errors::{RemapError, Result};

/// Whether a module is rewritten or only provides context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleRole {
    RewriteTarget,
    Classpath,
}

/// A field or method declared by a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDecl {
    pub name: String,
    pub descriptor: String,
    pub access_flags: u16,
}

impl MemberDecl {
    pub fn is_private(&self) -> bool {
        is_private(self.access_flags)
    }

    pub fn is_static(&self) -> bool {
        is_static(self.access_flags)
    }

    /// Constructors and static initializers.
    pub fn is_initializer(&self) -> bool {
        self.name == "<init>" || self.name == "<clinit>"
    }
}

/// The structural summary of a class kept in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNode {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: SmallVec<[String; 4]>,
    pub access_flags: u16,
    pub fields: Vec<MemberDecl>,
    pub methods: Vec<MemberDecl>,
    pub role: ModuleRole,
}

impl ClassNode {
    pub fn from_class(
        class: &ClassFile,
        role: ModuleRole,
    ) -> std::result::Result<Self, ClassFileError> {
        let pool = &class.constant_pool;
        let members = |table: &[MemberInfo]| {
            table
                .iter()
                .map(|member| -> std::result::Result<MemberDecl, ClassFileError> {
                    Ok(MemberDecl {
                        name: member.name(pool)?.to_string(),
                        descriptor: member.descriptor(pool)?.to_string(),
                        access_flags: member.access_flags,
                    })
                })
                .collect::<std::result::Result<Vec<_>, ClassFileError>>()
        };
        Ok(Self {
            name: class.name()?.to_string(),
            super_name: class.super_name()?.map(str::to_string),
            interfaces: class
                .interface_names()?
                .into_iter()
                .map(str::to_string)
                .collect(),
            access_flags: class.access_flags,
            fields: members(&class.fields)?,
            methods: members(&class.methods)?,
            role,
        })
    }

    pub fn is_interface(&self) -> bool {
        is_interface(self.access_flags)
    }

    /// Superclass first, then interfaces in declaration order.
    pub fn supertypes(&self) -> impl Iterator<Item = &str> {
        self.super_name
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }

    pub fn field(&self, name: &str, descriptor: &str) -> Option<&MemberDecl> {
        self.fields
            .iter()
            .find(|f| f.name == name && f.descriptor == descriptor)
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MemberDecl> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }
}

/// Ingest-phase graph. Shared by reference across ingest tasks.
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    nodes: Mutex<HashMap<String, ClassNode>>,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class. Fails if the name is already registered.
    pub fn ingest(&self, node: ClassNode) -> Result<()> {
        let mut nodes = self.nodes.lock();
        if nodes.contains_key(&node.name) {
            return Err(RemapError::DuplicateClass { name: node.name });
        }
        nodes.insert(node.name.clone(), node);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().is_empty()
    }

    /// End the ingest phase.
    pub fn close(self) -> ClassHierarchy {
        ClassHierarchy::new(self.nodes.into_inner())
    }
}

/// Immutable graph snapshot used by propagation and rewriting.
#[derive(Debug, Clone, Default)]
pub struct ClassHierarchy {
    nodes: HashMap<String, ClassNode>,
    /// Direct subtypes per class, sorted.
    children: HashMap<String, Vec<String>>,
    /// Absent supertype -> first (sorted) class that references it.
    absent: BTreeMap<String, String>,
}

impl ClassHierarchy {
    pub fn new(nodes: HashMap<String, ClassNode>) -> Self {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut absent = BTreeMap::new();
        let mut names: Vec<&String> = nodes.keys().collect();
        names.sort();
        for name in names {
            let node = &nodes[name];
            for supertype in node.supertypes() {
                children
                    .entry(supertype.to_string())
                    .or_default()
                    .push(name.clone());
                if !nodes.contains_key(supertype) {
                    absent
                        .entry(supertype.to_string())
                        .or_insert_with(|| name.clone());
                }
            }
        }
        for subtypes in children.values_mut() {
            subtypes.sort();
            subtypes.dedup();
        }
        debug!(
            classes = nodes.len(),
            absent = absent.len(),
            "hierarchy closed"
        );
        Self {
            nodes,
            children,
            absent,
        }
    }

    pub fn get(&self, name: &str) -> Option<&ClassNode> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Referenced as a supertype but never ingested.
    pub fn is_absent(&self, name: &str) -> bool {
        self.absent.contains_key(name)
    }

    /// `(absent supertype, first referencing class)` in name order.
    pub fn absent_classes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.absent.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All ingested class names, sorted.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Transitive ingested supertypes, nearest first. Each class appears once
    /// even when reachable through several paths.
    pub fn ancestors_of(&self, name: &str) -> Vec<&str> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        let mut result = Vec::new();
        visited.insert(name);
        if let Some(node) = self.nodes.get(name) {
            queue.extend(node.supertypes());
        }
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            result.push(node.name.as_str());
            queue.extend(node.supertypes());
        }
        result
    }

    /// Transitive subtypes, sorted by name.
    pub fn descendants_of(&self, name: &str) -> Vec<&str> {
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&str> = vec![name];
        while let Some(current) = stack.pop() {
            for child in self.children.get(current).into_iter().flatten() {
                if child.as_str() != name && visited.insert(child.as_str()) {
                    stack.push(child.as_str());
                }
            }
        }
        visited.into_iter().collect()
    }

    /// Class declaring the field that `owner.name:descriptor` resolves to.
    pub fn resolve_field(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str> {
        let mut seen = HashSet::new();
        self.lookup_field(owner, name, descriptor, &mut seen)
    }

    /// The class itself, then its direct superinterfaces recursively, then
    /// its superclass.
    fn lookup_field<'s>(
        &'s self,
        class: &str,
        name: &str,
        descriptor: &str,
        seen: &mut HashSet<&'s str>,
    ) -> Option<&'s str> {
        let node = self.nodes.get(class)?;
        if !seen.insert(node.name.as_str()) {
            return None;
        }
        if node.field(name, descriptor).is_some() {
            return Some(node.name.as_str());
        }
        for interface in &node.interfaces {
            if let Some(found) = self.lookup_field(interface, name, descriptor, seen) {
                return Some(found);
            }
        }
        let super_name = node.super_name.as_deref()?;
        self.lookup_field(super_name, name, descriptor, seen)
    }

    /// Class declaring the method that `owner.name descriptor` resolves to.
    pub fn resolve_method(&self, owner: &str, name: &str, descriptor: &str) -> Option<&str> {
        self.resolve(owner, |node| node.method(name, descriptor).is_some())
    }

    /// Superclass chain first, then the interfaces of each class on the
    /// chain, breadth first. Method lookup order; fields use
    /// [`Self::resolve_field`].
    fn resolve(&self, owner: &str, declares: impl Fn(&ClassNode) -> bool) -> Option<&str> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(owner);
        let mut seen = HashSet::new();
        while let Some(node) = current {
            if !seen.insert(node.name.as_str()) {
                break;
            }
            if declares(node) {
                return Some(node.name.as_str());
            }
            chain.push(node);
            current = node.super_name.as_deref().and_then(|s| self.nodes.get(s));
        }

        let mut queue: VecDeque<&str> = chain
            .iter()
            .flat_map(|node| node.interfaces.iter().map(String::as_str))
            .collect();
        while let Some(interface) = queue.pop_front() {
            if !seen.insert(interface) {
                continue;
            }
            let Some(node) = self.nodes.get(interface) else {
                continue;
            };
            if declares(node) {
                return Some(node.name.as_str());
            }
            queue.extend(node.interfaces.iter().map(String::as_str));
        }
        None
    }
}
