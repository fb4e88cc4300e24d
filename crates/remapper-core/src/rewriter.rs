//! Per-class symbol rewriting.
//!
//! The rewriter never moves or removes constant pool entries. Renamed strings
//! are appended as new `Utf8` entries and the referring entries (or attribute
//! fields) are repointed, so every index embedded in bytecode stays valid and
//! an unchanged class re-encodes to identical bytes. `Class` entries are
//! repointed in place, which keeps `StackMapTable` object types correct
//! without re-encoding frames.

use std::collections::BTreeSet;

use remapper_classfile::annotations::{Annotation, ElementValue, TypeAnnotation};
use remapper_classfile::attributes::{Attribute, AttributeInfo, BootstrapMethod};
use remapper_classfile::constant_pool::MemberRef;
use remapper_classfile::descriptor::return_class;
use remapper_classfile::frames::check_frame_classes;
use remapper_classfile::{
    inner_simple_name, map_class_or_array, map_descriptor, map_signature, ClassFile,
    ClassFileError, Constant, ConstantPool, PoolEditor, RefKind,
};
use remapper_mappings::{MappingTable, MemberKey, MemberKind};
use tracing::debug;

use crate::config::RemapperConfig;
use crate::errors::{RemapError, Result};
use crate::hierarchy::ClassHierarchy;

const LAMBDA_METAFACTORY: &str = "java/lang/invoke/LambdaMetafactory";

/// A rewritten rewrite-set class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenClass {
    /// Name before remapping.
    pub original_name: String,
    /// Name after remapping; decides the output path.
    pub name: String,
    pub bytes: Vec<u8>,
    /// Classes referenced by this module that are neither ingested nor mapped,
    /// sorted.
    pub unresolved: Vec<String>,
    /// Number of `StackMapTable` attributes dropped.
    pub frames_removed: usize,
}

/// Read-only view over the completed mapping state. Cheap to share across
/// rewrite tasks.
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'a> {
    hierarchy: &'a ClassHierarchy,
    table: &'a MappingTable,
    config: &'a RemapperConfig,
}

impl<'a> Rewriter<'a> {
    pub fn new(
        hierarchy: &'a ClassHierarchy,
        table: &'a MappingTable,
        config: &'a RemapperConfig,
    ) -> Self {
        Self {
            hierarchy,
            table,
            config,
        }
    }

    /// Rewrite one parsed class and re-encode it.
    pub fn rewrite(&self, mut class: ClassFile) -> Result<RewrittenClass> {
        let original_name = class
            .name()
            .map_err(|source| RemapError::rewrite("<unnamed>", source))?
            .to_string();
        let mut pass = ClassPass {
            rewriter: *self,
            owner: &original_name,
            original: class.constant_pool.clone(),
            unresolved: BTreeSet::new(),
            frames_removed: 0,
        };
        pass.run(&mut class)
            .map_err(|source| RemapError::rewrite(&original_name, source))?;
        let ClassPass {
            unresolved,
            frames_removed,
            ..
        } = pass;

        let name = class
            .name()
            .map_err(|source| RemapError::rewrite(&original_name, source))?
            .to_string();
        let bytes = class
            .to_bytes()
            .map_err(|source| RemapError::rewrite(&original_name, source))?;
        if name != original_name {
            debug!(from = %original_name, to = %name, "rewrote class");
        }
        Ok(RewrittenClass {
            original_name,
            name,
            bytes,
            unresolved: unresolved.into_iter().collect(),
            frames_removed,
        })
    }

    /// Target of a class name; `None` keeps the name.
    fn class_target(&self, name: &str, unresolved: &mut BTreeSet<String>) -> Option<String> {
        match self.table.map_class(name) {
            Some(target) => Some(target),
            None => {
                if !self.hierarchy.contains(name) {
                    unresolved.insert(name.to_string());
                }
                None
            }
        }
    }

    /// Target name of a method referenced through `owner`.
    fn method_target(&self, owner: &str, name: &str, desc: &str) -> Option<&'a str> {
        let declaring = self
            .hierarchy
            .resolve_method(owner, name, desc)
            .unwrap_or(owner);
        self.table
            .member_target(MemberKind::Method, &MemberKey::new(declaring, name, desc))
    }

    /// Target name of a field referenced through `owner`.
    fn field_target(&self, owner: &str, name: &str, desc: &str) -> Option<&'a str> {
        let declaring = self
            .hierarchy
            .resolve_field(owner, name, desc)
            .unwrap_or(owner);
        self.table
            .member_target(MemberKind::Field, &MemberKey::new(declaring, name, desc))
    }

    /// Target of an annotation element: a no-argument method on the
    /// annotation type whose return type is not recorded in the annotation.
    fn element_target(&self, annotation_type: &str, name: &str) -> Option<&'a str> {
        let node = self.hierarchy.get(annotation_type)?;
        let method = node
            .methods
            .iter()
            .find(|m| m.name == name && m.descriptor.starts_with("()"))?;
        self.method_target(annotation_type, name, &method.descriptor)
    }
}

/// Mutable state of one class rewrite.
struct ClassPass<'r, 'a> {
    rewriter: Rewriter<'a>,
    owner: &'r str,
    /// Pool as parsed; all names are read from here.
    original: ConstantPool,
    unresolved: BTreeSet<String>,
    frames_removed: usize,
}

type PassResult<T = ()> = std::result::Result<T, ClassFileError>;

impl<'a> ClassPass<'_, 'a> {
    fn run(&mut self, class: &mut ClassFile) -> PassResult {
        let bootstrap = class
            .attributes
            .iter()
            .find_map(|attr| match &attr.info {
                AttributeInfo::BootstrapMethods(methods) => Some(methods.clone()),
                _ => None,
            })
            .unwrap_or_default();

        let mut cp = class.constant_pool.editor();
        self.rewrite_pool(&mut cp, &bootstrap)?;

        for field in &mut class.fields {
            let name = self.original.utf8(field.name_index)?;
            let desc = self.original.utf8(field.descriptor_index)?;
            if let Some(target) = self.rewriter.field_target(self.owner, name, desc) {
                if target != name {
                    field.name_index = cp.utf8(target)?;
                }
            }
            field.descriptor_index = self.descriptor_index(&mut cp, field.descriptor_index)?;
            self.rewrite_attributes(&mut cp, &mut field.attributes)?;
        }

        for method in &mut class.methods {
            let name = self.original.utf8(method.name_index)?;
            let desc = self.original.utf8(method.descriptor_index)?;
            if let Some(target) = self.rewriter.method_target(self.owner, name, desc) {
                if target != name {
                    method.name_index = cp.utf8(target)?;
                }
            }
            method.descriptor_index = self.descriptor_index(&mut cp, method.descriptor_index)?;
            self.rewrite_attributes(&mut cp, &mut method.attributes)?;
        }

        self.rewrite_attributes(&mut cp, &mut class.attributes)
    }

    fn map_descriptor(&mut self, desc: &str) -> PassResult<String> {
        let (rewriter, unresolved) = (self.rewriter, &mut self.unresolved);
        map_descriptor(desc, |name| rewriter.class_target(name, unresolved))
    }

    fn map_signature(&mut self, signature: &str) -> PassResult<String> {
        let (rewriter, unresolved) = (self.rewriter, &mut self.unresolved);
        map_signature(signature, |name| rewriter.class_target(name, unresolved))
    }

    fn map_class(&mut self, name: &str) -> PassResult<String> {
        let (rewriter, unresolved) = (self.rewriter, &mut self.unresolved);
        map_class_or_array(name, |n| rewriter.class_target(n, unresolved))
    }

    /// Index of a Utf8 holding the remapped form of the descriptor at `index`.
    fn descriptor_index(&mut self, cp: &mut PoolEditor<'_>, index: u16) -> PassResult<u16> {
        let desc = self.original.utf8(index)?.to_string();
        let mapped = self.map_descriptor(&desc)?;
        if mapped == desc {
            Ok(index)
        } else {
            cp.utf8(&mapped)
        }
    }

    fn signature_index(&mut self, cp: &mut PoolEditor<'_>, index: u16) -> PassResult<u16> {
        let signature = self.original.utf8(index)?.to_string();
        let mapped = self.map_signature(&signature)?;
        if mapped == signature {
            Ok(index)
        } else {
            cp.utf8(&mapped)
        }
    }

    fn rewrite_pool(
        &mut self,
        cp: &mut PoolEditor<'_>,
        bootstrap: &[BootstrapMethod],
    ) -> PassResult {
        let entries: Vec<(u16, Constant)> = self
            .original
            .iter()
            .map(|(index, constant)| (index, constant.clone()))
            .collect();

        for (index, constant) in entries {
            match constant {
                Constant::Class { name_index } => {
                    let name = self.original.utf8(name_index)?.to_string();
                    let mapped = self.map_class(&name)?;
                    if mapped != name {
                        let name_index = cp.utf8(&mapped)?;
                        cp.set(index, Constant::Class { name_index })?;
                    }
                }
                Constant::Fieldref { .. }
                | Constant::Methodref { .. }
                | Constant::InterfaceMethodref { .. } => {
                    let member = self.original.member_ref(index)?;
                    let (kind, class_index) = (member.kind, member.class_index);
                    let (name, desc) = (member.name.to_string(), member.descriptor.to_string());
                    let new_name = self.member_target(&member).unwrap_or(member.name).to_string();
                    let new_desc = self.map_descriptor(&desc)?;
                    if new_name != name || new_desc != desc {
                        let name_and_type_index = cp.name_and_type(&new_name, &new_desc)?;
                        let updated = match kind {
                            RefKind::Field => Constant::Fieldref {
                                class_index,
                                name_and_type_index,
                            },
                            RefKind::Method => Constant::Methodref {
                                class_index,
                                name_and_type_index,
                            },
                            RefKind::InterfaceMethod => Constant::InterfaceMethodref {
                                class_index,
                                name_and_type_index,
                            },
                        };
                        cp.set(index, updated)?;
                    }
                }
                Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    let (name, desc) = self.original.name_and_type(name_and_type_index)?;
                    let (name, desc) = (name.to_string(), desc.to_string());
                    let lambda_name = self.lambda_target(
                        bootstrap.get(bootstrap_method_attr_index as usize),
                        &name,
                        &desc,
                    )?;
                    let new_name = lambda_name.unwrap_or_else(|| name.clone());
                    let new_desc = self.map_descriptor(&desc)?;
                    if new_name != name || new_desc != desc {
                        let name_and_type_index = cp.name_and_type(&new_name, &new_desc)?;
                        cp.set(
                            index,
                            Constant::InvokeDynamic {
                                bootstrap_method_attr_index,
                                name_and_type_index,
                            },
                        )?;
                    }
                }
                Constant::Dynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    let (name, desc) = self.original.name_and_type(name_and_type_index)?;
                    let (name, desc) = (name.to_string(), desc.to_string());
                    let new_desc = self.map_descriptor(&desc)?;
                    if new_desc != desc {
                        let name_and_type_index = cp.name_and_type(&name, &new_desc)?;
                        cp.set(
                            index,
                            Constant::Dynamic {
                                bootstrap_method_attr_index,
                                name_and_type_index,
                            },
                        )?;
                    }
                }
                Constant::MethodType { descriptor_index } => {
                    let new_index = self.descriptor_index(cp, descriptor_index)?;
                    if new_index != descriptor_index {
                        cp.set(
                            index,
                            Constant::MethodType {
                                descriptor_index: new_index,
                            },
                        )?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn member_target(&self, member: &MemberRef<'_>) -> Option<&'a str> {
        // Members of array types (`[I.clone()`) are never mapped.
        if member.owner.starts_with('[') {
            return None;
        }
        match member.kind {
            RefKind::Field => {
                self.rewriter
                    .field_target(member.owner, member.name, member.descriptor)
            }
            RefKind::Method | RefKind::InterfaceMethod => {
                self.rewriter
                    .method_target(member.owner, member.name, member.descriptor)
            }
        }
    }

    /// New name of a lambda call site: the implemented interface method, found
    /// from the call site's return type and the erased method type passed as
    /// the first bootstrap argument.
    fn lambda_target(
        &self,
        bootstrap: Option<&BootstrapMethod>,
        name: &str,
        desc: &str,
    ) -> PassResult<Option<String>> {
        let Some(bootstrap) = bootstrap else {
            return Ok(None);
        };
        let &Constant::MethodHandle {
            reference_index, ..
        } = self.original.get(bootstrap.method_ref)?
        else {
            return Ok(None);
        };
        let factory = self.original.member_ref(reference_index)?;
        if factory.owner != LAMBDA_METAFACTORY {
            return Ok(None);
        }
        let (Some(interface), Some(&first_arg)) = (return_class(desc), bootstrap.arguments.first())
        else {
            return Ok(None);
        };
        let &Constant::MethodType { descriptor_index } = self.original.get(first_arg)? else {
            return Ok(None);
        };
        let sam_desc = self.original.utf8(descriptor_index)?;
        Ok(self
            .rewriter
            .method_target(interface, name, sam_desc)
            .filter(|target| *target != name)
            .map(str::to_string))
    }

    fn rewrite_attributes(
        &mut self,
        cp: &mut PoolEditor<'_>,
        attributes: &mut Vec<Attribute>,
    ) -> PassResult {
        for attribute in attributes.iter_mut() {
            match &mut attribute.info {
                AttributeInfo::Code(code) => {
                    if self.rewriter.config.remove_frames {
                        self.frames_removed += code.strip_frames();
                    }
                    self.rewrite_attributes(cp, &mut code.attributes)?;
                }
                AttributeInfo::Signature { signature_index } => {
                    *signature_index = self.signature_index(cp, *signature_index)?;
                }
                AttributeInfo::LocalVariableTable(vars) => {
                    for var in vars {
                        var.descriptor_index = self.descriptor_index(cp, var.descriptor_index)?;
                    }
                }
                AttributeInfo::LocalVariableTypeTable(vars) => {
                    for var in vars {
                        var.descriptor_index = self.signature_index(cp, var.descriptor_index)?;
                    }
                }
                AttributeInfo::StackMapTable(frames) => {
                    // Object types point at Class entries, which were renamed
                    // in place.
                    check_frame_classes(frames, cp.pool())?;
                }
                AttributeInfo::InnerClasses(classes) => {
                    for entry in classes {
                        if entry.inner_name_index == 0 {
                            continue;
                        }
                        let inner = self.original.class_name(entry.inner_class_info_index)?;
                        let mapped_inner = cp.pool().class_name(entry.inner_class_info_index)?;
                        if inner == mapped_inner {
                            continue;
                        }
                        let mapped_outer = match entry.outer_class_info_index {
                            0 => None,
                            index => Some(cp.pool().class_name(index)?.to_string()),
                        };
                        let simple =
                            inner_simple_name(mapped_inner, mapped_outer.as_deref()).to_string();
                        if simple != self.original.utf8(entry.inner_name_index)? {
                            entry.inner_name_index = cp.utf8(&simple)?;
                        }
                    }
                }
                AttributeInfo::EnclosingMethod {
                    class_index,
                    method_index,
                } => {
                    if *method_index != 0 {
                        let owner = self.original.class_name(*class_index)?.to_string();
                        let (name, desc) = self.original.name_and_type(*method_index)?;
                        let (name, desc) = (name.to_string(), desc.to_string());
                        let new_name = self
                            .rewriter
                            .method_target(&owner, &name, &desc)
                            .unwrap_or(&name)
                            .to_string();
                        let new_desc = self.map_descriptor(&desc)?;
                        if new_name != name || new_desc != desc {
                            *method_index = cp.name_and_type(&new_name, &new_desc)?;
                        }
                    }
                }
                AttributeInfo::Record(components) => {
                    for component in components {
                        let name = self.original.utf8(component.name_index)?;
                        let desc = self.original.utf8(component.descriptor_index)?;
                        if let Some(target) = self.rewriter.field_target(self.owner, name, desc) {
                            if target != name {
                                component.name_index = cp.utf8(target)?;
                            }
                        }
                        component.descriptor_index =
                            self.descriptor_index(cp, component.descriptor_index)?;
                        self.rewrite_attributes(cp, &mut component.attributes)?;
                    }
                }
                AttributeInfo::Annotations(annotations) => {
                    for annotation in annotations {
                        self.rewrite_annotation(cp, annotation)?;
                    }
                }
                AttributeInfo::ParameterAnnotations(parameters) => {
                    for annotation in parameters.iter_mut().flatten() {
                        self.rewrite_annotation(cp, annotation)?;
                    }
                }
                AttributeInfo::TypeAnnotations(annotations) => {
                    for TypeAnnotation { annotation, .. } in annotations {
                        self.rewrite_annotation(cp, annotation)?;
                    }
                }
                AttributeInfo::AnnotationDefault(value) => {
                    self.rewrite_element(cp, value)?;
                }
                AttributeInfo::BootstrapMethods(_) | AttributeInfo::Raw(_) => {}
            }
        }
        Ok(())
    }

    fn rewrite_annotation(
        &mut self,
        cp: &mut PoolEditor<'_>,
        annotation: &mut Annotation,
    ) -> PassResult {
        let type_desc = self.original.utf8(annotation.type_index)?.to_string();
        annotation.type_index = self.descriptor_index(cp, annotation.type_index)?;
        let annotation_type = type_desc
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
            .map(str::to_string);

        for pair in &mut annotation.elements {
            if let Some(annotation_type) = &annotation_type {
                let name = self.original.utf8(pair.name_index)?;
                if let Some(target) = self.rewriter.element_target(annotation_type, name) {
                    if target != name {
                        pair.name_index = cp.utf8(target)?;
                    }
                }
            }
            self.rewrite_element(cp, &mut pair.value)?;
        }
        Ok(())
    }

    fn rewrite_element(&mut self, cp: &mut PoolEditor<'_>, value: &mut ElementValue) -> PassResult {
        match value {
            ElementValue::Const { .. } => {}
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => {
                let type_desc = self.original.utf8(*type_name_index)?.to_string();
                if let Some(enum_type) = type_desc
                    .strip_prefix('L')
                    .and_then(|rest| rest.strip_suffix(';'))
                {
                    let name = self.original.utf8(*const_name_index)?;
                    if let Some(target) = self.rewriter.field_target(enum_type, name, &type_desc) {
                        if target != name {
                            *const_name_index = cp.utf8(target)?;
                        }
                    }
                }
                *type_name_index = self.descriptor_index(cp, *type_name_index)?;
            }
            ElementValue::Class { class_info_index } => {
                *class_info_index = self.descriptor_index(cp, *class_info_index)?;
            }
            ElementValue::Annotation(nested) => self.rewrite_annotation(cp, nested)?,
            ElementValue::Array(values) => {
                for value in values {
                    self.rewrite_element(cp, value)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{ClassNode, HierarchyBuilder, ModuleRole};
    use crate::propagation::propagate;
    use indexmap::IndexSet;
    use remapper_classfile::access::{ACC_ABSTRACT, ACC_INTERFACE, ACC_PUBLIC, ACC_STATIC};
    use remapper_classfile::{AnnotationSpec, ClassFileBuilder, ElementSpec};
    use remapper_mappings::MappingSet;

    const OBJECT: Option<&str> = Some("java/lang/Object");

    fn remap(
        builders: &[&ClassFileBuilder],
        set: MappingSet,
        config: RemapperConfig,
    ) -> Vec<RewrittenClass> {
        let classes: Vec<ClassFile> = builders
            .iter()
            .map(|builder| builder.build_class().unwrap())
            .collect();
        let graph = HierarchyBuilder::new();
        for class in &classes {
            graph
                .ingest(ClassNode::from_class(class, ModuleRole::RewriteTarget).unwrap())
                .unwrap();
        }
        let hierarchy = graph.close();
        let outcome = propagate(&hierarchy, MappingTable::new(set, IndexSet::new()), &config);
        let rewriter = Rewriter::new(&hierarchy, &outcome.table, &config);
        classes
            .into_iter()
            .map(|class| rewriter.rewrite(class).unwrap())
            .collect()
    }

    fn member_refs(class: &ClassFile) -> Vec<(String, String, String)> {
        let pool = &class.constant_pool;
        pool.iter()
            .filter(|(_, c)| {
                matches!(
                    c,
                    Constant::Fieldref { .. }
                        | Constant::Methodref { .. }
                        | Constant::InterfaceMethodref { .. }
                )
            })
            .map(|(index, _)| {
                let member = pool.member_ref(index).unwrap();
                (
                    member.owner.to_string(),
                    member.name.to_string(),
                    member.descriptor.to_string(),
                )
            })
            .collect()
    }

    fn method_attribute<'c>(class: &'c ClassFile, method: usize) -> &'c [Attribute] {
        &class.methods[method].attributes
    }

    #[test]
    fn test_empty_mappings_keep_bytes() {
        let mut builder = ClassFileBuilder::new("a/Plain", OBJECT);
        builder
            .field(ACC_PUBLIC, "count", "I")
            .method(ACC_PUBLIC, "get", "()I", |code| {
                code.aload(0).get_field("a/Plain", "count", "I").areturn();
            });
        let original = builder.build().unwrap();
        let out = remap(&[&builder], MappingSet::new(), RemapperConfig::default());
        assert_eq!(out[0].bytes, original);
        assert_eq!(out[0].name, "a/Plain");
    }

    #[test]
    fn test_inherited_field_reference_uses_declaring_mapping() {
        let mut base = ClassFileBuilder::new("a/Base", OBJECT);
        base.field(ACC_PUBLIC, "f", "I");
        let child = ClassFileBuilder::new("a/Child", Some("a/Base"));
        let mut user = ClassFileBuilder::new("a/User", OBJECT);
        user.method(ACC_PUBLIC, "read", "(La/Child;)I", |code| {
            code.aload(1).get_field("a/Child", "f", "I").areturn();
        });
        let mut set = MappingSet::new();
        set.add_class("a/Child", "b/Kid")
            .add_field(MemberKey::new("a/Base", "f", "I"), "value");

        let out = remap(&[&base, &child, &user], set, RemapperConfig::default());
        let user = ClassFile::parse(&out[2].bytes).unwrap();
        assert!(member_refs(&user).contains(&(
            "b/Kid".to_string(),
            "value".to_string(),
            "I".to_string()
        )));
        let method = &user.methods[0];
        assert_eq!(method.descriptor(&user.constant_pool).unwrap(), "(Lb/Kid;)I");

        let base = ClassFile::parse(&out[0].bytes).unwrap();
        assert_eq!(base.fields[0].name(&base.constant_pool).unwrap(), "value");
    }

    #[test]
    fn test_class_rename_reaches_signatures_and_locals() {
        let mut builder = ClassFileBuilder::new("a/Box", OBJECT);
        builder
            .signature("<T:La/Item;>Ljava/lang/Object;")
            .method(ACC_PUBLIC, "put", "(La/Item;)V", |code| {
                code.ret()
                    .local_variable("item", "La/Item;", 1)
                    .local_variable_type("all", "Ljava/util/List<La/Item;>;", 2);
            });
        let mut set = MappingSet::new();
        set.add_class("a/Box", "b/Crate").add_class("a/Item", "b/Thing");

        let out = remap(&[&builder], set, RemapperConfig::default());
        assert_eq!(out[0].original_name, "a/Box");
        assert_eq!(out[0].name, "b/Crate");
        let class = ClassFile::parse(&out[0].bytes).unwrap();
        let pool = &class.constant_pool;

        let signature = class.attributes.iter().find_map(|attr| match attr.info {
            AttributeInfo::Signature { signature_index } => Some(signature_index),
            _ => None,
        });
        assert_eq!(
            pool.utf8(signature.unwrap()).unwrap(),
            "<T:Lb/Thing;>Ljava/lang/Object;"
        );

        let AttributeInfo::Code(code) = &method_attribute(&class, 0)[0].info else {
            panic!("expected Code");
        };
        for attr in &code.attributes {
            match &attr.info {
                AttributeInfo::LocalVariableTable(vars) => {
                    assert_eq!(pool.utf8(vars[0].descriptor_index).unwrap(), "Lb/Thing;");
                }
                AttributeInfo::LocalVariableTypeTable(vars) => {
                    assert_eq!(
                        pool.utf8(vars[0].descriptor_index).unwrap(),
                        "Ljava/util/List<Lb/Thing;>;"
                    );
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_lambda_call_site_follows_interface_method() {
        let mut iface = ClassFileBuilder::new("a/Task", OBJECT);
        iface
            .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
            .method_with(ACC_PUBLIC | ACC_ABSTRACT, "call", "()V", |_| {});
        let mut host = ClassFileBuilder::new("a/Host", OBJECT);
        host.method(ACC_STATIC, "make", "()La/Task;", |code| {
            code.invoke_lambda("call", "()La/Task;", "()V", ("a/Host", "lambda$make$0", "()V"))
                .areturn();
        })
        .method(ACC_STATIC, "lambda$make$0", "()V", |code| {
            code.ret();
        });
        let mut set = MappingSet::new();
        set.add_method(MemberKey::new("a/Task", "call", "()V"), "execute");

        let out = remap(&[&iface, &host], set, RemapperConfig::default());
        let host = ClassFile::parse(&out[1].bytes).unwrap();
        let pool = &host.constant_pool;
        let call_sites: Vec<&str> = pool
            .iter()
            .filter_map(|(_, c)| match c {
                Constant::InvokeDynamic {
                    name_and_type_index,
                    ..
                } => Some(pool.name_and_type(*name_and_type_index).unwrap().0),
                _ => None,
            })
            .collect();
        assert_eq!(call_sites, vec!["execute"]);
    }

    #[test]
    fn test_frames_removed_or_kept() {
        let mut builder = ClassFileBuilder::new("a/Frames", OBJECT);
        builder.method(ACC_PUBLIC, "m", "(La/Frames;)V", |code| {
            code.aload(1)
                .checkcast("a/Frames")
                .pop()
                .ret()
                .frame_with_stack_object("a/Frames");
        });
        let mut set = MappingSet::new();
        set.add_class("a/Frames", "b/Frames");

        let kept = remap(&[&builder], set.clone(), RemapperConfig::default());
        assert_eq!(kept[0].frames_removed, 0);
        let class = ClassFile::parse(&kept[0].bytes).unwrap();
        let AttributeInfo::Code(code) = &method_attribute(&class, 0)[0].info else {
            panic!("expected Code");
        };
        let frames = code.frames().unwrap();
        check_frame_classes(frames, &class.constant_pool).unwrap();

        let stripped = remap(&[&builder], set, RemapperConfig::default().with_remove_frames(true));
        assert_eq!(stripped[0].frames_removed, 1);
        let class = ClassFile::parse(&stripped[0].bytes).unwrap();
        let AttributeInfo::Code(code) = &method_attribute(&class, 0)[0].info else {
            panic!("expected Code");
        };
        assert!(code.frames().is_none());
    }

    #[test]
    fn test_annotation_elements_and_enum_constants() {
        let mut annotation = ClassFileBuilder::new("a/Ann", OBJECT);
        annotation
            .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
            .method_with(ACC_PUBLIC | ACC_ABSTRACT, "value", "()I", |_| {});
        let mut level = ClassFileBuilder::new("a/Level", Some("java/lang/Enum"));
        level.field(ACC_PUBLIC | ACC_STATIC, "HIGH", "La/Level;");
        let mut target = ClassFileBuilder::new("a/Target", OBJECT);
        target.annotate(
            AnnotationSpec::new("La/Ann;")
                .element("value", ElementSpec::Int(3))
                .element(
                    "level",
                    ElementSpec::Enum {
                        descriptor: "La/Level;".to_string(),
                        name: "HIGH".to_string(),
                    },
                ),
        );
        let mut set = MappingSet::new();
        set.add_class("a/Ann", "b/Note")
            .add_method(MemberKey::new("a/Ann", "value", "()I"), "amount")
            .add_field(MemberKey::new("a/Level", "HIGH", "La/Level;"), "TOP");

        let out = remap(&[&annotation, &level, &target], set, RemapperConfig::default());
        let class = ClassFile::parse(&out[2].bytes).unwrap();
        let pool = &class.constant_pool;
        let annotations = class
            .attributes
            .iter()
            .find_map(|attr| match &attr.info {
                AttributeInfo::Annotations(list) => Some(list),
                _ => None,
            })
            .unwrap();
        let annotation = &annotations[0];
        assert_eq!(pool.utf8(annotation.type_index).unwrap(), "Lb/Note;");
        assert_eq!(pool.utf8(annotation.elements[0].name_index).unwrap(), "amount");
        let ElementValue::Enum {
            const_name_index, ..
        } = annotation.elements[1].value
        else {
            panic!("expected enum element");
        };
        assert_eq!(pool.utf8(const_name_index).unwrap(), "TOP");
    }

    #[test]
    fn test_inner_class_simple_name_follows_mapping() {
        let mut outer = ClassFileBuilder::new("a/Outer", OBJECT);
        outer.inner_class("a/Outer$Inner", Some("a/Outer"), Some("Inner"), ACC_PUBLIC);
        let mut set = MappingSet::new();
        set.add_class("a/Outer", "b/Host")
            .add_class("a/Outer$Inner", "b/Host$Nested");

        let out = remap(&[&outer], set, RemapperConfig::default());
        let class = ClassFile::parse(&out[0].bytes).unwrap();
        let pool = &class.constant_pool;
        let entries = class
            .attributes
            .iter()
            .find_map(|attr| match &attr.info {
                AttributeInfo::InnerClasses(entries) => Some(entries),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            pool.class_name(entries[0].inner_class_info_index).unwrap(),
            "b/Host$Nested"
        );
        assert_eq!(pool.utf8(entries[0].inner_name_index).unwrap(), "Nested");
    }

    #[test]
    fn test_unknown_classes_pass_through_and_are_reported() {
        let mut builder = ClassFileBuilder::new("a/Caller", OBJECT);
        builder.method(ACC_PUBLIC, "go", "()V", |code| {
            code.invoke_static("z/Missing", "run", "()V").ret();
        });
        let out = remap(&[&builder], MappingSet::new(), RemapperConfig::default());
        assert!(out[0].unresolved.contains(&"z/Missing".to_string()));
        assert!(!out[0].unresolved.contains(&"a/Caller".to_string()));
        let class = ClassFile::parse(&out[0].bytes).unwrap();
        assert!(member_refs(&class).contains(&(
            "z/Missing".to_string(),
            "run".to_string(),
            "()V".to_string()
        )));
    }
}
