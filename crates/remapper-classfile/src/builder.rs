//! Programmatic class file construction.
//!
//! The builder records members and instructions symbolically and only interns
//! constants when [`ClassFileBuilder::build`] runs, so the resulting pool
//! layout is deterministic for a given sequence of builder calls.
//!
//! ```ignore
//! let mut builder = ClassFileBuilder::new("a/B", Some("java/lang/Object"));
//! builder.method(ACC_PUBLIC, "run", "()V", |code| {
//!     code.aload(0).invoke_virtual("a/B", "tick", "()V").ret();
//! });
//! let bytes = builder.build()?;
//! ```

use crate::access::{ACC_PUBLIC, ACC_SUPER};
use crate::annotations::{Annotation, ElementValue, ElementValuePair};
use crate::attributes::{
    self, Attribute, AttributeInfo, BootstrapMethod, CodeAttribute, InnerClass, LocalVariable,
    RecordComponent,
};
use crate::class::{ClassFile, MemberInfo};
use crate::constant_pool::{Constant, ConstantPool, PoolEditor, RefKind};
use crate::error::Result;
use crate::frames::{StackMapFrame, VerificationType};

/// Class file major version emitted by default (Java 17).
pub const DEFAULT_MAJOR_VERSION: u16 = 61;

const LAMBDA_METAFACTORY: &str = "java/lang/invoke/LambdaMetafactory";
const METAFACTORY_DESCRIPTOR: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;\
Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;\
Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;";
const REF_INVOKE_STATIC: u8 = 6;

/// Annotation description used by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSpec {
    pub descriptor: String,
    pub elements: Vec<(String, ElementSpec)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementSpec {
    Int(i32),
    String(String),
    Enum { descriptor: String, name: String },
    /// Return descriptor, e.g. `La/B;`.
    Class(String),
    Annotation(AnnotationSpec),
    Array(Vec<ElementSpec>),
}

impl AnnotationSpec {
    pub fn new(descriptor: &str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            elements: Vec::new(),
        }
    }

    pub fn element(mut self, name: &str, value: ElementSpec) -> Self {
        self.elements.push((name.to_string(), value));
        self
    }
}

#[derive(Debug, Clone)]
enum Insn {
    Simple(u8),
    Local(u8, u8),
    Member {
        opcode: u8,
        kind: RefKind,
        owner: String,
        name: String,
        descriptor: String,
    },
    Class(u8, String),
    LdcClass(String),
    Lambda {
        name: String,
        descriptor: String,
        sam_descriptor: String,
        implementation: (String, String, String),
    },
}

/// Method body under construction.
#[derive(Debug, Clone)]
pub struct CodeBuilder {
    insns: Vec<Insn>,
    max_stack: u16,
    max_locals: u16,
    locals: Vec<(String, String, u16)>,
    local_types: Vec<(String, String, u16)>,
    frame_objects: Vec<String>,
}

impl Default for CodeBuilder {
    fn default() -> Self {
        Self {
            insns: Vec::new(),
            max_stack: 8,
            max_locals: 8,
            locals: Vec::new(),
            local_types: Vec::new(),
            frame_objects: Vec::new(),
        }
    }
}

impl CodeBuilder {
    pub fn max_stack(&mut self, value: u16) -> &mut Self {
        self.max_stack = value;
        self
    }

    pub fn max_locals(&mut self, value: u16) -> &mut Self {
        self.max_locals = value;
        self
    }

    pub fn aload(&mut self, slot: u8) -> &mut Self {
        let insn = match slot {
            0..=3 => Insn::Simple(0x2A + slot),
            _ => Insn::Local(0x19, slot),
        };
        self.insns.push(insn);
        self
    }

    pub fn pop(&mut self) -> &mut Self {
        self.insns.push(Insn::Simple(0x57));
        self
    }

    pub fn ret(&mut self) -> &mut Self {
        self.insns.push(Insn::Simple(0xB1));
        self
    }

    pub fn areturn(&mut self) -> &mut Self {
        self.insns.push(Insn::Simple(0xB0));
        self
    }

    fn member(
        &mut self,
        opcode: u8,
        kind: RefKind,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> &mut Self {
        self.insns.push(Insn::Member {
            opcode,
            kind,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: desc.to_string(),
        });
        self
    }

    pub fn get_field(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.member(0xB4, RefKind::Field, owner, name, desc)
    }

    pub fn put_field(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.member(0xB5, RefKind::Field, owner, name, desc)
    }

    pub fn get_static(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.member(0xB2, RefKind::Field, owner, name, desc)
    }

    pub fn invoke_virtual(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.member(0xB6, RefKind::Method, owner, name, desc)
    }

    pub fn invoke_special(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.member(0xB7, RefKind::Method, owner, name, desc)
    }

    pub fn invoke_static(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.member(0xB8, RefKind::Method, owner, name, desc)
    }

    pub fn invoke_interface(&mut self, owner: &str, name: &str, desc: &str) -> &mut Self {
        self.member(0xB9, RefKind::InterfaceMethod, owner, name, desc)
    }

    /// `invokedynamic` through `LambdaMetafactory.metafactory` with a static
    /// implementation method.
    pub fn invoke_lambda(
        &mut self,
        name: &str,
        descriptor: &str,
        sam_descriptor: &str,
        implementation: (&str, &str, &str),
    ) -> &mut Self {
        self.insns.push(Insn::Lambda {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            sam_descriptor: sam_descriptor.to_string(),
            implementation: (
                implementation.0.to_string(),
                implementation.1.to_string(),
                implementation.2.to_string(),
            ),
        });
        self
    }

    pub fn new_object(&mut self, class: &str) -> &mut Self {
        self.insns.push(Insn::Class(0xBB, class.to_string()));
        self
    }

    pub fn checkcast(&mut self, class: &str) -> &mut Self {
        self.insns.push(Insn::Class(0xC0, class.to_string()));
        self
    }

    pub fn ldc_class(&mut self, class: &str) -> &mut Self {
        self.insns.push(Insn::LdcClass(class.to_string()));
        self
    }

    pub fn local_variable(&mut self, name: &str, desc: &str, slot: u16) -> &mut Self {
        self.locals.push((name.to_string(), desc.to_string(), slot));
        self
    }

    pub fn local_variable_type(&mut self, name: &str, signature: &str, slot: u16) -> &mut Self {
        self.local_types
            .push((name.to_string(), signature.to_string(), slot));
        self
    }

    /// Add a `same_locals_1_stack_item` frame whose stack item is `class`.
    pub fn frame_with_stack_object(&mut self, class: &str) -> &mut Self {
        self.frame_objects.push(class.to_string());
        self
    }

    fn assemble(
        &self,
        cp: &mut PoolEditor<'_>,
        bootstrap: &mut Vec<BootstrapMethod>,
    ) -> Result<CodeAttribute> {
        let mut code = Vec::new();
        for insn in &self.insns {
            match insn {
                Insn::Simple(opcode) => code.push(*opcode),
                Insn::Local(opcode, slot) => code.extend_from_slice(&[*opcode, *slot]),
                Insn::Member {
                    opcode,
                    kind,
                    owner,
                    name,
                    descriptor,
                } => {
                    let index = member_ref(cp, *kind, owner, name, descriptor)?;
                    code.push(*opcode);
                    code.extend_from_slice(&index.to_be_bytes());
                    if *opcode == 0xB9 {
                        code.extend_from_slice(&[argument_slots(descriptor) + 1, 0]);
                    }
                }
                Insn::Class(opcode, class) => {
                    code.push(*opcode);
                    code.extend_from_slice(&cp.class(class)?.to_be_bytes());
                }
                Insn::LdcClass(class) => {
                    code.push(0x13);
                    code.extend_from_slice(&cp.class(class)?.to_be_bytes());
                }
                Insn::Lambda {
                    name,
                    descriptor,
                    sam_descriptor,
                    implementation,
                } => {
                    let factory = member_ref(
                        cp,
                        RefKind::Method,
                        LAMBDA_METAFACTORY,
                        "metafactory",
                        METAFACTORY_DESCRIPTOR,
                    )?;
                    let factory_handle = cp.push(Constant::MethodHandle {
                        reference_kind: REF_INVOKE_STATIC,
                        reference_index: factory,
                    })?;
                    let (owner, impl_name, impl_desc) = implementation;
                    let target = member_ref(cp, RefKind::Method, owner, impl_name, impl_desc)?;
                    let sam = cp.utf8(sam_descriptor)?;
                    let sam_type = cp.push(Constant::MethodType {
                        descriptor_index: sam,
                    })?;
                    let target_handle = cp.push(Constant::MethodHandle {
                        reference_kind: REF_INVOKE_STATIC,
                        reference_index: target,
                    })?;
                    bootstrap.push(BootstrapMethod {
                        method_ref: factory_handle,
                        arguments: vec![sam_type, target_handle, sam_type],
                    });
                    let name_and_type_index = cp.name_and_type(name, descriptor)?;
                    let index = cp.push(Constant::InvokeDynamic {
                        bootstrap_method_attr_index: (bootstrap.len() - 1) as u16,
                        name_and_type_index,
                    })?;
                    code.push(0xBA);
                    code.extend_from_slice(&index.to_be_bytes());
                    code.extend_from_slice(&[0, 0]);
                }
            }
        }

        let mut nested = Vec::new();
        if !self.frame_objects.is_empty() {
            let frames = self
                .frame_objects
                .iter()
                .map(|class| -> Result<StackMapFrame> {
                    Ok(StackMapFrame::SameLocals1StackItem {
                        frame_type: 64,
                        stack: VerificationType::Object(cp.class(class)?),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            nested.push(Attribute {
                name_index: cp.utf8(attributes::STACK_MAP_TABLE)?,
                info: AttributeInfo::StackMapTable(frames),
            });
        }
        let length = code.len() as u16;
        for (entries, attribute_name, is_type_table) in [
            (&self.locals, attributes::LOCAL_VARIABLE_TABLE, false),
            (&self.local_types, attributes::LOCAL_VARIABLE_TYPE_TABLE, true),
        ] {
            if entries.is_empty() {
                continue;
            }
            let vars = entries
                .iter()
                .map(|(name, desc, slot)| -> Result<LocalVariable> {
                    Ok(LocalVariable {
                        start_pc: 0,
                        length,
                        name_index: cp.utf8(name)?,
                        descriptor_index: cp.utf8(desc)?,
                        index: *slot,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let info = if is_type_table {
                AttributeInfo::LocalVariableTypeTable(vars)
            } else {
                AttributeInfo::LocalVariableTable(vars)
            };
            nested.push(Attribute {
                name_index: cp.utf8(attribute_name)?,
                info,
            });
        }

        Ok(CodeAttribute {
            max_stack: self.max_stack,
            max_locals: self.max_locals,
            code,
            exception_table: Vec::new(),
            attributes: nested,
        })
    }
}

/// Optional parts of a field or method.
#[derive(Debug, Clone, Default)]
pub struct MemberBuilder {
    signature: Option<String>,
    annotations: Vec<AnnotationSpec>,
    code: Option<CodeBuilder>,
}

impl MemberBuilder {
    pub fn signature(&mut self, signature: &str) -> &mut Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn annotate(&mut self, annotation: AnnotationSpec) -> &mut Self {
        self.annotations.push(annotation);
        self
    }

    pub fn code(&mut self, body: impl FnOnce(&mut CodeBuilder)) -> &mut Self {
        let mut code = CodeBuilder::default();
        body(&mut code);
        self.code = Some(code);
        self
    }
}

#[derive(Debug, Clone)]
struct MemberSpec {
    access_flags: u16,
    name: String,
    descriptor: String,
    parts: MemberBuilder,
}

#[derive(Debug, Clone)]
struct InnerClassSpec {
    inner: String,
    outer: Option<String>,
    simple_name: Option<String>,
    access_flags: u16,
}

#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    name: String,
    super_name: Option<String>,
    access_flags: u16,
    major_version: u16,
    interfaces: Vec<String>,
    fields: Vec<MemberSpec>,
    methods: Vec<MemberSpec>,
    signature: Option<String>,
    source_file: Option<String>,
    inner_classes: Vec<InnerClassSpec>,
    enclosing_method: Option<(String, Option<(String, String)>)>,
    record_components: Vec<(String, String)>,
    annotations: Vec<AnnotationSpec>,
}

impl ClassFileBuilder {
    pub fn new(name: &str, super_name: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            super_name: super_name.map(str::to_string),
            access_flags: ACC_PUBLIC | ACC_SUPER,
            major_version: DEFAULT_MAJOR_VERSION,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            signature: None,
            source_file: None,
            inner_classes: Vec::new(),
            enclosing_method: None,
            record_components: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn access(&mut self, flags: u16) -> &mut Self {
        self.access_flags = flags;
        self
    }

    pub fn major_version(&mut self, version: u16) -> &mut Self {
        self.major_version = version;
        self
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        self.interfaces.push(name.to_string());
        self
    }

    pub fn field(&mut self, flags: u16, name: &str, desc: &str) -> &mut Self {
        self.field_with(flags, name, desc, |_| {})
    }

    pub fn field_with(
        &mut self,
        flags: u16,
        name: &str,
        desc: &str,
        parts: impl FnOnce(&mut MemberBuilder),
    ) -> &mut Self {
        let mut builder = MemberBuilder::default();
        parts(&mut builder);
        self.fields.push(MemberSpec {
            access_flags: flags,
            name: name.to_string(),
            descriptor: desc.to_string(),
            parts: builder,
        });
        self
    }

    /// Add a method with a body.
    pub fn method(
        &mut self,
        flags: u16,
        name: &str,
        desc: &str,
        body: impl FnOnce(&mut CodeBuilder),
    ) -> &mut Self {
        self.method_with(flags, name, desc, |m| {
            m.code(body);
        })
    }

    /// Add a method; it has no `Code` attribute unless `parts` sets one.
    pub fn method_with(
        &mut self,
        flags: u16,
        name: &str,
        desc: &str,
        parts: impl FnOnce(&mut MemberBuilder),
    ) -> &mut Self {
        let mut builder = MemberBuilder::default();
        parts(&mut builder);
        self.methods.push(MemberSpec {
            access_flags: flags,
            name: name.to_string(),
            descriptor: desc.to_string(),
            parts: builder,
        });
        self
    }

    pub fn signature(&mut self, signature: &str) -> &mut Self {
        self.signature = Some(signature.to_string());
        self
    }

    pub fn source_file(&mut self, file: &str) -> &mut Self {
        self.source_file = Some(file.to_string());
        self
    }

    pub fn inner_class(
        &mut self,
        inner: &str,
        outer: Option<&str>,
        simple_name: Option<&str>,
        flags: u16,
    ) -> &mut Self {
        self.inner_classes.push(InnerClassSpec {
            inner: inner.to_string(),
            outer: outer.map(str::to_string),
            simple_name: simple_name.map(str::to_string),
            access_flags: flags,
        });
        self
    }

    pub fn enclosing_method(&mut self, class: &str, method: Option<(&str, &str)>) -> &mut Self {
        self.enclosing_method = Some((
            class.to_string(),
            method.map(|(name, desc)| (name.to_string(), desc.to_string())),
        ));
        self
    }

    pub fn record_component(&mut self, name: &str, desc: &str) -> &mut Self {
        self.record_components
            .push((name.to_string(), desc.to_string()));
        self
    }

    pub fn annotate(&mut self, annotation: AnnotationSpec) -> &mut Self {
        self.annotations.push(annotation);
        self
    }

    pub fn build_class(&self) -> Result<ClassFile> {
        let mut pool = ConstantPool::new();
        let mut cp = pool.editor();
        let mut bootstrap = Vec::new();

        let this_class = cp.class(&self.name)?;
        let super_class = match &self.super_name {
            Some(name) => cp.class(name)?,
            None => 0,
        };
        let interfaces = self
            .interfaces
            .iter()
            .map(|name| cp.class(name))
            .collect::<Result<Vec<_>>>()?;
        let fields = self
            .fields
            .iter()
            .map(|spec| build_member(&mut cp, spec, &mut bootstrap))
            .collect::<Result<Vec<_>>>()?;
        let methods = self
            .methods
            .iter()
            .map(|spec| build_member(&mut cp, spec, &mut bootstrap))
            .collect::<Result<Vec<_>>>()?;

        let mut class_attributes = Vec::new();
        if let Some(file) = &self.source_file {
            let name_index = cp.utf8("SourceFile")?;
            let file_index = cp.utf8(file)?;
            class_attributes.push(Attribute {
                name_index,
                info: AttributeInfo::Raw(file_index.to_be_bytes().to_vec()),
            });
        }
        if let Some(signature) = &self.signature {
            class_attributes.push(signature_attribute(&mut cp, signature)?);
        }
        if !self.inner_classes.is_empty() {
            let classes = self
                .inner_classes
                .iter()
                .map(|spec| -> Result<InnerClass> {
                    Ok(InnerClass {
                        inner_class_info_index: cp.class(&spec.inner)?,
                        outer_class_info_index: match &spec.outer {
                            Some(outer) => cp.class(outer)?,
                            None => 0,
                        },
                        inner_name_index: match &spec.simple_name {
                            Some(simple) => cp.utf8(simple)?,
                            None => 0,
                        },
                        inner_class_access_flags: spec.access_flags,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            class_attributes.push(Attribute {
                name_index: cp.utf8(attributes::INNER_CLASSES)?,
                info: AttributeInfo::InnerClasses(classes),
            });
        }
        if let Some((class, method)) = &self.enclosing_method {
            let class_index = cp.class(class)?;
            let method_index = match method {
                Some((name, desc)) => cp.name_and_type(name, desc)?,
                None => 0,
            };
            class_attributes.push(Attribute {
                name_index: cp.utf8(attributes::ENCLOSING_METHOD)?,
                info: AttributeInfo::EnclosingMethod {
                    class_index,
                    method_index,
                },
            });
        }
        if !self.record_components.is_empty() {
            let components = self
                .record_components
                .iter()
                .map(|(name, desc)| -> Result<RecordComponent> {
                    Ok(RecordComponent {
                        name_index: cp.utf8(name)?,
                        descriptor_index: cp.utf8(desc)?,
                        attributes: Vec::new(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            class_attributes.push(Attribute {
                name_index: cp.utf8(attributes::RECORD)?,
                info: AttributeInfo::Record(components),
            });
        }
        if !self.annotations.is_empty() {
            class_attributes.push(annotations_attribute(&mut cp, &self.annotations)?);
        }
        if !bootstrap.is_empty() {
            class_attributes.push(Attribute {
                name_index: cp.utf8(attributes::BOOTSTRAP_METHODS)?,
                info: AttributeInfo::BootstrapMethods(bootstrap),
            });
        }
        drop(cp);

        Ok(ClassFile {
            minor_version: 0,
            major_version: self.major_version,
            constant_pool: pool,
            access_flags: self.access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes: class_attributes,
        })
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        self.build_class()?.to_bytes()
    }
}

fn build_member(
    cp: &mut PoolEditor<'_>,
    spec: &MemberSpec,
    bootstrap: &mut Vec<BootstrapMethod>,
) -> Result<MemberInfo> {
    let name_index = cp.utf8(&spec.name)?;
    let descriptor_index = cp.utf8(&spec.descriptor)?;
    let mut member_attributes = Vec::new();
    if let Some(code) = &spec.parts.code {
        let code = code.assemble(cp, bootstrap)?;
        member_attributes.push(Attribute {
            name_index: cp.utf8(attributes::CODE)?,
            info: AttributeInfo::Code(code),
        });
    }
    if let Some(signature) = &spec.parts.signature {
        member_attributes.push(signature_attribute(cp, signature)?);
    }
    if !spec.parts.annotations.is_empty() {
        member_attributes.push(annotations_attribute(cp, &spec.parts.annotations)?);
    }
    Ok(MemberInfo {
        access_flags: spec.access_flags,
        name_index,
        descriptor_index,
        attributes: member_attributes,
    })
}

fn member_ref(
    cp: &mut PoolEditor<'_>,
    kind: RefKind,
    owner: &str,
    name: &str,
    desc: &str,
) -> Result<u16> {
    let class_index = cp.class(owner)?;
    let name_and_type_index = cp.name_and_type(name, desc)?;
    let constant = match kind {
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
    cp.push(constant)
}

fn signature_attribute(cp: &mut PoolEditor<'_>, signature: &str) -> Result<Attribute> {
    Ok(Attribute {
        name_index: cp.utf8(attributes::SIGNATURE)?,
        info: AttributeInfo::Signature {
            signature_index: cp.utf8(signature)?,
        },
    })
}

fn annotations_attribute(cp: &mut PoolEditor<'_>, specs: &[AnnotationSpec]) -> Result<Attribute> {
    let annotations = specs
        .iter()
        .map(|spec| build_annotation(cp, spec))
        .collect::<Result<Vec<_>>>()?;
    Ok(Attribute {
        name_index: cp.utf8(attributes::RUNTIME_VISIBLE_ANNOTATIONS)?,
        info: AttributeInfo::Annotations(annotations),
    })
}

fn build_annotation(cp: &mut PoolEditor<'_>, spec: &AnnotationSpec) -> Result<Annotation> {
    let type_index = cp.utf8(&spec.descriptor)?;
    let elements = spec
        .elements
        .iter()
        .map(|(name, value)| -> Result<ElementValuePair> {
            Ok(ElementValuePair {
                name_index: cp.utf8(name)?,
                value: build_element(cp, value)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Annotation {
        type_index,
        elements,
    })
}

fn build_element(cp: &mut PoolEditor<'_>, spec: &ElementSpec) -> Result<ElementValue> {
    Ok(match spec {
        ElementSpec::Int(value) => ElementValue::Const {
            tag: b'I',
            const_value_index: cp.push(Constant::Integer(*value as u32))?,
        },
        ElementSpec::String(value) => ElementValue::Const {
            tag: b's',
            const_value_index: cp.utf8(value)?,
        },
        ElementSpec::Enum { descriptor, name } => ElementValue::Enum {
            type_name_index: cp.utf8(descriptor)?,
            const_name_index: cp.utf8(name)?,
        },
        ElementSpec::Class(descriptor) => ElementValue::Class {
            class_info_index: cp.utf8(descriptor)?,
        },
        ElementSpec::Annotation(nested) => ElementValue::Annotation(build_annotation(cp, nested)?),
        ElementSpec::Array(values) => ElementValue::Array(
            values
                .iter()
                .map(|value| build_element(cp, value))
                .collect::<Result<Vec<_>>>()?,
        ),
    })
}

/// Argument slot count of a method descriptor, as used by `invokeinterface`.
fn argument_slots(descriptor: &str) -> u8 {
    let args = descriptor
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')'))
        .map(|(args, _)| args)
        .unwrap_or("");
    let bytes = args.as_bytes();
    let mut slots = 0u8;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'J' | b'D' => slots = slots.saturating_add(2),
            b'L' => {
                slots = slots.saturating_add(1);
                while i < bytes.len() && bytes[i] != b';' {
                    i += 1;
                }
            }
            b'[' => {
                while i < bytes.len() && bytes[i] == b'[' {
                    i += 1;
                }
                if bytes.get(i) == Some(&b'L') {
                    while i < bytes.len() && bytes[i] != b';' {
                        i += 1;
                    }
                }
                slots = slots.saturating_add(1);
            }
            _ => slots = slots.saturating_add(1),
        }
        i += 1;
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::ACC_STATIC;

    #[test]
    fn test_argument_slots() {
        assert_eq!(argument_slots("()V"), 0);
        assert_eq!(argument_slots("(IJLa/B;[[D[La/C;)V"), 5);
    }

    #[test]
    fn test_lambda_emits_bootstrap_methods() {
        let mut builder = ClassFileBuilder::new("a/Host", Some("java/lang/Object"));
        builder
            .method(ACC_STATIC, "make", "()Ljava/lang/Runnable;", |code| {
                code.invoke_lambda(
                    "run",
                    "()Ljava/lang/Runnable;",
                    "()V",
                    ("a/Host", "lambda$make$0", "()V"),
                )
                .areturn();
            })
            .method(ACC_STATIC, "lambda$make$0", "()V", |code| {
                code.ret();
            });
        let class = ClassFile::parse(&builder.build().unwrap()).unwrap();
        let methods = class
            .attributes
            .iter()
            .find_map(|attr| match &attr.info {
                AttributeInfo::BootstrapMethods(methods) => Some(methods),
                _ => None,
            })
            .unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].arguments.len(), 3);
        let pool = &class.constant_pool;
        assert!(matches!(
            pool.get(methods[0].arguments[0]).unwrap(),
            Constant::MethodType { .. }
        ));
    }

    #[test]
    fn test_code_metadata_round_trips() {
        let mut builder = ClassFileBuilder::new("a/Frames", Some("java/lang/Object"));
        builder.method(ACC_PUBLIC, "m", "(La/Frames;)V", |code| {
            code.aload(1)
                .checkcast("a/Frames")
                .pop()
                .ret()
                .local_variable("self", "La/Frames;", 1)
                .local_variable_type("list", "Ljava/util/List<La/Frames;>;", 2)
                .frame_with_stack_object("a/Frames");
        });
        let bytes = builder.build().unwrap();
        let class = ClassFile::parse(&bytes).unwrap();
        let AttributeInfo::Code(code) = &class.methods[0].attributes[0].info else {
            panic!("expected Code");
        };
        assert_eq!(code.attributes.len(), 3);
        assert_eq!(code.frames().map(<[_]>::len), Some(1));
        assert_eq!(class.to_bytes().unwrap(), bytes);
    }
}
