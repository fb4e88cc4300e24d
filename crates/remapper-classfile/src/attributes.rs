//! Attribute parsing and serialization.
//!
//! Only attributes that embed names, descriptors or verifier data are parsed
//! into structures; everything else is carried as opaque bytes.

use crate::annotations::{Annotation, ElementValue, TypeAnnotation};
use crate::constant_pool::ConstantPool;
use crate::error::{ClassFileError, Result};
use crate::frames::{parse_frames, write_frames, StackMapFrame};
use crate::reader::ClassReader;
use crate::writer::ClassWriter;

pub const CODE: &str = "Code";
pub const SIGNATURE: &str = "Signature";
pub const LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";
pub const LOCAL_VARIABLE_TYPE_TABLE: &str = "LocalVariableTypeTable";
pub const STACK_MAP_TABLE: &str = "StackMapTable";
pub const INNER_CLASSES: &str = "InnerClasses";
pub const ENCLOSING_METHOD: &str = "EnclosingMethod";
pub const RECORD: &str = "Record";
pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";
pub const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";
pub const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeInvisibleParameterAnnotations";
pub const RUNTIME_VISIBLE_TYPE_ANNOTATIONS: &str = "RuntimeVisibleTypeAnnotations";
pub const RUNTIME_INVISIBLE_TYPE_ANNOTATIONS: &str = "RuntimeInvisibleTypeAnnotations";
pub const ANNOTATION_DEFAULT: &str = "AnnotationDefault";
pub const BOOTSTRAP_METHODS: &str = "BootstrapMethods";

/// Where an attribute table lives; decides which attributes are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeContext {
    Class,
    Field,
    Method,
    Code,
    RecordComponent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name_index: u16,
    pub info: AttributeInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeInfo {
    Code(CodeAttribute),
    Signature { signature_index: u16 },
    LocalVariableTable(Vec<LocalVariable>),
    /// Same layout as the local variable table; `descriptor_index` holds a
    /// generic signature.
    LocalVariableTypeTable(Vec<LocalVariable>),
    StackMapTable(Vec<StackMapFrame>),
    InnerClasses(Vec<InnerClass>),
    EnclosingMethod { class_index: u16, method_index: u16 },
    Record(Vec<RecordComponent>),
    /// Runtime(In)VisibleAnnotations.
    Annotations(Vec<Annotation>),
    /// Runtime(In)VisibleParameterAnnotations.
    ParameterAnnotations(Vec<Vec<Annotation>>),
    /// Runtime(In)VisibleTypeAnnotations.
    TypeAnnotations(Vec<TypeAnnotation>),
    AnnotationDefault(ElementValue),
    BootstrapMethods(Vec<BootstrapMethod>),
    Raw(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerClass {
    pub inner_class_info_index: u16,
    /// Zero for local and anonymous classes.
    pub outer_class_info_index: u16,
    /// Zero for anonymous classes.
    pub inner_name_index: u16,
    pub inner_class_access_flags: u16,
}

/// One `bootstrap_methods` entry: a `MethodHandle` index plus static
/// argument indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapMethod {
    pub method_ref: u16,
    pub arguments: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordComponent {
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

impl CodeAttribute {
    /// Drop every `StackMapTable` from this method body.
    pub fn strip_frames(&mut self) -> usize {
        let before = self.attributes.len();
        self.attributes
            .retain(|attr| !matches!(attr.info, AttributeInfo::StackMapTable(_)));
        before - self.attributes.len()
    }

    pub fn frames(&self) -> Option<&[StackMapFrame]> {
        self.attributes.iter().find_map(|attr| match &attr.info {
            AttributeInfo::StackMapTable(frames) => Some(frames.as_slice()),
            _ => None,
        })
    }
}

pub fn parse_attributes(
    reader: &mut ClassReader<'_>,
    pool: &ConstantPool,
    context: AttributeContext,
) -> Result<Vec<Attribute>> {
    let count = reader.read_u2()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_offset = reader.offset();
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let name = pool
            .utf8(name_index)
            .map_err(|err| err.at_index(name_index, name_offset))?;
        let mut body = reader.sub_reader(length)?;
        let info = parse_attribute_body(name, &mut body, pool, context)?;
        if !body.is_empty() {
            return Err(ClassFileError::MalformedAttribute {
                attribute: attribute_label(name),
                offset: body.offset(),
                reason: format!("{} unread bytes", body.remaining()),
            });
        }
        attributes.push(Attribute { name_index, info });
    }
    Ok(attributes)
}

fn attribute_label(name: &str) -> &'static str {
    match name {
        CODE => CODE,
        SIGNATURE => SIGNATURE,
        LOCAL_VARIABLE_TABLE => LOCAL_VARIABLE_TABLE,
        LOCAL_VARIABLE_TYPE_TABLE => LOCAL_VARIABLE_TYPE_TABLE,
        STACK_MAP_TABLE => STACK_MAP_TABLE,
        INNER_CLASSES => INNER_CLASSES,
        ENCLOSING_METHOD => ENCLOSING_METHOD,
        RECORD => RECORD,
        ANNOTATION_DEFAULT => ANNOTATION_DEFAULT,
        BOOTSTRAP_METHODS => BOOTSTRAP_METHODS,
        _ => "annotation",
    }
}

fn parse_attribute_body(
    name: &str,
    body: &mut ClassReader<'_>,
    pool: &ConstantPool,
    context: AttributeContext,
) -> Result<AttributeInfo> {
    use AttributeContext as Ctx;

    let info = match (name, context) {
        (CODE, Ctx::Method) => AttributeInfo::Code(parse_code(body, pool)?),
        (SIGNATURE, ctx) if ctx != Ctx::Code => AttributeInfo::Signature {
            signature_index: body.read_u2()?,
        },
        (LOCAL_VARIABLE_TABLE, Ctx::Code) => {
            AttributeInfo::LocalVariableTable(parse_local_variables(body)?)
        }
        (LOCAL_VARIABLE_TYPE_TABLE, Ctx::Code) => {
            AttributeInfo::LocalVariableTypeTable(parse_local_variables(body)?)
        }
        (STACK_MAP_TABLE, Ctx::Code) => AttributeInfo::StackMapTable(parse_frames(body)?),
        (INNER_CLASSES, Ctx::Class) => {
            let count = body.read_u2()?;
            let classes = (0..count)
                .map(|_| -> Result<InnerClass> {
                    Ok(InnerClass {
                        inner_class_info_index: body.read_u2()?,
                        outer_class_info_index: body.read_u2()?,
                        inner_name_index: body.read_u2()?,
                        inner_class_access_flags: body.read_u2()?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            AttributeInfo::InnerClasses(classes)
        }
        (ENCLOSING_METHOD, Ctx::Class) => AttributeInfo::EnclosingMethod {
            class_index: body.read_u2()?,
            method_index: body.read_u2()?,
        },
        (RECORD, Ctx::Class) => {
            let count = body.read_u2()?;
            let components = (0..count)
                .map(|_| -> Result<RecordComponent> {
                    Ok(RecordComponent {
                        name_index: body.read_u2()?,
                        descriptor_index: body.read_u2()?,
                        attributes: parse_attributes(body, pool, Ctx::RecordComponent)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            AttributeInfo::Record(components)
        }
        (RUNTIME_VISIBLE_ANNOTATIONS | RUNTIME_INVISIBLE_ANNOTATIONS, ctx) if ctx != Ctx::Code => {
            AttributeInfo::Annotations(parse_annotation_list(body)?)
        }
        (
            RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS | RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS,
            Ctx::Method,
        ) => {
            let parameters = body.read_u1()?;
            AttributeInfo::ParameterAnnotations(
                (0..parameters)
                    .map(|_| parse_annotation_list(body))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        (RUNTIME_VISIBLE_TYPE_ANNOTATIONS | RUNTIME_INVISIBLE_TYPE_ANNOTATIONS, _) => {
            let count = body.read_u2()?;
            AttributeInfo::TypeAnnotations(
                (0..count)
                    .map(|_| TypeAnnotation::parse(body))
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        (ANNOTATION_DEFAULT, Ctx::Method) => {
            AttributeInfo::AnnotationDefault(ElementValue::parse(body)?)
        }
        (BOOTSTRAP_METHODS, Ctx::Class) => {
            let count = body.read_u2()?;
            let methods = (0..count)
                .map(|_| -> Result<BootstrapMethod> {
                    let method_ref = body.read_u2()?;
                    let argument_count = body.read_u2()?;
                    let arguments = (0..argument_count)
                        .map(|_| body.read_u2())
                        .collect::<Result<Vec<_>>>()?;
                    Ok(BootstrapMethod {
                        method_ref,
                        arguments,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            AttributeInfo::BootstrapMethods(methods)
        }
        _ => AttributeInfo::Raw(body.read_slice(body.remaining())?.to_vec()),
    };
    Ok(info)
}

fn parse_code(body: &mut ClassReader<'_>, pool: &ConstantPool) -> Result<CodeAttribute> {
    let max_stack = body.read_u2()?;
    let max_locals = body.read_u2()?;
    let code_length = body.read_u4()? as usize;
    let code = body.read_slice(code_length)?.to_vec();
    let handler_count = body.read_u2()?;
    let exception_table = (0..handler_count)
        .map(|_| -> Result<ExceptionHandler> {
            Ok(ExceptionHandler {
                start_pc: body.read_u2()?,
                end_pc: body.read_u2()?,
                handler_pc: body.read_u2()?,
                catch_type: body.read_u2()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let attributes = parse_attributes(body, pool, AttributeContext::Code)?;
    Ok(CodeAttribute {
        max_stack,
        max_locals,
        code,
        exception_table,
        attributes,
    })
}

fn parse_local_variables(body: &mut ClassReader<'_>) -> Result<Vec<LocalVariable>> {
    let count = body.read_u2()?;
    (0..count)
        .map(|_| -> Result<LocalVariable> {
            Ok(LocalVariable {
                start_pc: body.read_u2()?,
                length: body.read_u2()?,
                name_index: body.read_u2()?,
                descriptor_index: body.read_u2()?,
                index: body.read_u2()?,
            })
        })
        .collect()
}

fn parse_annotation_list(body: &mut ClassReader<'_>) -> Result<Vec<Annotation>> {
    let count = body.read_u2()?;
    (0..count).map(|_| Annotation::parse(body)).collect()
}

pub fn write_attributes(writer: &mut ClassWriter, attributes: &[Attribute]) -> Result<()> {
    writer.write_count(attributes.len(), "attribute table")?;
    for attribute in attributes {
        let payload = attribute_payload(&attribute.info)?;
        writer.write_attribute(attribute.name_index, &payload)?;
    }
    Ok(())
}

fn attribute_payload(info: &AttributeInfo) -> Result<Vec<u8>> {
    let mut w = ClassWriter::new();
    match info {
        AttributeInfo::Code(code) => {
            w.write_u2(code.max_stack);
            w.write_u2(code.max_locals);
            let code_len = u32::try_from(code.code.len())
                .map_err(|_| ClassFileError::AttributeTooLarge { len: code.code.len() })?;
            w.write_u4(code_len);
            w.write_bytes(&code.code);
            w.write_count(code.exception_table.len(), CODE)?;
            for handler in &code.exception_table {
                w.write_u2(handler.start_pc);
                w.write_u2(handler.end_pc);
                w.write_u2(handler.handler_pc);
                w.write_u2(handler.catch_type);
            }
            write_attributes(&mut w, &code.attributes)?;
        }
        AttributeInfo::Signature { signature_index } => w.write_u2(*signature_index),
        AttributeInfo::LocalVariableTable(vars) | AttributeInfo::LocalVariableTypeTable(vars) => {
            w.write_count(vars.len(), LOCAL_VARIABLE_TABLE)?;
            for var in vars {
                w.write_u2(var.start_pc);
                w.write_u2(var.length);
                w.write_u2(var.name_index);
                w.write_u2(var.descriptor_index);
                w.write_u2(var.index);
            }
        }
        AttributeInfo::StackMapTable(frames) => write_frames(&mut w, frames)?,
        AttributeInfo::InnerClasses(classes) => {
            w.write_count(classes.len(), INNER_CLASSES)?;
            for class in classes {
                w.write_u2(class.inner_class_info_index);
                w.write_u2(class.outer_class_info_index);
                w.write_u2(class.inner_name_index);
                w.write_u2(class.inner_class_access_flags);
            }
        }
        AttributeInfo::EnclosingMethod {
            class_index,
            method_index,
        } => {
            w.write_u2(*class_index);
            w.write_u2(*method_index);
        }
        AttributeInfo::Record(components) => {
            w.write_count(components.len(), RECORD)?;
            for component in components {
                w.write_u2(component.name_index);
                w.write_u2(component.descriptor_index);
                write_attributes(&mut w, &component.attributes)?;
            }
        }
        AttributeInfo::Annotations(annotations) => write_annotation_list(&mut w, annotations)?,
        AttributeInfo::ParameterAnnotations(parameters) => {
            let count = u8::try_from(parameters.len()).map_err(|_| {
                ClassFileError::MalformedAttribute {
                    attribute: "annotation",
                    offset: 0,
                    reason: format!("{} parameters exceed the u1 limit", parameters.len()),
                }
            })?;
            w.write_u1(count);
            for annotations in parameters {
                write_annotation_list(&mut w, annotations)?;
            }
        }
        AttributeInfo::TypeAnnotations(annotations) => {
            w.write_count(annotations.len(), "annotation")?;
            for annotation in annotations {
                annotation.write(&mut w)?;
            }
        }
        AttributeInfo::AnnotationDefault(value) => value.write(&mut w)?,
        AttributeInfo::BootstrapMethods(methods) => {
            w.write_count(methods.len(), BOOTSTRAP_METHODS)?;
            for method in methods {
                w.write_u2(method.method_ref);
                w.write_count(method.arguments.len(), BOOTSTRAP_METHODS)?;
                for argument in &method.arguments {
                    w.write_u2(*argument);
                }
            }
        }
        AttributeInfo::Raw(bytes) => w.write_bytes(bytes),
    }
    Ok(w.into_bytes())
}

fn write_annotation_list(w: &mut ClassWriter, annotations: &[Annotation]) -> Result<()> {
    w.write_count(annotations.len(), "annotation")?;
    for annotation in annotations {
        annotation.write(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant_pool::Constant;

    fn pool_with(names: &[&str]) -> ConstantPool {
        let mut pool = ConstantPool::new();
        for name in names {
            pool.push(Constant::utf8(name)).unwrap();
        }
        pool
    }

    #[test]
    fn test_unknown_attribute_is_kept_raw() {
        let pool = pool_with(&["SourceFile"]);
        let bytes = [0, 1, 0, 1, 0, 0, 0, 2, 0, 9];
        let attrs =
            parse_attributes(&mut ClassReader::new(&bytes), &pool, AttributeContext::Class)
                .unwrap();
        assert_eq!(attrs[0].info, AttributeInfo::Raw(vec![0, 9]));

        let mut writer = ClassWriter::new();
        write_attributes(&mut writer, &attrs).unwrap();
        assert_eq!(writer.into_bytes(), bytes);
    }

    #[test]
    fn test_signature_length_mismatch_is_malformed() {
        let pool = pool_with(&["Signature"]);
        let bytes = [0, 1, 0, 1, 0, 0, 0, 3, 0, 1, 0];
        let err =
            parse_attributes(&mut ClassReader::new(&bytes), &pool, AttributeContext::Field)
                .unwrap_err();
        assert!(matches!(
            err,
            ClassFileError::MalformedAttribute {
                attribute: SIGNATURE,
                offset: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_code_attribute_strips_frames() {
        let pool = pool_with(&["Code", "StackMapTable", "LineNumberTable"]);
        let bytes = [
            0, 1, // one attribute
            0, 1, 0, 0, 0, 30, // Code, length 30
            0, 1, 0, 1, // max_stack, max_locals
            0, 0, 0, 1, 0xB1, // code: return
            0, 0, // no handlers
            0, 2, // two nested attributes
            0, 2, 0, 0, 0, 3, 0, 1, 0, // StackMapTable: one same frame
            0, 3, 0, 0, 0, 2, 0, 0, // LineNumberTable (raw)
        ];
        let mut attrs =
            parse_attributes(&mut ClassReader::new(&bytes), &pool, AttributeContext::Method)
                .unwrap();
        let AttributeInfo::Code(code) = &mut attrs[0].info else {
            panic!("expected Code attribute");
        };
        assert_eq!(code.frames().map(|f| f.len()), Some(1));
        assert_eq!(code.strip_frames(), 1);
        assert!(code.frames().is_none());
        assert_eq!(code.attributes.len(), 1);
    }
}
