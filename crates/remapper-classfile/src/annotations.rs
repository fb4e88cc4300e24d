//! Annotation structures (JVMS 4.7.16 - 4.7.22).

use crate::error::{ClassFileError, Result};
use crate::reader::ClassReader;
use crate::writer::ClassWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Utf8 index of the annotation type's field descriptor.
    pub type_index: u16,
    pub elements: Vec<ElementValuePair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementValuePair {
    pub name_index: u16,
    pub value: ElementValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    /// Primitive or `String` constant (`B C D F I J S Z s`).
    Const { tag: u8, const_value_index: u16 },
    Enum {
        type_name_index: u16,
        const_name_index: u16,
    },
    /// Utf8 index of a return descriptor.
    Class { class_info_index: u16 },
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

/// A type annotation. `target` holds `target_type`, `target_info` and
/// `type_path` verbatim; none of them carry names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnnotation {
    pub target: Vec<u8>,
    pub annotation: Annotation,
}

impl Annotation {
    pub fn parse(reader: &mut ClassReader<'_>) -> Result<Self> {
        let type_index = reader.read_u2()?;
        let count = reader.read_u2()?;
        let elements = (0..count)
            .map(|_| -> Result<ElementValuePair> {
                Ok(ElementValuePair {
                    name_index: reader.read_u2()?,
                    value: ElementValue::parse(reader)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            type_index,
            elements,
        })
    }

    pub fn write(&self, writer: &mut ClassWriter) -> Result<()> {
        writer.write_u2(self.type_index);
        writer.write_count(self.elements.len(), "annotation")?;
        for pair in &self.elements {
            writer.write_u2(pair.name_index);
            pair.value.write(writer)?;
        }
        Ok(())
    }
}

impl ElementValue {
    pub fn parse(reader: &mut ClassReader<'_>) -> Result<Self> {
        let offset = reader.offset();
        let tag = reader.read_u1()?;
        Ok(match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => ElementValue::Const {
                tag,
                const_value_index: reader.read_u2()?,
            },
            b'e' => ElementValue::Enum {
                type_name_index: reader.read_u2()?,
                const_name_index: reader.read_u2()?,
            },
            b'c' => ElementValue::Class {
                class_info_index: reader.read_u2()?,
            },
            b'@' => ElementValue::Annotation(Annotation::parse(reader)?),
            b'[' => {
                let count = reader.read_u2()?;
                ElementValue::Array(
                    (0..count)
                        .map(|_| ElementValue::parse(reader))
                        .collect::<Result<Vec<_>>>()?,
                )
            }
            other => {
                return Err(ClassFileError::MalformedAttribute {
                    attribute: "annotation",
                    offset,
                    reason: format!("unknown element value tag {other}"),
                })
            }
        })
    }

    pub fn write(&self, writer: &mut ClassWriter) -> Result<()> {
        match self {
            ElementValue::Const {
                tag,
                const_value_index,
            } => {
                writer.write_u1(*tag);
                writer.write_u2(*const_value_index);
            }
            ElementValue::Enum {
                type_name_index,
                const_name_index,
            } => {
                writer.write_u1(b'e');
                writer.write_u2(*type_name_index);
                writer.write_u2(*const_name_index);
            }
            ElementValue::Class { class_info_index } => {
                writer.write_u1(b'c');
                writer.write_u2(*class_info_index);
            }
            ElementValue::Annotation(annotation) => {
                writer.write_u1(b'@');
                annotation.write(writer)?;
            }
            ElementValue::Array(values) => {
                writer.write_u1(b'[');
                writer.write_count(values.len(), "annotation")?;
                for value in values {
                    value.write(writer)?;
                }
            }
        }
        Ok(())
    }
}

impl TypeAnnotation {
    pub fn parse(reader: &mut ClassReader<'_>) -> Result<Self> {
        let offset = reader.offset();
        let target_type = reader.read_u1()?;
        let mut target = vec![target_type];
        let info_len = match target_type {
            0x00 | 0x01 => 1,
            0x10 => 2,
            0x11 | 0x12 => 2,
            0x13..=0x15 => 0,
            0x16 => 1,
            0x17 => 2,
            0x40 | 0x41 => {
                let table_length = reader.read_u2()?;
                target.extend_from_slice(&table_length.to_be_bytes());
                table_length as usize * 6
            }
            0x42 => 2,
            0x43..=0x46 => 2,
            0x47..=0x4B => 3,
            other => {
                return Err(ClassFileError::MalformedAttribute {
                    attribute: "type annotation",
                    offset,
                    reason: format!("unknown target type 0x{other:02X}"),
                })
            }
        };
        target.extend_from_slice(reader.read_slice(info_len)?);
        let path_length = reader.read_u1()?;
        target.push(path_length);
        target.extend_from_slice(reader.read_slice(path_length as usize * 2)?);

        Ok(Self {
            target,
            annotation: Annotation::parse(reader)?,
        })
    }

    pub fn write(&self, writer: &mut ClassWriter) -> Result<()> {
        writer.write_bytes(&self.target);
        self.annotation.write(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_annotation_round_trip() {
        // @T(value = {e(#3.#4), @U()}, cls = c#6)
        let bytes = [
            0, 1, 0, 2, //
            0, 7, b'[', 0, 2, b'e', 0, 3, 0, 4, b'@', 0, 5, 0, 0, //
            0, 8, b'c', 0, 6,
        ];
        let annotation = Annotation::parse(&mut ClassReader::new(&bytes)).unwrap();
        assert_eq!(annotation.elements.len(), 2);
        let mut writer = ClassWriter::new();
        annotation.write(&mut writer).unwrap();
        assert_eq!(writer.into_bytes(), bytes);
    }

    #[test]
    fn test_type_annotation_localvar_target() {
        let bytes = [
            0x40, 0, 1, 0, 0, 0, 5, 0, 1, // localvar target, one entry
            1, 3, 0, // type path with one step
            0, 9, 0, 0, // annotation #9 with no elements
        ];
        let annotation = TypeAnnotation::parse(&mut ClassReader::new(&bytes)).unwrap();
        assert_eq!(annotation.annotation.type_index, 9);
        let mut writer = ClassWriter::new();
        annotation.write(&mut writer).unwrap();
        assert_eq!(writer.into_bytes(), bytes);
    }
}
