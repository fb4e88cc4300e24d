//! `StackMapTable` frames (JVMS 4.7.4).
//!
//! Frames keep their original encoding choice (compact vs. extended forms) so
//! that a frame table re-encodes to exactly the bytes it was read from.

use crate::constant_pool::{Constant, ConstantPool};
use crate::error::{ClassFileError, Result};
use crate::reader::ClassReader;
use crate::writer::ClassWriter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationType {
    Top,
    Integer,
    Float,
    Double,
    Long,
    Null,
    UninitializedThis,
    /// Constant pool index of a `CONSTANT_Class`.
    Object(u16),
    /// Bytecode offset of the `new` instruction.
    Uninitialized(u16),
}

impl VerificationType {
    fn parse(reader: &mut ClassReader<'_>) -> Result<Self> {
        let offset = reader.offset();
        Ok(match reader.read_u1()? {
            0 => VerificationType::Top,
            1 => VerificationType::Integer,
            2 => VerificationType::Float,
            3 => VerificationType::Double,
            4 => VerificationType::Long,
            5 => VerificationType::Null,
            6 => VerificationType::UninitializedThis,
            7 => VerificationType::Object(reader.read_u2()?),
            8 => VerificationType::Uninitialized(reader.read_u2()?),
            tag => {
                return Err(ClassFileError::MalformedAttribute {
                    attribute: "StackMapTable",
                    offset,
                    reason: format!("unknown verification type tag {tag}"),
                })
            }
        })
    }

    fn write(&self, writer: &mut ClassWriter) {
        match self {
            VerificationType::Top => writer.write_u1(0),
            VerificationType::Integer => writer.write_u1(1),
            VerificationType::Float => writer.write_u1(2),
            VerificationType::Double => writer.write_u1(3),
            VerificationType::Long => writer.write_u1(4),
            VerificationType::Null => writer.write_u1(5),
            VerificationType::UninitializedThis => writer.write_u1(6),
            VerificationType::Object(cp_index) => {
                writer.write_u1(7);
                writer.write_u2(*cp_index);
            }
            VerificationType::Uninitialized(offset) => {
                writer.write_u1(8);
                writer.write_u2(*offset);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackMapFrame {
    /// `frame_type` 0..=63; the type is the offset delta.
    Same { frame_type: u8 },
    /// `frame_type` 64..=127.
    SameLocals1StackItem {
        frame_type: u8,
        stack: VerificationType,
    },
    SameLocals1StackItemExtended {
        offset_delta: u16,
        stack: VerificationType,
    },
    /// `frame_type` 248..=250 removes `251 - frame_type` locals.
    Chop { frame_type: u8, offset_delta: u16 },
    SameExtended { offset_delta: u16 },
    /// `frame_type` 252..=254 adds `frame_type - 251` locals.
    Append {
        frame_type: u8,
        offset_delta: u16,
        locals: Vec<VerificationType>,
    },
    Full {
        offset_delta: u16,
        locals: Vec<VerificationType>,
        stack: Vec<VerificationType>,
    },
}

impl StackMapFrame {
    pub fn parse(reader: &mut ClassReader<'_>) -> Result<Self> {
        let offset = reader.offset();
        let frame_type = reader.read_u1()?;
        Ok(match frame_type {
            0..=63 => StackMapFrame::Same { frame_type },
            64..=127 => StackMapFrame::SameLocals1StackItem {
                frame_type,
                stack: VerificationType::parse(reader)?,
            },
            247 => StackMapFrame::SameLocals1StackItemExtended {
                offset_delta: reader.read_u2()?,
                stack: VerificationType::parse(reader)?,
            },
            248..=250 => StackMapFrame::Chop {
                frame_type,
                offset_delta: reader.read_u2()?,
            },
            251 => StackMapFrame::SameExtended {
                offset_delta: reader.read_u2()?,
            },
            252..=254 => {
                let offset_delta = reader.read_u2()?;
                let locals = (0..frame_type - 251)
                    .map(|_| VerificationType::parse(reader))
                    .collect::<Result<Vec<_>>>()?;
                StackMapFrame::Append {
                    frame_type,
                    offset_delta,
                    locals,
                }
            }
            255 => {
                let offset_delta = reader.read_u2()?;
                let local_count = reader.read_u2()?;
                let locals = (0..local_count)
                    .map(|_| VerificationType::parse(reader))
                    .collect::<Result<Vec<_>>>()?;
                let stack_count = reader.read_u2()?;
                let stack = (0..stack_count)
                    .map(|_| VerificationType::parse(reader))
                    .collect::<Result<Vec<_>>>()?;
                StackMapFrame::Full {
                    offset_delta,
                    locals,
                    stack,
                }
            }
            reserved => {
                return Err(ClassFileError::MalformedAttribute {
                    attribute: "StackMapTable",
                    offset,
                    reason: format!("reserved frame type {reserved}"),
                })
            }
        })
    }

    pub fn write(&self, writer: &mut ClassWriter) -> Result<()> {
        match self {
            StackMapFrame::Same { frame_type } => writer.write_u1(*frame_type),
            StackMapFrame::SameLocals1StackItem { frame_type, stack } => {
                writer.write_u1(*frame_type);
                stack.write(writer);
            }
            StackMapFrame::SameLocals1StackItemExtended {
                offset_delta,
                stack,
            } => {
                writer.write_u1(247);
                writer.write_u2(*offset_delta);
                stack.write(writer);
            }
            StackMapFrame::Chop {
                frame_type,
                offset_delta,
            } => {
                writer.write_u1(*frame_type);
                writer.write_u2(*offset_delta);
            }
            StackMapFrame::SameExtended { offset_delta } => {
                writer.write_u1(251);
                writer.write_u2(*offset_delta);
            }
            StackMapFrame::Append {
                frame_type,
                offset_delta,
                locals,
            } => {
                writer.write_u1(*frame_type);
                writer.write_u2(*offset_delta);
                for local in locals {
                    local.write(writer);
                }
            }
            StackMapFrame::Full {
                offset_delta,
                locals,
                stack,
            } => {
                writer.write_u1(255);
                writer.write_u2(*offset_delta);
                writer.write_count(locals.len(), "StackMapTable")?;
                for local in locals {
                    local.write(writer);
                }
                writer.write_count(stack.len(), "StackMapTable")?;
                for item in stack {
                    item.write(writer);
                }
            }
        }
        Ok(())
    }

    /// Every verification type carried by this frame.
    pub fn verification_types(&self) -> Vec<&VerificationType> {
        match self {
            StackMapFrame::Same { .. }
            | StackMapFrame::Chop { .. }
            | StackMapFrame::SameExtended { .. } => Vec::new(),
            StackMapFrame::SameLocals1StackItem { stack, .. }
            | StackMapFrame::SameLocals1StackItemExtended { stack, .. } => vec![stack],
            StackMapFrame::Append { locals, .. } => locals.iter().collect(),
            StackMapFrame::Full { locals, stack, .. } => locals.iter().chain(stack).collect(),
        }
    }
}

pub fn parse_frames(reader: &mut ClassReader<'_>) -> Result<Vec<StackMapFrame>> {
    let count = reader.read_u2()?;
    (0..count).map(|_| StackMapFrame::parse(reader)).collect()
}

pub fn write_frames(writer: &mut ClassWriter, frames: &[StackMapFrame]) -> Result<()> {
    writer.write_count(frames.len(), "StackMapTable")?;
    for frame in frames {
        frame.write(writer)?;
    }
    Ok(())
}

/// Check that every `Object` verification type names a `CONSTANT_Class`.
pub fn check_frame_classes(frames: &[StackMapFrame], pool: &ConstantPool) -> Result<()> {
    for frame in frames {
        for ty in frame.verification_types() {
            if let VerificationType::Object(index) = ty {
                if !matches!(pool.get(*index)?, Constant::Class { .. }) {
                    return Err(ClassFileError::UnexpectedConstant {
                        index: *index,
                        expected: "Class",
                    });
                }
            }
        }
    }
    Ok(())
}
