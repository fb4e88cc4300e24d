//! Constant pool model, parsing and append-only editing.
//!
//! Entries keep their original indices for the whole lifetime of a class:
//! bytecode, frames and attributes refer to them by index, so rewriting never
//! moves or replaces an existing slot's identity. Renames are expressed by
//! appending fresh `Utf8` / `NameAndType` entries and repointing the entries
//! that use them.

use std::collections::HashMap;

use crate::error::{ClassFileError, Result};
use crate::reader::ClassReader;
use crate::writer::ClassWriter;

pub const TAG_UTF8: u8 = 1;
pub const TAG_INTEGER: u8 = 3;
pub const TAG_FLOAT: u8 = 4;
pub const TAG_LONG: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_CLASS: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_FIELDREF: u8 = 9;
pub const TAG_METHODREF: u8 = 10;
pub const TAG_INTERFACE_METHODREF: u8 = 11;
pub const TAG_NAME_AND_TYPE: u8 = 12;
pub const TAG_METHOD_HANDLE: u8 = 15;
pub const TAG_METHOD_TYPE: u8 = 16;
pub const TAG_DYNAMIC: u8 = 17;
pub const TAG_INVOKE_DYNAMIC: u8 = 18;
pub const TAG_MODULE: u8 = 19;
pub const TAG_PACKAGE: u8 = 20;

/// Largest slot count a `constant_pool_count` can describe.
pub const MAX_POOL_SLOTS: usize = u16::MAX as usize;

/// A `Utf8` payload in the JVM's modified UTF-8 encoding.
///
/// The raw bytes are written back untouched. `text` holds the decoded form
/// and is `None` for payloads that have no Rust string equivalent, such as
/// string literals carrying unpaired surrogates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utf8Entry {
    bytes: Vec<u8>,
    text: Option<String>,
}

impl Utf8Entry {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let text = decode_modified_utf8(&bytes);
        Self { bytes, text }
    }

    pub fn new(text: &str) -> Self {
        Self {
            bytes: encode_modified_utf8(text),
            text: Some(text.to_owned()),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_str(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Decode modified UTF-8: `C0 80` for NUL, surrogate pairs as two
/// three-byte sequences, no four-byte forms and no raw zero bytes.
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let continuation = |at: usize| -> Option<u16> {
            match bytes.get(at) {
                Some(&c) if c & 0xC0 == 0x80 => Some(u16::from(c & 0x3F)),
                _ => None,
            }
        };
        match b {
            0x01..=0x7F => {
                units.push(u16::from(b));
                i += 1;
            }
            0xC0..=0xDF => {
                units.push((u16::from(b & 0x1F) << 6) | continuation(i + 1)?);
                i += 2;
            }
            0xE0..=0xEF => {
                let high = u16::from(b & 0x0F) << 12;
                units.push(high | (continuation(i + 1)? << 6) | continuation(i + 2)?);
                i += 3;
            }
            _ => return None,
        }
    }
    String::from_utf16(&units).ok()
}

pub fn encode_modified_utf8(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    Utf8(Utf8Entry),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class {
        name_index: u16,
    },
    String {
        string_index: u16,
    },
    Fieldref {
        class_index: u16,
        name_and_type_index: u16,
    },
    Methodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodref {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    MethodHandle {
        reference_kind: u8,
        reference_index: u16,
    },
    MethodType {
        descriptor_index: u16,
    },
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    InvokeDynamic {
        bootstrap_method_attr_index: u16,
        name_and_type_index: u16,
    },
    Module {
        name_index: u16,
    },
    Package {
        name_index: u16,
    },
    /// Slot 0 and the upper half of `Long` / `Double` entries.
    Unusable,
}

impl Constant {
    pub fn utf8(text: &str) -> Self {
        Constant::Utf8(Utf8Entry::new(text))
    }

    fn tag_name(&self) -> &'static str {
        match self {
            Constant::Utf8(_) => "Utf8",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::Class { .. } => "Class",
            Constant::String { .. } => "String",
            Constant::Fieldref { .. } => "Fieldref",
            Constant::Methodref { .. } => "Methodref",
            Constant::InterfaceMethodref { .. } => "InterfaceMethodref",
            Constant::NameAndType { .. } => "NameAndType",
            Constant::MethodHandle { .. } => "MethodHandle",
            Constant::MethodType { .. } => "MethodType",
            Constant::Dynamic { .. } => "Dynamic",
            Constant::InvokeDynamic { .. } => "InvokeDynamic",
            Constant::Module { .. } => "Module",
            Constant::Package { .. } => "Package",
            Constant::Unusable => "unusable slot",
        }
    }

    /// Whether this entry takes two pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

/// Which member table a symbolic reference points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Field,
    Method,
    InterfaceMethod,
}

impl RefKind {
    pub fn is_method(self) -> bool {
        !matches!(self, RefKind::Field)
    }
}

/// A resolved `Fieldref` / `Methodref` / `InterfaceMethodref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRef<'a> {
    pub kind: RefKind,
    pub owner: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            entries: vec![Constant::Unusable],
        }
    }

    /// Parse `constant_pool_count` and the entries that follow it.
    pub fn parse(reader: &mut ClassReader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        let mut offsets = Vec::with_capacity(count.max(1));
        entries.push(Constant::Unusable);
        offsets.push(reader.offset());

        while entries.len() < count {
            let entry_offset = reader.offset();
            let tag = reader.read_u1()?;
            let entry = match tag {
                TAG_UTF8 => {
                    let length = reader.read_u2()? as usize;
                    Constant::Utf8(Utf8Entry::from_bytes(reader.read_slice(length)?.to_vec()))
                }
                TAG_INTEGER => Constant::Integer(reader.read_u4()?),
                TAG_FLOAT => Constant::Float(reader.read_u4()?),
                TAG_LONG => Constant::Long(reader.read_u8()?),
                TAG_DOUBLE => Constant::Double(reader.read_u8()?),
                TAG_CLASS => Constant::Class {
                    name_index: reader.read_u2()?,
                },
                TAG_STRING => Constant::String {
                    string_index: reader.read_u2()?,
                },
                TAG_FIELDREF => Constant::Fieldref {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                TAG_METHODREF => Constant::Methodref {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                TAG_INTERFACE_METHODREF => Constant::InterfaceMethodref {
                    class_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                TAG_NAME_AND_TYPE => Constant::NameAndType {
                    name_index: reader.read_u2()?,
                    descriptor_index: reader.read_u2()?,
                },
                TAG_METHOD_HANDLE => Constant::MethodHandle {
                    reference_kind: reader.read_u1()?,
                    reference_index: reader.read_u2()?,
                },
                TAG_METHOD_TYPE => Constant::MethodType {
                    descriptor_index: reader.read_u2()?,
                },
                TAG_DYNAMIC => Constant::Dynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                TAG_INVOKE_DYNAMIC => Constant::InvokeDynamic {
                    bootstrap_method_attr_index: reader.read_u2()?,
                    name_and_type_index: reader.read_u2()?,
                },
                TAG_MODULE => Constant::Module {
                    name_index: reader.read_u2()?,
                },
                TAG_PACKAGE => Constant::Package {
                    name_index: reader.read_u2()?,
                },
                other => {
                    return Err(ClassFileError::UnsupportedConstant {
                        tag: other,
                        offset: entry_offset,
                    })
                }
            };

            let wide = entry.is_wide();
            entries.push(entry);
            offsets.push(entry_offset);
            if wide {
                if entries.len() >= count {
                    return Err(ClassFileError::InvalidConstantIndex {
                        index: (entries.len() - 1) as u16,
                        offset: entry_offset,
                    });
                }
                entries.push(Constant::Unusable);
                offsets.push(entry_offset);
            }
        }

        let pool = Self { entries };
        pool.validate(&offsets)?;
        Ok(pool)
    }

    /// Check that every cross-reference inside the pool lands on an entry of
    /// the expected kind.
    fn validate(&self, offsets: &[usize]) -> Result<()> {
        for (slot, entry) in self.entries.iter().enumerate() {
            let offset = offsets[slot];
            let check = |index: u16, ok: fn(&Constant) -> bool| -> Result<()> {
                match self.entries.get(index as usize) {
                    Some(target) if index != 0 && ok(target) => Ok(()),
                    _ => Err(ClassFileError::InvalidConstantIndex { index, offset }),
                }
            };
            let is_utf8 = |c: &Constant| matches!(c, Constant::Utf8(_));
            let is_class = |c: &Constant| matches!(c, Constant::Class { .. });
            let is_nat = |c: &Constant| matches!(c, Constant::NameAndType { .. });
            let is_ref = |c: &Constant| {
                matches!(
                    c,
                    Constant::Fieldref { .. }
                        | Constant::Methodref { .. }
                        | Constant::InterfaceMethodref { .. }
                )
            };

            match *entry {
                Constant::Class { name_index }
                | Constant::Module { name_index }
                | Constant::Package { name_index } => check(name_index, is_utf8)?,
                Constant::String { string_index } => check(string_index, is_utf8)?,
                Constant::MethodType { descriptor_index } => check(descriptor_index, is_utf8)?,
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    check(name_index, is_utf8)?;
                    check(descriptor_index, is_utf8)?;
                }
                Constant::Fieldref {
                    class_index,
                    name_and_type_index,
                }
                | Constant::Methodref {
                    class_index,
                    name_and_type_index,
                }
                | Constant::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                } => {
                    check(class_index, is_class)?;
                    check(name_and_type_index, is_nat)?;
                }
                Constant::MethodHandle {
                    reference_index, ..
                } => check(reference_index, is_ref)?,
                Constant::Dynamic {
                    name_and_type_index,
                    ..
                }
                | Constant::InvokeDynamic {
                    name_and_type_index,
                    ..
                } => check(name_and_type_index, is_nat)?,
                _ => {}
            }
        }
        Ok(())
    }

    pub fn write(&self, writer: &mut ClassWriter) -> Result<()> {
        if self.entries.len() > MAX_POOL_SLOTS {
            return Err(ClassFileError::ConstantPoolOverflow {
                count: self.entries.len(),
            });
        }
        writer.write_u2(self.entries.len() as u16);
        for entry in &self.entries {
            match entry {
                Constant::Unusable => {}
                Constant::Utf8(entry) => {
                    let bytes = entry.bytes();
                    writer.write_u1(TAG_UTF8);
                    let len = u16::try_from(bytes.len()).map_err(|_| {
                        ClassFileError::MalformedAttribute {
                            attribute: "Utf8",
                            offset: writer.len(),
                            reason: format!("{} bytes exceed the u2 length", bytes.len()),
                        }
                    })?;
                    writer.write_u2(len);
                    writer.write_bytes(bytes);
                }
                Constant::Integer(v) => {
                    writer.write_u1(TAG_INTEGER);
                    writer.write_u4(*v);
                }
                Constant::Float(v) => {
                    writer.write_u1(TAG_FLOAT);
                    writer.write_u4(*v);
                }
                Constant::Long(v) => {
                    writer.write_u1(TAG_LONG);
                    writer.write_u8(*v);
                }
                Constant::Double(v) => {
                    writer.write_u1(TAG_DOUBLE);
                    writer.write_u8(*v);
                }
                Constant::Class { name_index } => {
                    writer.write_u1(TAG_CLASS);
                    writer.write_u2(*name_index);
                }
                Constant::String { string_index } => {
                    writer.write_u1(TAG_STRING);
                    writer.write_u2(*string_index);
                }
                Constant::Fieldref {
                    class_index,
                    name_and_type_index,
                } => {
                    writer.write_u1(TAG_FIELDREF);
                    writer.write_u2(*class_index);
                    writer.write_u2(*name_and_type_index);
                }
                Constant::Methodref {
                    class_index,
                    name_and_type_index,
                } => {
                    writer.write_u1(TAG_METHODREF);
                    writer.write_u2(*class_index);
                    writer.write_u2(*name_and_type_index);
                }
                Constant::InterfaceMethodref {
                    class_index,
                    name_and_type_index,
                } => {
                    writer.write_u1(TAG_INTERFACE_METHODREF);
                    writer.write_u2(*class_index);
                    writer.write_u2(*name_and_type_index);
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    writer.write_u1(TAG_NAME_AND_TYPE);
                    writer.write_u2(*name_index);
                    writer.write_u2(*descriptor_index);
                }
                Constant::MethodHandle {
                    reference_kind,
                    reference_index,
                } => {
                    writer.write_u1(TAG_METHOD_HANDLE);
                    writer.write_u1(*reference_kind);
                    writer.write_u2(*reference_index);
                }
                Constant::MethodType { descriptor_index } => {
                    writer.write_u1(TAG_METHOD_TYPE);
                    writer.write_u2(*descriptor_index);
                }
                Constant::Dynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    writer.write_u1(TAG_DYNAMIC);
                    writer.write_u2(*bootstrap_method_attr_index);
                    writer.write_u2(*name_and_type_index);
                }
                Constant::InvokeDynamic {
                    bootstrap_method_attr_index,
                    name_and_type_index,
                } => {
                    writer.write_u1(TAG_INVOKE_DYNAMIC);
                    writer.write_u2(*bootstrap_method_attr_index);
                    writer.write_u2(*name_and_type_index);
                }
                Constant::Module { name_index } => {
                    writer.write_u1(TAG_MODULE);
                    writer.write_u2(*name_index);
                }
                Constant::Package { name_index } => {
                    writer.write_u1(TAG_PACKAGE);
                    writer.write_u2(*name_index);
                }
            }
        }
        Ok(())
    }

    /// Number of slots, including the unusable slot 0.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Iterate over usable `(index, entry)` pairs in pool order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .map(|(i, c)| (i as u16, c))
    }

    pub fn get(&self, index: u16) -> Result<&Constant> {
        match self.entries.get(index as usize) {
            Some(Constant::Unusable) | None => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "usable entry",
            }),
            Some(entry) => Ok(entry),
        }
    }

    /// Overwrite an existing slot. Width must not change.
    pub fn set(&mut self, index: u16, constant: Constant) -> Result<()> {
        let slot = self
            .entries
            .get_mut(index as usize)
            .filter(|c| !matches!(c, Constant::Unusable))
            .ok_or(ClassFileError::UnexpectedConstant {
                index,
                expected: "usable entry",
            })?;
        if slot.is_wide() != constant.is_wide() {
            return Err(ClassFileError::UnexpectedConstant {
                index,
                expected: slot.tag_name(),
            });
        }
        *slot = constant;
        Ok(())
    }

    /// Append an entry, returning its index.
    pub fn push(&mut self, constant: Constant) -> Result<u16> {
        let needed = if constant.is_wide() { 2 } else { 1 };
        if self.entries.len() + needed > MAX_POOL_SLOTS {
            return Err(ClassFileError::ConstantPoolOverflow {
                count: self.entries.len() + needed,
            });
        }
        let index = self.entries.len() as u16;
        let wide = constant.is_wide();
        self.entries.push(constant);
        if wide {
            self.entries.push(Constant::Unusable);
        }
        Ok(index)
    }

    pub fn utf8_bytes(&self, index: u16) -> Result<&[u8]> {
        match self.get(index)? {
            Constant::Utf8(entry) => Ok(entry.bytes()),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Utf8(entry) => entry.as_str().ok_or(ClassFileError::InvalidUtf8 { index }),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    /// Internal name (or array descriptor) of a `Class` entry.
    pub fn class_name(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            Constant::Class { name_index } => self.utf8(*name_index),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Class",
            }),
        }
    }

    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        match self.get(index)? {
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?)),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "NameAndType",
            }),
        }
    }

    pub fn member_ref(&self, index: u16) -> Result<MemberRef<'_>> {
        let (kind, class_index, name_and_type_index) = match *self.get(index)? {
            Constant::Fieldref {
                class_index,
                name_and_type_index,
            } => (RefKind::Field, class_index, name_and_type_index),
            Constant::Methodref {
                class_index,
                name_and_type_index,
            } => (RefKind::Method, class_index, name_and_type_index),
            Constant::InterfaceMethodref {
                class_index,
                name_and_type_index,
            } => (RefKind::InterfaceMethod, class_index, name_and_type_index),
            _ => {
                return Err(ClassFileError::UnexpectedConstant {
                    index,
                    expected: "member reference",
                })
            }
        };
        let (name, descriptor) = self.name_and_type(name_and_type_index)?;
        Ok(MemberRef {
            kind,
            owner: self.class_name(class_index)?,
            name,
            descriptor,
            class_index,
            name_and_type_index,
        })
    }

    /// Start an editing session with interning caches over the current pool.
    pub fn editor(&mut self) -> PoolEditor<'_> {
        PoolEditor::new(self)
    }
}

/// Append-only editor that reuses identical `Utf8`, `Class` and
/// `NameAndType` entries before creating new ones.
pub struct PoolEditor<'a> {
    pool: &'a mut ConstantPool,
    utf8: HashMap<Vec<u8>, u16>,
    classes: HashMap<u16, u16>,
    name_and_types: HashMap<(u16, u16), u16>,
}

impl<'a> PoolEditor<'a> {
    fn new(pool: &'a mut ConstantPool) -> Self {
        let mut utf8 = HashMap::new();
        let mut classes = HashMap::new();
        let mut name_and_types = HashMap::new();
        for (index, entry) in pool.iter() {
            match entry {
                Constant::Utf8(entry) => {
                    utf8.entry(entry.bytes().to_vec()).or_insert(index);
                }
                Constant::Class { name_index } => {
                    classes.entry(*name_index).or_insert(index);
                }
                Constant::NameAndType {
                    name_index,
                    descriptor_index,
                } => {
                    name_and_types
                        .entry((*name_index, *descriptor_index))
                        .or_insert(index);
                }
                _ => {}
            }
        }
        Self {
            pool,
            utf8,
            classes,
            name_and_types,
        }
    }

    pub fn pool(&self) -> &ConstantPool {
        self.pool
    }

    pub fn set(&mut self, index: u16, constant: Constant) -> Result<()> {
        self.pool.set(index, constant)
    }

    pub fn utf8(&mut self, text: &str) -> Result<u16> {
        let entry = Utf8Entry::new(text);
        if let Some(&index) = self.utf8.get(entry.bytes()) {
            return Ok(index);
        }
        let key = entry.bytes().to_vec();
        let index = self.pool.push(Constant::Utf8(entry))?;
        self.utf8.insert(key, index);
        Ok(index)
    }

    pub fn class(&mut self, name: &str) -> Result<u16> {
        let name_index = self.utf8(name)?;
        if let Some(&index) = self.classes.get(&name_index) {
            return Ok(index);
        }
        let index = self.pool.push(Constant::Class { name_index })?;
        self.classes.insert(name_index, index);
        Ok(index)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
        let key = (self.utf8(name)?, self.utf8(descriptor)?);
        if let Some(&index) = self.name_and_types.get(&key) {
            return Ok(index);
        }
        let index = self.pool.push(Constant::NameAndType {
            name_index: key.0,
            descriptor_index: key.1,
        })?;
        self.name_and_types.insert(key, index);
        Ok(index)
    }

    /// Append an entry without interning.
    pub fn push(&mut self, constant: Constant) -> Result<u16> {
        self.pool.push(constant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_bytes(entries: &[Constant]) -> Vec<u8> {
        let mut pool = ConstantPool::new();
        for entry in entries {
            pool.push(entry.clone()).unwrap();
        }
        let mut writer = ClassWriter::new();
        pool.write(&mut writer).unwrap();
        writer.into_bytes()
    }

    #[test]
    fn test_long_takes_two_slots() {
        let bytes = pool_bytes(&[Constant::Long(42), Constant::utf8("x")]);
        let pool = ConstantPool::parse(&mut ClassReader::new(&bytes)).unwrap();
        assert_eq!(pool.len(), 4);
        assert!(pool.get(2).is_err());
        assert_eq!(pool.utf8(3).unwrap(), "x");
    }

    #[test]
    fn test_rejects_dangling_class_reference() {
        let bytes = pool_bytes(&[Constant::Class { name_index: 9 }]);
        let err = ConstantPool::parse(&mut ClassReader::new(&bytes)).unwrap_err();
        assert!(matches!(
            err,
            ClassFileError::InvalidConstantIndex { index: 9, .. }
        ));
    }

    #[test]
    fn test_unknown_tag_reports_offset() {
        let bytes = vec![0, 2, 99];
        let err = ConstantPool::parse(&mut ClassReader::new(&bytes)).unwrap_err();
        assert_eq!(
            err,
            ClassFileError::UnsupportedConstant { tag: 99, offset: 2 }
        );
    }

    #[test]
    fn test_editor_reuses_existing_entries() {
        let mut pool = ConstantPool::new();
        let name = pool.push(Constant::utf8("a/B")).unwrap();
        let class = pool.push(Constant::Class { name_index: name }).unwrap();
        let len_before = pool.len();

        let mut editor = pool.editor();
        assert_eq!(editor.class("a/B").unwrap(), class);
        let fresh = editor.utf8("c/D").unwrap();
        assert_eq!(fresh as usize, len_before);
        assert_eq!(editor.utf8("c/D").unwrap(), fresh);
    }

    #[test]
    fn test_modified_utf8_nul_and_supplementary() {
        let name = "a\0b\u{1F600}";
        let entry = Utf8Entry::new(name);
        assert_eq!(
            entry.bytes(),
            &[b'a', 0xC0, 0x80, b'b', 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]
        );

        let bytes = pool_bytes(&[Constant::utf8(name)]);
        let pool = ConstantPool::parse(&mut ClassReader::new(&bytes)).unwrap();
        assert_eq!(pool.utf8(1).unwrap(), name);
    }

    #[test]
    fn test_standard_utf8_forms_are_not_modified_utf8() {
        assert_eq!(decode_modified_utf8(&[b'a', 0x00]), None);
        assert_eq!(decode_modified_utf8(&[0xF0, 0x9F, 0x98, 0x80]), None);
        assert_eq!(decode_modified_utf8(&[0xED, 0xA0, 0xBD]), None);
        assert_eq!(decode_modified_utf8("h\u{e9}".as_bytes()).as_deref(), Some("h\u{e9}"));
    }

    #[test]
    fn test_undecodable_entry_reports_invalid_utf8() {
        let mut pool = ConstantPool::new();
        let index = pool
            .push(Constant::Utf8(Utf8Entry::from_bytes(vec![0xED, 0xA0, 0xBD])))
            .unwrap();
        assert_eq!(pool.utf8_bytes(index).unwrap(), &[0xED, 0xA0, 0xBD]);
        assert_eq!(pool.utf8(index), Err(ClassFileError::InvalidUtf8 { index }));
    }

    #[test]
    fn test_member_ref_resolution() {
        let mut pool = ConstantPool::new();
        let mut editor = pool.editor();
        let class_index = editor.class("a/B").unwrap();
        let name_and_type_index = editor.name_and_type("run", "()V").unwrap();
        let index = editor
            .push(Constant::Methodref {
                class_index,
                name_and_type_index,
            })
            .unwrap();

        let member = pool.member_ref(index).unwrap();
        assert_eq!(member.kind, RefKind::Method);
        assert_eq!(member.owner, "a/B");
        assert_eq!(member.name, "run");
        assert_eq!(member.descriptor, "()V");
    }
}
