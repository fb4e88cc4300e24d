//! Whole class file model.
//!
//! ```text
//! ClassFile {
//!     u4 magic; u2 minor_version; u2 major_version;
//!     constant_pool;
//!     u2 access_flags; u2 this_class; u2 super_class;
//!     u2 interfaces[]; field_info fields[]; method_info methods[];
//!     attribute_info attributes[];
//! }
//! ```
//!
//! Parsing followed by [`ClassFile::to_bytes`] without edits reproduces the
//! input exactly.

use crate::attributes::{parse_attributes, write_attributes, Attribute, AttributeContext};
use crate::constant_pool::ConstantPool;
use crate::error::{ClassFileError, Result};
use crate::reader::ClassReader;
use crate::writer::ClassWriter;

pub const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    /// Zero only for `java/lang/Object` and module descriptors.
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
}

/// A `field_info` or `method_info` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    fn parse(
        reader: &mut ClassReader<'_>,
        pool: &ConstantPool,
        context: AttributeContext,
    ) -> Result<Self> {
        let access_flags = reader.read_u2()?;
        let name_offset = reader.offset();
        let name_index = reader.read_u2()?;
        let descriptor_index = reader.read_u2()?;
        for index in [name_index, descriptor_index] {
            pool.utf8(index)
                .map_err(|err| err.at_index(index, name_offset))?;
        }
        Ok(Self {
            access_flags,
            name_index,
            descriptor_index,
            attributes: parse_attributes(reader, pool, context)?,
        })
    }

    fn write(&self, writer: &mut ClassWriter) -> Result<()> {
        writer.write_u2(self.access_flags);
        writer.write_u2(self.name_index);
        writer.write_u2(self.descriptor_index);
        write_attributes(writer, &self.attributes)
    }

    pub fn name<'p>(&self, pool: &'p ConstantPool) -> Result<&'p str> {
        pool.utf8(self.name_index)
    }

    pub fn descriptor<'p>(&self, pool: &'p ConstantPool) -> Result<&'p str> {
        pool.utf8(self.descriptor_index)
    }
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ClassReader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != MAGIC {
            return Err(ClassFileError::InvalidMagic { found: magic });
        }
        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let constant_pool = ConstantPool::parse(&mut reader)?;
        let access_flags = reader.read_u2()?;

        let this_offset = reader.offset();
        let this_class = reader.read_u2()?;
        let super_class = reader.read_u2()?;
        let class_at = |index: u16, offset: usize| -> Result<()> {
            constant_pool
                .class_name(index)
                .map(|_| ())
                .map_err(|err| err.at_index(index, offset))
        };
        class_at(this_class, this_offset)?;
        if super_class != 0 {
            class_at(super_class, this_offset + 2)?;
        }

        let interface_count = reader.read_u2()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            let offset = reader.offset();
            let index = reader.read_u2()?;
            class_at(index, offset)?;
            interfaces.push(index);
        }

        let field_count = reader.read_u2()?;
        let fields = (0..field_count)
            .map(|_| MemberInfo::parse(&mut reader, &constant_pool, AttributeContext::Field))
            .collect::<Result<Vec<_>>>()?;
        let method_count = reader.read_u2()?;
        let methods = (0..method_count)
            .map(|_| MemberInfo::parse(&mut reader, &constant_pool, AttributeContext::Method))
            .collect::<Result<Vec<_>>>()?;
        let attributes = parse_attributes(&mut reader, &constant_pool, AttributeContext::Class)?;

        if !reader.is_empty() {
            return Err(ClassFileError::TrailingBytes {
                offset: reader.offset(),
                count: reader.remaining(),
            });
        }

        Ok(Self {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ClassWriter::with_capacity(4096);
        writer.write_u4(MAGIC);
        writer.write_u2(self.minor_version);
        writer.write_u2(self.major_version);
        self.constant_pool.write(&mut writer)?;
        writer.write_u2(self.access_flags);
        writer.write_u2(self.this_class);
        writer.write_u2(self.super_class);
        writer.write_count(self.interfaces.len(), "interfaces")?;
        for interface in &self.interfaces {
            writer.write_u2(*interface);
        }
        writer.write_count(self.fields.len(), "fields")?;
        for field in &self.fields {
            field.write(&mut writer)?;
        }
        writer.write_count(self.methods.len(), "methods")?;
        for method in &self.methods {
            method.write(&mut writer)?;
        }
        write_attributes(&mut writer, &self.attributes)?;
        Ok(writer.into_bytes())
    }

    /// Internal name of this class.
    pub fn name(&self) -> Result<&str> {
        self.constant_pool.class_name(self.this_class)
    }

    pub fn super_name(&self) -> Result<Option<&str>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    pub fn interface_names(&self) -> Result<Vec<&str>> {
        self.interfaces
            .iter()
            .map(|&index| self.constant_pool.class_name(index))
            .collect()
    }
}
