//! Big-endian byte sink used by the class file serializer.

use crate::error::{ClassFileError, Result};

#[derive(Debug, Default, Clone)]
pub struct ClassWriter {
    buf: Vec<u8>,
}

impl ClassWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u1(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u2(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u4(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u8(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a `u2` element count.
    pub fn write_count(&mut self, count: usize, what: &'static str) -> Result<()> {
        let count = u16::try_from(count).map_err(|_| ClassFileError::MalformedAttribute {
            attribute: what,
            offset: self.buf.len(),
            reason: format!("{count} entries exceed the u2 count limit"),
        })?;
        self.write_u2(count);
        Ok(())
    }

    /// Write `attribute_name_index`, the `u4` length and the payload.
    pub fn write_attribute(&mut self, name_index: u16, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len())
            .map_err(|_| ClassFileError::AttributeTooLarge { len: payload.len() })?;
        self.write_u2(name_index);
        self.write_u4(len);
        self.write_bytes(payload);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_framing() {
        let mut writer = ClassWriter::new();
        writer.write_attribute(7, &[1, 2, 3]).unwrap();
        assert_eq!(writer.into_bytes(), vec![0, 7, 0, 0, 0, 3, 1, 2, 3]);
    }
}
