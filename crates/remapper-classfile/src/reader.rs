//! Big-endian byte cursor used by the class file parser.

use crate::error::{ClassFileError, Result};

/// Cursor over a class file (or a slice of one).
///
/// `base` is the absolute offset of `data[0]` inside the enclosing module so
/// that errors raised while reading an attribute payload still point at the
/// right byte of the original file.
#[derive(Debug, Clone)]
pub struct ClassReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> ClassReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_base(data, 0)
    }

    pub fn with_base(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn ensure(&self, len: usize) -> Result<()> {
        if self.remaining() < len {
            return Err(ClassFileError::UnexpectedEof {
                offset: self.offset(),
            });
        }
        Ok(())
    }

    pub fn read_u1(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u2(&mut self) -> Result<u16> {
        self.ensure(2)?;
        let value = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(value)
    }

    pub fn read_u4(&mut self) -> Result<u32> {
        self.ensure(4)?;
        let value = u32::from_be_bytes([
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u64> {
        let high = self.read_u4()? as u64;
        let low = self.read_u4()? as u64;
        Ok((high << 32) | low)
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Split off the next `len` bytes as an independent reader.
    pub fn sub_reader(&mut self, len: usize) -> Result<ClassReader<'a>> {
        let base = self.offset();
        let slice = self.read_slice(len)?;
        Ok(ClassReader::with_base(slice, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian_values() {
        let data = [0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x34, 0x07];
        let mut reader = ClassReader::new(&data);
        assert_eq!(reader.read_u4().unwrap(), 0xCAFEBABE);
        assert_eq!(reader.read_u2().unwrap(), 52);
        assert_eq!(reader.read_u1().unwrap(), 7);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_eof_reports_absolute_offset() {
        let data = [0u8; 6];
        let mut reader = ClassReader::new(&data);
        reader.read_u2().unwrap();
        let mut sub = reader.sub_reader(3).unwrap();
        sub.read_u2().unwrap();
        let err = sub.read_u2().unwrap_err();
        assert_eq!(err, ClassFileError::UnexpectedEof { offset: 4 });
    }
}
