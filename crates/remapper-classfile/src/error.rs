//! Error types for class file parsing and serialization.

use thiserror::Error;

/// Structural failure while reading or writing a class file.
///
/// Every parse-time variant carries the absolute byte offset at which the
/// violation was detected, so callers can point at the exact spot in the
/// module.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("unexpected end of class file at offset {offset}")]
    UnexpectedEof { offset: usize },

    #[error("invalid class file magic 0x{found:08X}")]
    InvalidMagic { found: u32 },

    #[error("unsupported constant pool tag {tag} at offset {offset}")]
    UnsupportedConstant { tag: u8, offset: usize },

    #[error("invalid constant pool index {index} at offset {offset}")]
    InvalidConstantIndex { index: u16, offset: usize },

    #[error("constant pool entry {index} is not valid UTF-8")]
    InvalidUtf8 { index: u16 },

    #[error("constant pool entry {index} is not a {expected}")]
    UnexpectedConstant { index: u16, expected: &'static str },

    #[error("malformed {attribute} attribute at offset {offset}: {reason}")]
    MalformedAttribute {
        attribute: &'static str,
        offset: usize,
        reason: String,
    },

    #[error("{count} trailing bytes after class file at offset {offset}")]
    TrailingBytes { offset: usize, count: usize },

    #[error("constant pool overflow: {count} slots exceed the 65535 limit")]
    ConstantPoolOverflow { count: usize },

    #[error("attribute payload of {len} bytes exceeds the u4 length field")]
    AttributeTooLarge { len: usize },

    #[error("invalid descriptor `{descriptor}`: {reason}")]
    InvalidDescriptor { descriptor: String, reason: String },

    #[error("invalid signature `{signature}` at position {position}")]
    InvalidSignature { signature: String, position: usize },
}

impl ClassFileError {
    /// Byte offset of the violation inside the module, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ClassFileError::UnexpectedEof { offset }
            | ClassFileError::UnsupportedConstant { offset, .. }
            | ClassFileError::InvalidConstantIndex { offset, .. }
            | ClassFileError::MalformedAttribute { offset, .. }
            | ClassFileError::TrailingBytes { offset, .. } => Some(*offset),
            ClassFileError::InvalidMagic { .. } => Some(0),
            _ => None,
        }
    }

    /// Re-anchor a failed pool lookup at the offset of the index that named
    /// it. Undecodable text keeps its own variant.
    pub(crate) fn at_index(self, index: u16, offset: usize) -> Self {
        match self {
            ClassFileError::InvalidUtf8 { .. } => self,
            _ => ClassFileError::InvalidConstantIndex { index, offset },
        }
    }
}

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_reported_for_structural_errors() {
        assert_eq!(
            ClassFileError::UnexpectedEof { offset: 12 }.offset(),
            Some(12)
        );
        assert_eq!(ClassFileError::InvalidMagic { found: 0 }.offset(), Some(0));
        assert_eq!(ClassFileError::InvalidUtf8 { index: 3 }.offset(), None);
    }
}
