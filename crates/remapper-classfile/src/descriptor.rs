//! Class-name substitution inside descriptors and generic signatures.
//!
//! Both encodings embed internal class names (`Lpkg/Name;`). The functions here
//! walk the encoding, hand every embedded class name to a caller-supplied
//! mapper and rebuild the string. A mapper returning `None` leaves the name
//! untouched.

use crate::error::{ClassFileError, Result};

/// Remap every class name inside a field or method descriptor.
pub fn map_descriptor<F>(descriptor: &str, mut map: F) -> Result<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let invalid = |reason: &str| ClassFileError::InvalidDescriptor {
        descriptor: descriptor.to_string(),
        reason: reason.to_string(),
    };

    let mut out = String::with_capacity(descriptor.len());
    let mut rest = descriptor;
    while let Some(ch) = rest.chars().next() {
        match ch {
            'L' => {
                let end = rest
                    .find(';')
                    .ok_or_else(|| invalid("unterminated class type"))?;
                let name = &rest[1..end];
                if name.is_empty() {
                    return Err(invalid("empty class name"));
                }
                out.push('L');
                match map(name) {
                    Some(mapped) => out.push_str(&mapped),
                    None => out.push_str(name),
                }
                out.push(';');
                rest = &rest[end + 1..];
            }
            'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 'V' | '[' | '(' | ')' => {
                out.push(ch);
                rest = &rest[1..];
            }
            other => return Err(invalid(&format!("unexpected character '{other}'"))),
        }
    }
    Ok(out)
}

/// Remap the operand of a `CONSTANT_Class`: an internal name, or an array
/// descriptor for array types.
pub fn map_class_or_array<F>(name: &str, mut map: F) -> Result<String>
where
    F: FnMut(&str) -> Option<String>,
{
    if name.starts_with('[') {
        map_descriptor(name, map)
    } else {
        Ok(map(name).unwrap_or_else(|| name.to_string()))
    }
}

/// Internal name of the class returned by a method descriptor, if the return
/// type is a (non-array) class type.
pub fn return_class(descriptor: &str) -> Option<&str> {
    let (_, ret) = descriptor.rsplit_once(')')?;
    ret.strip_prefix('L')?.strip_suffix(';')
}

/// Simple name of an inner class derived from its (mapped) binary name.
///
/// When the mapped outer name is a `$`-prefix of the mapped inner name the
/// remainder is the simple name. Otherwise the segment after the last `$`
/// (or `/`) is used, minus the digits javac prefixes to local class names.
pub fn inner_simple_name<'a>(inner: &'a str, outer: Option<&str>) -> &'a str {
    if let Some(outer) = outer {
        if let Some(rest) = inner.strip_prefix(outer).and_then(|r| r.strip_prefix('$')) {
            if !rest.is_empty() {
                return rest;
            }
        }
    }
    let segment = match inner.rfind(['$', '/']) {
        Some(pos) => &inner[pos + 1..],
        None => inner,
    };
    match segment.trim_start_matches(|c: char| c.is_ascii_digit()) {
        "" => segment,
        local => local,
    }
}

/// Remap every class name inside a class, method or field generic signature.
pub fn map_signature<F>(signature: &str, map: F) -> Result<String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut parser = SignatureMapper {
        signature,
        bytes: signature.as_bytes(),
        pos: 0,
        out: String::with_capacity(signature.len()),
        map,
    };
    parser.parse()?;
    Ok(parser.out)
}

struct SignatureMapper<'a, F> {
    signature: &'a str,
    bytes: &'a [u8],
    pos: usize,
    out: String,
    map: F,
}

impl<'a, F> SignatureMapper<'a, F>
where
    F: FnMut(&str) -> Option<String>,
{
    fn error(&self) -> ClassFileError {
        ClassFileError::InvalidSignature {
            signature: self.signature.to_string(),
            position: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() != Some(byte) {
            return Err(self.error());
        }
        self.out.push(byte as char);
        self.pos += 1;
        Ok(())
    }

    /// Copy an identifier up to (not including) any byte in `stops`.
    fn identifier(&mut self, stops: &[u8]) -> Result<&'a str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start || self.peek().is_none() {
            return Err(self.error());
        }
        Ok(&self.signature[start..self.pos])
    }

    fn parse(&mut self) -> Result<()> {
        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }
        if self.peek() == Some(b'(') {
            self.expect(b'(')?;
            while self.peek() != Some(b')') {
                self.java_type()?;
            }
            self.expect(b')')?;
            if self.peek() == Some(b'V') {
                self.expect(b'V')?;
            } else {
                self.java_type()?;
            }
            while self.peek() == Some(b'^') {
                self.expect(b'^')?;
                self.reference_type()?;
            }
        } else {
            // Class signature (superclass + interfaces) or field signature.
            if self.peek().is_none() {
                return Err(self.error());
            }
            while self.peek().is_some() {
                self.reference_type()?;
            }
        }
        if self.peek().is_some() {
            return Err(self.error());
        }
        Ok(())
    }

    fn type_parameters(&mut self) -> Result<()> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            let name = self.identifier(b":")?;
            self.out.push_str(name);
            self.expect(b':')?;
            // Class bound may be empty when only interface bounds follow.
            if !matches!(self.peek(), Some(b':') | Some(b'>')) {
                self.reference_type()?;
            }
            while self.peek() == Some(b':') {
                self.expect(b':')?;
                self.reference_type()?;
            }
        }
        self.expect(b'>')
    }

    fn java_type(&mut self) -> Result<()> {
        match self.peek() {
            Some(b @ (b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z')) => self.expect(b),
            Some(_) => self.reference_type(),
            None => Err(self.error()),
        }
    }

    fn reference_type(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'L') => self.class_type(),
            Some(b'T') => {
                self.expect(b'T')?;
                let name = self.identifier(b";")?;
                self.out.push_str(name);
                self.expect(b';')
            }
            Some(b'[') => {
                self.expect(b'[')?;
                self.java_type()
            }
            _ => Err(self.error()),
        }
    }

    fn class_type(&mut self) -> Result<()> {
        self.expect(b'L')?;
        let outer = self.identifier(b"<.;")?;
        let mut original = outer.to_string();
        let mut mapped = (self.map)(outer).unwrap_or_else(|| outer.to_string());
        self.out.push_str(&mapped);

        loop {
            if self.peek() == Some(b'<') {
                self.type_arguments()?;
            }
            match self.peek() {
                Some(b'.') => {
                    self.expect(b'.')?;
                    let inner = self.identifier(b"<.;")?;
                    original = format!("{original}${inner}");
                    let inner_mapped = (self.map)(&original)
                        .unwrap_or_else(|| format!("{mapped}${inner}"));
                    let simple = inner_simple_name(&inner_mapped, Some(&mapped)).to_string();
                    self.out.push_str(&simple);
                    mapped = inner_mapped;
                }
                Some(b';') => return self.expect(b';'),
                _ => return Err(self.error()),
            }
        }
    }

    fn type_arguments(&mut self) -> Result<()> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            match self.peek() {
                Some(b'*') => self.expect(b'*')?,
                Some(b @ (b'+' | b'-')) => {
                    self.expect(b)?;
                    self.reference_type()?;
                }
                Some(_) => self.reference_type()?,
                None => return Err(self.error()),
            }
        }
        self.expect(b'>')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rename(name: &str) -> Option<String> {
        match name {
            "a" => Some("com/example/Foo".to_string()),
            "a$b" => Some("com/example/Foo$Bar".to_string()),
            "c" => Some("com/example/Baz".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_method_descriptor() {
        let mapped = map_descriptor("(La;I[Lc;)Ljava/lang/String;", rename).unwrap();
        assert_eq!(
            mapped,
            "(Lcom/example/Foo;I[Lcom/example/Baz;)Ljava/lang/String;"
        );
    }

    #[test]
    fn test_descriptor_identity_without_mappings() {
        let desc = "([[JLjava/util/List;Z)V";
        assert_eq!(map_descriptor(desc, |_| None).unwrap(), desc);
    }

    #[test]
    fn test_unterminated_descriptor_is_rejected() {
        assert!(map_descriptor("(La", rename).is_err());
        assert!(map_descriptor("Q", rename).is_err());
    }

    #[test]
    fn test_class_or_array() {
        assert_eq!(map_class_or_array("a", rename).unwrap(), "com/example/Foo");
        assert_eq!(
            map_class_or_array("[[La;", rename).unwrap(),
            "[[Lcom/example/Foo;"
        );
    }

    #[test]
    fn test_class_signature_with_type_parameters() {
        let sig = "<T:La;LE::Ljava/lang/Comparable<TT;>;>Lc;Ljava/util/List<+La;>;";
        let mapped = map_signature(sig, rename).unwrap();
        assert_eq!(
            mapped,
            "<T:Lcom/example/Foo;LE::Ljava/lang/Comparable<TT;>;>Lcom/example/Baz;Ljava/util/List<+Lcom/example/Foo;>;"
        );
    }

    #[test]
    fn test_method_signature_with_throws() {
        let sig = "<X:Ljava/lang/Object;>(TX;[La;)La<*>;^Lc;^TX;";
        let mapped = map_signature(sig, rename).unwrap();
        assert_eq!(
            mapped,
            "<X:Ljava/lang/Object;>(TX;[Lcom/example/Foo;)Lcom/example/Foo<*>;^Lcom/example/Baz;^TX;"
        );
    }

    #[test]
    fn test_inner_class_suffix() {
        let mapped = map_signature("La<TT;>.b;", rename).unwrap();
        assert_eq!(mapped, "Lcom/example/Foo<TT;>.Bar;");

        // Unmapped inner classes follow their outer class.
        let mapped = map_signature("Lc.x;", rename).unwrap();
        assert_eq!(mapped, "Lcom/example/Baz.x;");
    }

    #[test]
    fn test_malformed_signature() {
        assert!(map_signature("La", rename).is_err());
        assert!(map_signature("(I", rename).is_err());
        assert!(map_signature("", rename).is_err());
    }

    #[test]
    fn test_return_class_and_simple_name() {
        assert_eq!(return_class("()Ljava/lang/Runnable;"), Some("java/lang/Runnable"));
        assert_eq!(return_class("()[La;"), None);
        assert_eq!(inner_simple_name("x/Outer$Inner", Some("x/Outer")), "Inner");
        assert_eq!(inner_simple_name("x/Other$Inner", Some("x/Outer")), "Inner");
        assert_eq!(inner_simple_name("x/Flat", None), "Flat");
        assert_eq!(inner_simple_name("x/Outer$1Local", None), "Local");
        assert_eq!(inner_simple_name("x/Outer$1", None), "1");
    }
}
