//! Member identity.

use std::fmt;

/// Field or method; decides which table a [`MemberKey`] lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberKind {
    Field,
    Method,
}

impl MemberKind {
    /// Kind implied by a descriptor: method descriptors start with `(`.
    pub fn of_descriptor(descriptor: &str) -> Self {
        if descriptor.starts_with('(') {
            MemberKind::Method
        } else {
            MemberKind::Field
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => write!(f, "field"),
            MemberKind::Method => write!(f, "method"),
        }
    }
}

/// `(owner, name, descriptor)`: overloads differ by descriptor, so it is
/// part of the identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberKey {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

impl MemberKey {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    pub fn kind(&self) -> MemberKind {
        MemberKind::of_descriptor(&self.descriptor)
    }

    /// Same name and descriptor on a different owner.
    pub fn with_owner(&self, owner: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: self.name.clone(),
            descriptor: self.descriptor.clone(),
        }
    }

    /// Parse `owner.name(desc)ret` or `owner.name:desc`.
    pub fn parse(text: &str) -> Option<Self> {
        let split = text.find(['(', ':'])?;
        let (owner, name) = text[..split].rsplit_once('.')?;
        let descriptor = match text.as_bytes()[split] {
            b'(' => &text[split..],
            _ => &text[split + 1..],
        };
        if owner.is_empty() || name.is_empty() || descriptor.is_empty() {
            return None;
        }
        Some(Self::new(owner, name, descriptor))
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            MemberKind::Method => write!(f, "{}.{}{}", self.owner, self.name, self.descriptor),
            MemberKind::Field => write!(f, "{}.{}:{}", self.owner, self.name, self.descriptor),
        }
    }
}
