//! Tiny v1 mapping reader.
//!
//! ```text
//! v1	official	intermediary	named
//! CLASS	a	net/minecraft/class_1	net/minecraft/Foo
//! FIELD	a	I	b	field_2	count
//! METHOD	a	(La;)V	c	method_3	merge
//! ```
//!
//! Owners and descriptors of `FIELD`/`METHOD` lines are written in the first
//! namespace; they are translated into the selected `from` namespace so the
//! resulting keys match the classes being remapped.

use std::collections::HashMap;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use remapper_classfile::map_descriptor;
use tracing::debug;

use crate::error::{MappingError, Result};
use crate::key::MemberKey;
use crate::set::{MappingLoader, MappingSet};

/// Reads a Tiny v1 file (or in-memory text) for a `from` → `to` namespace pair.
#[derive(Debug, Clone)]
pub struct TinyMappingLoader {
    source: TinySource,
    from: String,
    to: String,
}

#[derive(Debug, Clone)]
enum TinySource {
    Path(PathBuf),
    Text(String),
}

impl TinyMappingLoader {
    pub fn from_path(path: impl Into<PathBuf>, from: &str, to: &str) -> Self {
        Self {
            source: TinySource::Path(path.into()),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn from_text(text: impl Into<String>, from: &str, to: &str) -> Self {
        Self {
            source: TinySource::Text(text.into()),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            TinySource::Path(path) => Some(path),
            TinySource::Text(_) => None,
        }
    }
}

impl MappingLoader for TinyMappingLoader {
    fn load_mappings(&self) -> Result<MappingSet> {
        match &self.source {
            TinySource::Path(path) => {
                let file = fs::File::open(path).map_err(|source| MappingError::Io {
                    path: path.clone(),
                    source,
                })?;
                read_tiny(std::io::BufReader::new(file), &self.from, &self.to)
            }
            TinySource::Text(text) => read_tiny(text.as_bytes(), &self.from, &self.to),
        }
    }
}

struct MemberLine {
    line: usize,
    is_method: bool,
    owner: String,
    descriptor: String,
    names: Vec<String>,
}

/// Parse Tiny v1 text, selecting the `from` and `to` namespace columns.
pub fn read_tiny(reader: impl BufRead, from: &str, to: &str) -> Result<MappingSet> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(MappingError::MissingHeader),
    };
    let mut columns = header.trim_end_matches('\r').split('\t');
    match columns.next() {
        Some("v1") => {}
        Some(other) if !other.is_empty() => {
            return Err(MappingError::UnsupportedFormat(other.to_string()))
        }
        _ => return Err(MappingError::MissingHeader),
    }
    let namespaces: Vec<String> = columns.map(str::to_string).collect();
    let column = |namespace: &str| {
        namespaces
            .iter()
            .position(|ns| ns == namespace)
            .ok_or_else(|| MappingError::UnknownNamespace {
                namespace: namespace.to_string(),
                available: namespaces.clone(),
            })
    };
    let from_col = column(from)?;
    let to_col = column(to)?;

    // Class names per namespace are needed before member owners and
    // descriptors can be translated, and CLASS lines may come last.
    let mut class_rows: Vec<Vec<String>> = Vec::new();
    let mut members = Vec::new();
    for (index, line) in lines.enumerate() {
        let line_no = index + 2;
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        let malformed = |reason: &str| MappingError::MalformedLine {
            line: line_no,
            reason: reason.to_string(),
        };
        match parts[0] {
            "CLASS" => {
                if parts.len() < 2 {
                    return Err(malformed("CLASS line without names"));
                }
                class_rows.push(parts[1..].iter().map(|s| s.to_string()).collect());
            }
            kind @ ("FIELD" | "METHOD") => {
                if parts.len() < 4 {
                    return Err(malformed("member line needs owner, descriptor and names"));
                }
                members.push(MemberLine {
                    line: line_no,
                    is_method: kind == "METHOD",
                    owner: parts[1].to_string(),
                    descriptor: parts[2].to_string(),
                    names: parts[3..].iter().map(|s| s.to_string()).collect(),
                });
            }
            other => {
                return Err(malformed(&format!("unknown entry kind `{other}`")));
            }
        }
    }

    let column_of = |row: &[String], col: usize| -> Option<String> {
        row.get(col).filter(|name| !name.is_empty()).cloned()
    };

    let mut to_from_namespace: HashMap<String, String> = HashMap::new();
    let mut set = MappingSet::new();
    for row in &class_rows {
        let Some(primary) = column_of(row, 0) else {
            continue;
        };
        let source = column_of(row, from_col).unwrap_or_else(|| primary.clone());
        if let Some(target) = column_of(row, to_col) {
            set.add_class(source.clone(), target);
        }
        to_from_namespace.insert(primary, source);
    }

    for member in members {
        let (Some(source), Some(target)) = (
            column_of(&member.names, from_col),
            column_of(&member.names, to_col),
        ) else {
            continue;
        };
        let owner = to_from_namespace
            .get(&member.owner)
            .cloned()
            .unwrap_or(member.owner);
        let descriptor = if from_col == 0 {
            member.descriptor
        } else {
            map_descriptor(&member.descriptor, |name| to_from_namespace.get(name).cloned())
                .map_err(|source| MappingError::InvalidDescriptor {
                    line: member.line,
                    source,
                })?
        };
        let key = MemberKey::new(owner, source, descriptor);
        if member.is_method {
            set.add_method(key, target);
        } else {
            set.add_field(key, target);
        }
    }

    debug!(
        classes = set.classes.len(),
        fields = set.fields.len(),
        methods = set.methods.len(),
        from,
        to,
        "loaded tiny mappings"
    );
    Ok(set)
}
