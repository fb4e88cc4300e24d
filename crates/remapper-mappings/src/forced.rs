//! Forced-propagation list.
//!
//! One member per line, `owner.name(desc)ret` for methods and
//! `owner.name:desc` for fields. Blank lines and lines starting with `#` are
//! ignored; surrounding whitespace is trimmed. Lines that do not name a
//! member are skipped with a warning.

use std::fs;
use std::path::Path;

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::error::{MappingError, Result};
use crate::key::MemberKey;

pub fn parse_forced_list(text: &str) -> IndexSet<MemberKey> {
    let mut forced = IndexSet::new();
    for (index, line) in text.lines().enumerate() {
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        match MemberKey::parse(entry) {
            Some(key) => {
                forced.insert(key);
            }
            None => warn!(line = index + 1, entry, "skipping invalid forced-propagation entry"),
        }
    }
    forced
}

pub fn read_forced_list(path: &Path) -> Result<IndexSet<MemberKey>> {
    let text = fs::read_to_string(path).map_err(|source| MappingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let forced = parse_forced_list(&text);
    debug!(entries = forced.len(), path = %path.display(), "loaded forced-propagation list");
    Ok(forced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let forced = parse_forced_list(
            "# bridges\n\n  a/B.m(I)V  \n#a/B.x()V\na/C.f:La/B;\na/B.m(I)V\n",
        );
        let entries: Vec<String> = forced.iter().map(ToString::to_string).collect();
        assert_eq!(entries, vec!["a/B.m(I)V", "a/C.f:La/B;"]);
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let forced = parse_forced_list("a/B.m()V\nbogus\n  \na/C.g(I)V\n");
        let entries: Vec<String> = forced.iter().map(ToString::to_string).collect();
        assert_eq!(entries, vec!["a/B.m()V", "a/C.g(I)V"]);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_forced_list(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, MappingError::Io { .. }));
    }
}
