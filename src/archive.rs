//! Module sources on disk: jars, class directories and loose `.class` files.
//!
//! Inputs are read into memory as [`ArchiveEntry`] values in a stable order
//! (archive order for jars, sorted paths for directories). The output jar is
//! written from the same representation.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use remapper_core::ModuleSource;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const CLASS_SUFFIX: &str = ".class";

/// One file of an input or output archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// `/`-separated path inside the archive.
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }

    pub fn is_class(&self) -> bool {
        self.path.ends_with(CLASS_SUFFIX)
    }

    /// Archive path of a class given its internal name.
    pub fn class_path(internal_name: &str) -> String {
        format!("{internal_name}{CLASS_SUFFIX}")
    }

    pub fn to_module(&self) -> ModuleSource {
        ModuleSource::new(self.path.clone(), self.bytes.clone())
    }
}

/// Read every file of a jar, a directory tree or a single `.class` file.
pub fn read_entries(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let metadata =
        fs::metadata(path).with_context(|| format!("Can't read {}", path.display()))?;
    let entries = if metadata.is_dir() {
        read_dir(path)?
    } else if path.extension().is_some_and(|ext| ext == "class") {
        let bytes = fs::read(path).with_context(|| format!("Can't read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        vec![ArchiveEntry::new(name, bytes)]
    } else {
        read_jar(path)?
    };
    debug!(path = %path.display(), entries = entries.len(), "read module source");
    Ok(entries)
}

/// Class entries of `path` as module sources; resources are skipped.
pub fn read_classes(path: &Path) -> Result<Vec<ModuleSource>> {
    Ok(read_entries(path)?
        .iter()
        .filter(|entry| entry.is_class())
        .map(ArchiveEntry::to_module)
        .collect())
}

fn read_jar(path: &Path) -> Result<Vec<ArchiveEntry>> {
    let file = File::open(path).with_context(|| format!("Can't open {}", path.display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .with_context(|| format!("{} is not a jar or zip archive", path.display()))?;

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("Bad entry {index} in {}", path.display()))?;
        if !entry.is_file() {
            continue;
        }
        let name = entry.name().to_string();
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to read {name} from {}", path.display()))?;
        entries.push(ArchiveEntry::new(name, bytes));
    }
    Ok(entries)
}

fn read_dir(root: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut entries = Vec::new();
    for item in WalkDir::new(root).sort_by_file_name() {
        let item = item.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !item.file_type().is_file() {
            continue;
        }
        let relative = item
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{} escapes {}", item.path().display(), root.display()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let bytes = fs::read(item.path())
            .with_context(|| format!("Can't read {}", item.path().display()))?;
        entries.push(ArchiveEntry::new(name, bytes));
    }
    Ok(entries)
}

/// Write `entries` to a new jar at `path`, in the given order.
pub fn write_jar(path: &Path, entries: &[ArchiveEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Can't create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("Can't create {}", path.display()))?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut seen = std::collections::HashSet::new();
    for entry in entries {
        if !seen.insert(entry.path.as_str()) {
            bail!("duplicate output entry {}", entry.path);
        }
        writer
            .start_file(entry.path.as_str(), options)
            .with_context(|| format!("Failed to add {} to {}", entry.path, path.display()))?;
        writer.write_all(&entry.bytes)?;
    }
    writer
        .finish()
        .with_context(|| format!("Failed to finish {}", path.display()))?
        .flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_jar_round_trip_keeps_order() {
        let dir = TempDir::new().unwrap();
        let jar = dir.path().join("out/test.jar");
        let entries = vec![
            ArchiveEntry::new("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\n".to_vec()),
            ArchiveEntry::new("b/B.class", vec![0xCA, 0xFE]),
            ArchiveEntry::new("a/data.txt", b"payload".to_vec()),
        ];
        write_jar(&jar, &entries).unwrap();
        assert_eq!(read_entries(&jar).unwrap(), entries);
    }

    #[test]
    fn test_directory_input_uses_relative_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("x/y")).unwrap();
        fs::write(dir.path().join("x/y/Z.class"), [1, 2, 3]).unwrap();
        fs::write(dir.path().join("readme.txt"), "hi").unwrap();

        let entries = read_entries(dir.path()).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["readme.txt", "x/y/Z.class"]);
        assert_eq!(read_classes(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_output_paths_are_rejected() {
        let dir = TempDir::new().unwrap();
        let entries = vec![
            ArchiveEntry::new("a/A.class", vec![1]),
            ArchiveEntry::new("a/A.class", vec![2]),
        ];
        let err = write_jar(&dir.path().join("dup.jar"), &entries).unwrap_err();
        assert!(err.to_string().contains("duplicate output entry"));
    }
}
