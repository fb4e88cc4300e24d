#![allow(dead_code)]
//! Shared fixtures for the CLI tests.

use std::path::{Path, PathBuf};

use class_remapper::{read_entries, write_jar, ArchiveEntry};
use remapper_classfile::access::{ACC_PUBLIC, ACC_STATIC};
use remapper_classfile::{ClassFile, ClassFileBuilder};
use tempfile::TempDir;

pub const OBJECT: Option<&str> = Some("java/lang/Object");

pub const MAPPINGS: &str = "v1\tofficial\tnamed\n\
    CLASS\tq\tgame/Widget\n\
    CLASS\tr\tgame/Button\n\
    FIELD\tq\tI\ta\twidth\n\
    METHOD\tq\t()V\tb\trender\n";

/// Temporary workspace holding inputs and outputs of one invocation.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn jar(&self, name: &str, entries: &[ArchiveEntry]) -> PathBuf {
        let path = self.path(name);
        write_jar(&path, entries).unwrap();
        path
    }
}

pub fn class_entry(builder: &ClassFileBuilder) -> ArchiveEntry {
    let class = builder.build_class().unwrap();
    ArchiveEntry::new(
        ArchiveEntry::class_path(class.name().unwrap()),
        class.to_bytes().unwrap(),
    )
}

/// `q` with field `a`, method `b` and a `StackMapTable`; `r extends q`
/// overriding `b`.
pub fn game_classes() -> Vec<ArchiveEntry> {
    let mut widget = ClassFileBuilder::new("q", OBJECT);
    widget
        .field(ACC_PUBLIC, "a", "I")
        .method(ACC_PUBLIC, "b", "()V", |code| {
            code.ret();
        })
        .method(ACC_PUBLIC | ACC_STATIC, "cast", "(Ljava/lang/Object;)Lq;", |code| {
            code.aload(0)
                .checkcast("q")
                .areturn()
                .frame_with_stack_object("q");
        });
    let mut button = ClassFileBuilder::new("r", Some("q"));
    button.method(ACC_PUBLIC, "b", "()V", |code| {
        code.aload(0).get_field("r", "a", "I").pop().ret();
    });
    vec![class_entry(&widget), class_entry(&button)]
}

pub fn read_output(path: &Path) -> Vec<ArchiveEntry> {
    read_entries(path).unwrap()
}

pub fn parse_entry(entries: &[ArchiveEntry], path: &str) -> ClassFile {
    let entry = entries
        .iter()
        .find(|e| e.path == path)
        .unwrap_or_else(|| panic!("missing entry {path}"));
    ClassFile::parse(&entry.bytes).unwrap()
}

pub fn method_names(class: &ClassFile) -> Vec<String> {
    class
        .methods
        .iter()
        .map(|m| m.name(&class.constant_pool).unwrap().to_string())
        .collect()
}
