#![allow(dead_code)]
//! Shared helpers for the engine integration tests.

use indexmap::IndexSet;
use remapper_classfile::access::{ACC_ABSTRACT, ACC_INTERFACE, ACC_PUBLIC};
use remapper_classfile::{ClassFile, ClassFileBuilder, Constant};
use remapper_core::{
    DiagnosticReport, FinalizedRemapper, ModuleRole, ModuleSource, Remapper, RemapperConfig,
    RewrittenClass,
};
use remapper_mappings::{MappingSet, MemberKey};

pub const OBJECT: Option<&str> = Some("java/lang/Object");

/// Encode a builder as a module named after its class.
pub fn module(builder: &ClassFileBuilder) -> ModuleSource {
    let class = builder.build_class().unwrap();
    let name = format!("{}.class", class.name().unwrap());
    ModuleSource::new(name, class.to_bytes().unwrap())
}

/// A concrete class whose methods all have `()V` bodies.
pub fn class(name: &str, super_name: Option<&str>, interfaces: &[&str], methods: &[(u16, &str)]) -> ModuleSource {
    let mut builder = ClassFileBuilder::new(name, super_name.or(OBJECT));
    for interface in interfaces {
        builder.interface(interface);
    }
    for (flags, method) in methods {
        builder.method(*flags, method, "()V", |code| {
            code.ret();
        });
    }
    module(&builder)
}

/// An interface with abstract `()V` methods.
pub fn interface(name: &str, supers: &[&str], methods: &[&str]) -> ModuleSource {
    let mut builder = ClassFileBuilder::new(name, OBJECT);
    builder.access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT);
    for interface in supers {
        builder.interface(interface);
    }
    for method in methods {
        builder.method_with(ACC_PUBLIC | ACC_ABSTRACT, method, "()V", |_| {});
    }
    module(&builder)
}

pub fn method_key(owner: &str, name: &str) -> MemberKey {
    MemberKey::new(owner, name, "()V")
}

pub struct Run {
    pub classes: Vec<RewrittenClass>,
    pub report: DiagnosticReport,
    pub remapper: FinalizedRemapper,
}

impl Run {
    pub fn class(&self, original: &str) -> ClassFile {
        let rewritten = self
            .classes
            .iter()
            .find(|c| c.original_name == original)
            .unwrap_or_else(|| panic!("{original} was not rewritten"));
        ClassFile::parse(&rewritten.bytes).unwrap()
    }

    pub fn method_names(&self, original: &str) -> Vec<String> {
        let class = self.class(original);
        class
            .methods
            .iter()
            .map(|m| m.name(&class.constant_pool).unwrap().to_string())
            .collect()
    }
}

pub fn run_with(
    set: MappingSet,
    forced: IndexSet<MemberKey>,
    config: RemapperConfig,
    classpath: Vec<ModuleSource>,
    targets: Vec<ModuleSource>,
) -> Run {
    let mut session = Remapper::new(config.with_threads(Some(2)), &set, forced)
        .unwrap()
        .start()
        .unwrap();
    session.ingest_all(classpath, ModuleRole::Classpath).unwrap();
    session.ingest_all(targets, ModuleRole::RewriteTarget).unwrap();
    let remapper = session.finalize_mappings();
    let (classes, report) = remapper.rewrite_all().into_result().unwrap();
    Run {
        classes,
        report,
        remapper,
    }
}

pub fn run(set: MappingSet, targets: Vec<ModuleSource>) -> Run {
    run_with(set, IndexSet::new(), RemapperConfig::default(), Vec::new(), targets)
}

/// `(owner, name, descriptor)` of every member reference in the pool.
pub fn member_refs(class: &ClassFile) -> Vec<(String, String, String)> {
    let pool = &class.constant_pool;
    pool.iter()
        .filter(|(_, c)| {
            matches!(
                c,
                Constant::Fieldref { .. } | Constant::Methodref { .. } | Constant::InterfaceMethodref { .. }
            )
        })
        .map(|(index, _)| {
            let member = pool.member_ref(index).unwrap();
            (
                member.owner.to_string(),
                member.name.to_string(),
                member.descriptor.to_string(),
            )
        })
        .collect()
}

pub fn triple(owner: &str, name: &str, desc: &str) -> (String, String, String) {
    (owner.to_string(), name.to_string(), desc.to_string())
}
