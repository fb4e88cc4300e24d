mod common;

use common::*;
use indexmap::IndexSet;
use remapper_classfile::access::{ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC};
use remapper_classfile::{AnnotationSpec, ClassFileBuilder, ElementSpec};
use remapper_core::{
    Diagnostic, ModuleRole, ModuleSource, RemapError, Remapper, RemapperConfig,
};
use remapper_mappings::{MappingSet, MemberKey};

fn sample_modules() -> Vec<ModuleSource> {
    let mut host = ClassFileBuilder::new("app/Host", OBJECT);
    host.source_file("Host.java")
        .signature("<T:Ljava/lang/Object;>Ljava/lang/Object;")
        .field(ACC_PRIVATE, "items", "Ljava/util/List;")
        .inner_class("app/Host$Entry", Some("app/Host"), Some("Entry"), ACC_PUBLIC)
        .annotate(AnnotationSpec::new("Lapp/Marker;").element("value", ElementSpec::Int(7)))
        .method(ACC_PUBLIC, "size", "(Lapp/Host$Entry;)I", |code| {
            code.aload(0)
                .get_field("app/Host", "items", "Ljava/util/List;")
                .invoke_interface("java/util/List", "size", "()I")
                .areturn()
                .local_variable("entry", "Lapp/Host$Entry;", 1)
                .frame_with_stack_object("app/Host");
        })
        .method(ACC_STATIC, "task", "()Ljava/lang/Runnable;", |code| {
            code.invoke_lambda(
                "run",
                "()Ljava/lang/Runnable;",
                "()V",
                ("app/Host", "lambda$task$0", "()V"),
            )
            .areturn();
        })
        .method(ACC_STATIC, "lambda$task$0", "()V", |code| {
            code.ret();
        });

    let mut entry = ClassFileBuilder::new("app/Host$Entry", OBJECT);
    entry
        .inner_class("app/Host$Entry", Some("app/Host"), Some("Entry"), ACC_PUBLIC)
        .enclosing_method("app/Host", None);

    vec![module(&host), module(&entry)]
}

#[test]
fn test_identity_mapping_is_byte_identical() {
    let modules = sample_modules();
    let run = run(MappingSet::new(), modules.clone());
    for (rewritten, original) in run.classes.iter().zip(&modules) {
        assert_eq!(rewritten.bytes, original.bytes, "{}", rewritten.name);
    }
}

#[test]
fn test_self_mapping_every_symbol_is_byte_identical() {
    let modules = sample_modules();
    let mut set = MappingSet::new();
    set.add_class("app/Host", "app/Host")
        .add_class("app/Host$Entry", "app/Host$Entry")
        .add_field(MemberKey::new("app/Host", "items", "Ljava/util/List;"), "items")
        .add_method(MemberKey::new("app/Host", "size", "(Lapp/Host$Entry;)I"), "size")
        .add_method(MemberKey::new("app/Host", "task", "()Ljava/lang/Runnable;"), "task")
        .add_method(MemberKey::new("app/Host", "lambda$task$0", "()V"), "lambda$task$0");

    let run = run(set, modules.clone());
    assert_eq!(run.classes.len(), modules.len());
    for (rewritten, original) in run.classes.iter().zip(&modules) {
        assert_eq!(rewritten.name, rewritten.original_name);
        assert_eq!(rewritten.bytes, original.bytes, "{}", rewritten.name);
    }
    assert!(run.report.iter().all(|d| !d.is_ambiguous_mapping()));
}

#[test]
fn test_unreferenced_mappings_leave_bytes_alone() {
    let modules = sample_modules();
    let mut set = MappingSet::new();
    set.add_class("other/Thing", "renamed/Thing")
        .add_method(method_key("other/Thing", "go"), "went");
    let run = run(set, modules.clone());
    for (rewritten, original) in run.classes.iter().zip(&modules) {
        assert_eq!(rewritten.bytes, original.bytes);
    }
}

#[test]
fn test_override_closure_shares_one_name() {
    let mut caller = ClassFileBuilder::new("app/Caller", OBJECT);
    caller.method(ACC_PUBLIC, "call", "(Lapp/C;)V", |code| {
        code.aload(1).invoke_virtual("app/C", "m", "()V").ret();
    });
    let mut set = MappingSet::new();
    set.add_method(method_key("app/A", "m"), "run");

    let run = run(
        set,
        vec![
            class("app/A", None, &[], &[(ACC_PUBLIC, "m")]),
            class("app/B", Some("app/A"), &[], &[(ACC_PUBLIC, "m")]),
            class("app/C", Some("app/B"), &[], &[(ACC_PUBLIC, "m")]),
            module(&caller),
        ],
    );
    for owner in ["app/A", "app/B", "app/C"] {
        assert_eq!(run.method_names(owner), vec!["run"], "{owner}");
    }
    assert!(member_refs(&run.class("app/Caller")).contains(&triple("app/C", "run", "()V")));
    assert_eq!(run.remapper.inferred(), 2);
}

#[test]
fn test_diamond_interfaces_share_one_name() {
    let mut set = MappingSet::new();
    set.add_method(method_key("app/I1", "f"), "g");

    let run = run(
        set,
        vec![
            interface("app/I1", &[], &["f"]),
            interface("app/I2", &[], &["f"]),
            class("app/D", None, &["app/I1", "app/I2"], &[(ACC_PUBLIC, "f")]),
        ],
    );
    for owner in ["app/I1", "app/I2", "app/D"] {
        assert_eq!(run.method_names(owner), vec!["g"], "{owner}");
    }
    assert!(run.report.iter().all(|d| !d.is_ambiguous_mapping()));
}

#[test]
fn test_private_methods_need_opt_in() {
    let modules = || {
        vec![
            class("app/A", None, &[], &[(ACC_PUBLIC, "m")]),
            class("app/B", Some("app/A"), &[], &[(ACC_PRIVATE, "m")]),
        ]
    };
    let mut set = MappingSet::new();
    set.add_method(method_key("app/A", "m"), "run");

    let plain = run(set.clone(), modules());
    assert_eq!(plain.method_names("app/A"), vec!["run"]);
    assert_eq!(plain.method_names("app/B"), vec!["m"]);

    let opted = run_with(
        set,
        IndexSet::new(),
        RemapperConfig::default().with_propagate_private(true),
        Vec::new(),
        modules(),
    );
    assert_eq!(opted.method_names("app/B"), vec!["run"]);
}

#[test]
fn test_forced_list_links_otherwise_excluded_methods() {
    let modules = || {
        vec![
            class("app/A", None, &[], &[(ACC_STATIC, "init")]),
            class("app/B", Some("app/A"), &[], &[(ACC_STATIC, "init")]),
        ]
    };
    let mut set = MappingSet::new();
    set.add_method(method_key("app/A", "init"), "setup");

    let plain = run(set.clone(), modules());
    assert_eq!(plain.method_names("app/B"), vec!["init"]);

    let forced = IndexSet::from([method_key("app/A", "init"), method_key("app/B", "init")]);
    let forced = run_with(set, forced, RemapperConfig::default(), Vec::new(), modules());
    assert_eq!(forced.method_names("app/A"), vec!["setup"]);
    assert_eq!(forced.method_names("app/B"), vec!["setup"]);
}

#[test]
fn test_conflicts_resolve_deterministically() {
    let modules = || {
        vec![
            class("app/A", None, &[], &[(ACC_PUBLIC, "m")]),
            class("app/B", Some("app/A"), &[], &[(ACC_PUBLIC, "m")]),
        ]
    };
    let mut set = MappingSet::new();
    set.add_method(method_key("app/B", "m"), "first")
        .add_method(method_key("app/A", "m"), "second");

    let one = run(set.clone(), modules());
    let two = run(set, modules());
    assert_eq!(one.method_names("app/A"), vec!["first"]);
    assert_eq!(one.method_names("app/B"), vec!["first"]);
    assert_eq!(one.report.summary.ambiguous_mappings, 1);
    for (a, b) in one.classes.iter().zip(&two.classes) {
        assert_eq!(a.bytes, b.bytes);
    }
    assert_eq!(one.report, two.report);
}

#[test]
fn test_unresolved_classes_pass_through_once() {
    let user = |name: &str| {
        let mut builder = ClassFileBuilder::new(name, OBJECT);
        builder.method(ACC_PUBLIC, "use", "(Lgone/Thing;)V", |code| {
            code.ret();
        });
        module(&builder)
    };
    let run = run(MappingSet::new(), vec![user("app/First"), user("app/Second")]);
    let unresolved: Vec<&Diagnostic> = run
        .report
        .iter()
        .filter(|d| {
            matches!(d, Diagnostic::UnresolvedSymbol { class_name, .. } if class_name == "gone/Thing")
        })
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert!(matches!(
        unresolved[0],
        Diagnostic::UnresolvedSymbol { referenced_from, .. } if referenced_from == "app/First"
    ));
    let first = run.class("app/First");
    assert_eq!(
        first.methods[0].descriptor(&first.constant_pool).unwrap(),
        "(Lgone/Thing;)V"
    );
}

#[test]
fn test_classpath_supplies_hierarchy() {
    let mut set = MappingSet::new();
    set.add_method(method_key("lib/Base", "m"), "handle");
    let run = run_with(
        set,
        IndexSet::new(),
        RemapperConfig::default(),
        vec![class("lib/Base", None, &[], &[(ACC_PUBLIC, "m")])],
        vec![class("app/Impl", Some("lib/Base"), &[], &[(ACC_PUBLIC, "m")])],
    );
    assert_eq!(run.classes.len(), 1);
    assert_eq!(run.method_names("app/Impl"), vec!["handle"]);
}

#[test]
fn test_missing_supertype_is_reported() {
    let run = run(
        MappingSet::new(),
        vec![class("app/Impl", Some("lib/Missing"), &[], &[])],
    );
    let report = run.remapper.conflict_report();
    assert!(report.iter().any(|d| matches!(
        d,
        Diagnostic::IncompleteClasspath { class_name, referenced_from }
            if class_name == "lib/Missing" && referenced_from == "app/Impl"
    )));
    assert!(report.summary.incomplete_classpath >= 1);
}

#[test]
fn test_inherited_method_reference_is_renamed() {
    let mut caller = ClassFileBuilder::new("app/Caller", OBJECT);
    caller.method(ACC_PUBLIC, "call", "(Lapp/B;)V", |code| {
        code.aload(1).invoke_virtual("app/B", "m", "()V").ret();
    });
    let mut set = MappingSet::new();
    set.add_method(method_key("app/A", "m"), "run");
    let run = run(
        set,
        vec![
            class("app/A", None, &[], &[(ACC_PUBLIC, "m")]),
            class("app/B", Some("app/A"), &[], &[]),
            module(&caller),
        ],
    );
    assert!(member_refs(&run.class("app/Caller")).contains(&triple("app/B", "run", "()V")));
}

#[test]
fn test_inner_class_follows_outer_mapping() {
    let mut set = MappingSet::new();
    set.add_class("app/Host", "pkg/Main");
    let run = run(set, sample_modules());
    let names: Vec<&str> = run.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["pkg/Main", "pkg/Main$Entry"]);
}

#[test]
fn test_duplicate_class_is_fatal() {
    let set = MappingSet::new();
    let mut session = Remapper::new(RemapperConfig::default(), &set, IndexSet::new())
        .unwrap()
        .start()
        .unwrap();
    let err = session
        .ingest_all(
            vec![class("app/Twice", None, &[], &[]), class("app/Twice", None, &[], &[])],
            ModuleRole::RewriteTarget,
        )
        .unwrap_err();
    assert!(matches!(err, RemapError::DuplicateClass { name } if name == "app/Twice"));
}

#[test]
fn test_unknown_class_rewrite_fails() {
    let run = run(MappingSet::new(), vec![class("app/Only", None, &[], &[])]);
    assert!(run.remapper.rewrite("app/Only").is_ok());
    assert!(matches!(
        run.remapper.rewrite("app/Other"),
        Err(RemapError::UnknownClass { .. })
    ));
}

#[test]
fn test_field_mapping_is_not_propagated_to_shadowing_field() {
    let mut base = ClassFileBuilder::new("app/Base", OBJECT);
    base.field(ACC_PUBLIC, "value", "I");
    let mut child = ClassFileBuilder::new("app/Child", Some("app/Base"));
    child.field(ACC_PUBLIC, "value", "I");
    let mut set = MappingSet::new();
    set.add_field(MemberKey::new("app/Base", "value", "I"), "amount");

    let run = run(set, vec![module(&base), module(&child)]);
    let base = run.class("app/Base");
    let child = run.class("app/Child");
    assert_eq!(base.fields[0].name(&base.constant_pool).unwrap(), "amount");
    assert_eq!(child.fields[0].name(&child.constant_pool).unwrap(), "value");
}

#[test]
fn test_modified_utf8_names_are_remapped() {
    let mut odd = ClassFileBuilder::new("app/Odd", OBJECT);
    odd.method(ACC_PUBLIC, "a\0b", "()V", |code| {
        code.ret();
    });
    let mut caller = ClassFileBuilder::new("app/Caller", OBJECT);
    caller.method(ACC_PUBLIC, "call", "(Lapp/Odd;)V", |code| {
        code.aload(1).invoke_virtual("app/Odd", "a\0b", "()V").ret();
    });
    let mut set = MappingSet::new();
    set.add_method(method_key("app/Odd", "a\0b"), "run\u{1F600}");

    let run = run(set, vec![module(&odd), module(&caller)]);
    assert_eq!(run.method_names("app/Odd"), vec!["run\u{1F600}"]);
    assert!(member_refs(&run.class("app/Caller"))
        .contains(&triple("app/Odd", "run\u{1F600}", "()V")));
    let bytes = &run.classes[0].bytes;
    assert!(bytes.windows(3).any(|w| w == [0xED, 0xA0, 0xBD]));
    assert!(!bytes.windows(4).any(|w| w == "\u{1F600}".as_bytes()));
}
