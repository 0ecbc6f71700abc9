// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::emit;
use indoc::indoc;
use mgc_fs_util::SourceMap;
use mgc_ir::{
    ir::{Const, Instr, Module},
    validate::validate,
};
use std::{rc::Rc, sync::Arc};

fn no_files(path: &str) -> Result<(Rc<str>, Arc<str>), String> {
    Err(format!("no such file `{path}`"))
}

fn emit_source(source: &str) -> Module {
    let mut sources = SourceMap::default();
    let unit = mgc_frontend::compile::compile(source, &no_files, &mut sources)
        .expect("compile should succeed");
    let module = emit(&unit.hir).expect("emission should succeed");
    validate(&module).expect("emitted module should be structurally valid");
    module
}

fn calls(module: &Module, function: &str) -> Vec<String> {
    let function = module.function(function).expect("function should exist");
    function
        .blocks
        .iter()
        .flat_map(|b| &b.instrs)
        .filter_map(|instr| match instr {
            Instr::Call { callee, .. } => Some(callee.to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn minimal_module_shape() {
    let module = emit_source("object main { }");

    // The reference, node, and vtable structs plus the root and main.
    let names: Vec<_> = module.types.iter().map(|t| t.name.as_ref()).collect();
    assert!(names.contains(&"ref"));
    assert!(names.contains(&"node"));
    assert!(names.contains(&"vtable"));
    assert!(names.contains(&"obj::object"));
    assert!(names.contains(&"obj::main"));

    assert!(module.global("gl.head").is_some());
    assert!(module.global("gl.tail").is_some());
    assert!(module.global("gl.counter").is_some());
    assert!(module.global("tl::main.head").is_some());
    assert!(module.global("vt::main").is_some());

    assert!(module.function("new::main").is_some());
    assert!(module.function("global_create").is_some());
    assert!(module.function("global_step").is_some());
    assert!(module.function("global_draw").is_some());
}

#[test]
fn global_create_calls_the_main_constructor() {
    let module = emit_source("object main { }");
    assert_eq!(calls(&module, "global_create"), ["new::main"]);
}

#[test]
fn child_struct_embeds_parent_first() {
    let module = emit_source(indoc! {"
        object parent { int x; }
        object child : parent { float y; }
        object main { }
    "});

    let child = module
        .types
        .iter()
        .find(|t| t.name.as_ref() == "obj::child")
        .expect("child struct should exist");
    assert_eq!(child.fields[0].to_string(), "%\"obj::parent\"");
    assert_eq!(child.fields[1].to_string(), "%\"node\"");
    assert_eq!(child.fields[2].to_string(), "double");
}

#[test]
fn vtable_holds_most_derived_events_and_own_destroy() {
    let module = emit_source(indoc! {"
        object parent { event step { } }
        object child : parent { }
        object main { }
    "});

    let vtable = module.global("vt::child").expect("vtable should exist");
    let Const::Struct(fields) = &vtable.init else {
        panic!("vtable should be a struct constant");
    };
    assert_eq!(fields[0].1, Const::Global("mg::parent.step".into()));
    assert_eq!(fields[1].1, Const::Global("mg::child.destroy".into()));
    assert_eq!(fields[2].1, Const::Global("mg::object.draw".into()));

    // The destroy event is synthesized even without user code, so each
    // level unlinks its own node.
    assert!(module.function("mg::child.destroy").is_some());
    assert!(module.function("mg::parent.destroy").is_some());
}

#[test]
fn destroy_chains_to_the_parent() {
    let module = emit_source(indoc! {"
        object parent { }
        object child : parent { event destroy { print(1); } }
        object main { }
    "});

    let child_calls = calls(&module, "mg::child.destroy");
    assert!(child_calls.contains(&"print".to_string()));
    assert!(child_calls.contains(&"mg::parent.destroy".to_string()));
    assert_eq!(calls(&module, "mg::parent.destroy"), ["mg::object.destroy"]);
}

#[test]
fn constructor_splices_every_level_and_dispatches_create() {
    let module = emit_source(indoc! {"
        object parent { event create { print(1); } }
        object child : parent { event create(int n) { print(n); } }
        object main { event create { create child(3); } }
    "});

    let ctor_calls = calls(&module, "new::child");
    assert_eq!(
        ctor_calls,
        [
            "malloc",
            "mg::object.create",
            "mg::parent.create",
            "mg::child.create"
        ]
    );

    // One type list per level plus the general list.
    assert!(module.global("tl::parent.head").is_some());
    assert!(module.global("tl::child.head").is_some());
}

#[test]
fn sentinels_are_prelinked_in_both_directions() {
    let module = emit_source("object main { }");
    let head = module.global("gl.head").expect("head should exist");
    let Const::Struct(fields) = &head.init else {
        panic!("sentinel should be a struct constant");
    };
    assert_eq!(fields[0].1, Const::Global("gl.tail".into()));
    assert_eq!(fields[1].1, Const::Global("gl.tail".into()));
    assert_eq!(fields[2].1, Const::Null);
}

#[test]
fn destroy_expression_zeroes_the_id_through_the_vtable() {
    let module = emit_source(indoc! {"
        object helper { }
        object main {
            event create {
                helper h = create helper();
                destroy h;
            }
        }
    "});

    let text = module
        .function("mg::main.create")
        .expect("create event should exist")
        .to_string();
    assert!(text.contains("call void %"), "destroy dispatches indirectly");
    assert!(text.contains("store i64 0"), "destroy zeroes the id");
}

#[test]
fn foreach_skips_dead_objects_and_survives_destruction() {
    let module = emit_source(indoc! {"
        object helper { }
        object main {
            event step {
                foreach (helper x) {
                    foreach (helper y) {
                        destroy y;
                    }
                }
            }
        }
    "});

    let text = module
        .function("mg::main.step")
        .expect("step event should exist")
        .to_string();
    assert!(text.contains("foreach.cond"));
    assert!(text.contains("icmp eq i64"), "dead objects are skipped by id");
    assert!(
        text.contains("@\"tl::helper.tail\""),
        "iteration stops at the type's tail sentinel"
    );
}

#[test]
fn reapers_free_dead_nodes_and_dispatch_live_ones() {
    let module = emit_source("object main { event step { } event draw { } }");

    for name in ["global_step", "global_draw"] {
        let text = module
            .function(name)
            .expect("global event should exist")
            .to_string();
        assert!(text.contains("call void @\"free\""), "{name} reaps");
        assert!(text.contains("call void %"), "{name} dispatches via vtable");
        assert!(text.contains("@\"gl.tail\""), "{name} walks the general list");
    }
}

#[test]
fn string_literals_are_interned_constants() {
    let module = emit_source(indoc! {r#"
        object main {
            event create {
                std::print::s("success");
                std::print::s("success");
            }
        }
    "#});

    let strings: Vec<_> = module
        .globals
        .iter()
        .filter(|g| g.name.starts_with("str."))
        .collect();
    assert_eq!(strings.len(), 1, "equal literals share one constant");
    assert!(strings[0].constant);
}

#[test]
fn externs_pass_through_unmangled() {
    let module = emit_source(indoc! {"
        extern void play_sound(sound s);
        object main { event create { } }
    "});

    assert!(module.externs.iter().any(|e| e.name.as_ref() == "play_sound"));
    assert!(module.externs.iter().any(|e| e.name.as_ref() == "malloc"));
    assert!(module.externs.iter().any(|e| e.name.as_ref() == "free"));
}

#[test]
fn float_modulo_fails_at_emission() {
    let mut sources = SourceMap::default();
    let unit = mgc_frontend::compile::compile(
        "float f(float a, float b) { return a % b; } object main { }",
        &no_files,
        &mut sources,
    )
    .expect("the type rules accept float modulo");
    assert_eq!(emit(&unit.hir), Err(crate::Error::FloatModulo));
}

#[test]
fn int_modulo_is_emitted() {
    let module = emit_source("int f(int a, int b) { return a % b; } object main { }");
    let text = module.function("mg::f").expect("f should exist").to_string();
    assert!(text.contains("srem i32"));
}

#[test]
fn control_flow_emits_terminated_blocks() {
    // Orphan statements after break and return still land in closed
    // blocks; the validator run inside emit_source is the real check.
    let module = emit_source(indoc! {"
        int f(int n) {
            for (int i = 0; i < n; i++) {
                if (i == 3) {
                    break;
                    print(i);
                }
            }
            while (true) { break; }
            return n;
            print(n);
        }
        object main { }
    "});
    assert!(module.function("mg::f").is_some());
}
