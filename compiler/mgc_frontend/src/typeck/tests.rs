// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{check, Error};
use crate::{compile::std_source, loader};
use indoc::indoc;
use mgc_fs_util::SourceMap;
use mgc_hir::{
    hir::{self, Event},
    ty::Ty,
};
use std::{rc::Rc, sync::Arc};

fn try_check(source: &str) -> Result<hir::Program, Error> {
    try_check_with(source, &[])
}

fn try_check_with(source: &str, files: &[(&str, &str)]) -> Result<hir::Program, Error> {
    let files: Vec<(Rc<str>, Arc<str>)> = files
        .iter()
        .map(|(path, contents)| (Rc::from(*path), Arc::from(*contents)))
        .collect();
    let reader = move |path: &str| {
        files
            .iter()
            .find(|(p, _)| p.as_ref() == path)
            .map(|(p, c)| (Rc::clone(p), Arc::clone(c)))
            .ok_or_else(|| "not found".to_string())
    };

    let mut sources = SourceMap::default();
    sources.push("<stdin>".into(), source.into());
    let root = mgc_parse::namespace(source).expect("parse should succeed");
    let program =
        loader::load(root, &mut sources, &reader, std_source()).expect("load should succeed");
    check(&program)
}

fn function<'a>(program: &'a hir::Program, symbol: &str) -> &'a hir::FunctionDef {
    program
        .functions
        .iter()
        .find(|f| f.symbol.as_ref() == symbol)
        .expect("function should exist")
}

fn object<'a>(program: &'a hir::Program, name: &str) -> &'a hir::ObjectDef {
    program
        .objects
        .defs()
        .find(|d| d.name.as_ref() == name)
        .expect("object should exist")
}

#[test]
fn minimal_program() {
    let program = try_check("object main { }").expect("check should succeed");
    // The synthetic root plus main.
    assert_eq!(program.objects.len(), 2);
    assert_eq!(program.objects.get(program.main).name.as_ref(), "main");
}

#[test]
fn missing_main_is_rejected() {
    let error = try_check("int x;").expect_err("check should fail");
    assert!(matches!(error, Error::MissingMain));
}

#[test]
fn assignment_type_mismatch_message() {
    let error = try_check(indoc! {"
        int x;
        void f() { x = true; }
        object main { }
    "})
    .expect_err("check should fail");
    assert_eq!(error.to_string(), "illegal assignment int = bool");
}

#[test]
fn return_converts_int_to_float() {
    let program = try_check(indoc! {"
        float f() { return 3; }
        object main { }
    "})
    .expect("check should succeed");
    let f = function(&program, "mg::f");
    match &f.body.0[0] {
        hir::Stmt::Return(Some(value)) => {
            assert_eq!(value.ty, Ty::Float);
            assert!(matches!(&*value.kind, hir::ExprKind::Conv { from: Ty::Int, .. }));
        }
        _ => panic!("expected a return statement"),
    }
}

#[test]
fn mixed_arithmetic_wraps_the_narrow_side() {
    let program = try_check(indoc! {"
        float f() { return 1 + 2.5; }
        object main { }
    "})
    .expect("check should succeed");
    let f = function(&program, "mg::f");
    match &f.body.0[0] {
        hir::Stmt::Return(Some(value)) => match &*value.kind {
            hir::ExprKind::BinOp(hir::BinOp::Add, lhs, rhs) => {
                assert!(matches!(&*lhs.kind, hir::ExprKind::Conv { from: Ty::Int, .. }));
                assert_eq!(rhs.ty, Ty::Float);
            }
            _ => panic!("expected a binary operation"),
        },
        _ => panic!("expected a return statement"),
    }
}

#[test]
fn duplicate_global_is_rejected() {
    let error = try_check("int x; int x; object main { }").expect_err("check should fail");
    assert!(matches!(error, Error::Duplicate("global", name, _) if name == "x"));
}

#[test]
fn void_binding_is_rejected() {
    let error = try_check("void x; object main { }").expect_err("check should fail");
    assert!(matches!(error, Error::VoidBinding(name, _) if name == "x"));
}

#[test]
fn this_cannot_be_declared() {
    let error = try_check("void f(int this) { } object main { }").expect_err("check should fail");
    assert!(matches!(error, Error::Reserved(name, _) if name == "this"));
}

#[test]
fn break_outside_loop_is_rejected() {
    let error = try_check("void f() { break; } object main { }").expect_err("check should fail");
    assert!(matches!(error, Error::BreakOutsideLoop(_)));
}

#[test]
fn non_lvalue_assignment_is_rejected() {
    let error = try_check("void f() { 3 = 4; } object main { }").expect_err("check should fail");
    assert!(matches!(error, Error::NotLvalue(_)));
}

#[test]
fn extern_object_method_is_rejected() {
    let error =
        try_check("object o { void m(); } object main { }").expect_err("check should fail");
    assert!(matches!(error, Error::ExternMethod(name, _) if name == "m"));
}

#[test]
fn non_create_event_formals_are_rejected() {
    let error = try_check("object o { event step(int n) { } } object main { }")
        .expect_err("check should fail");
    assert!(matches!(error, Error::EventFormals("step", _)));
}

#[test]
fn inheritance_cycle_is_rejected() {
    let error = try_check(indoc! {"
        object a : b { }
        object b : a { }
        object main { }
    "})
    .expect_err("check should fail");
    assert!(matches!(error, Error::InheritanceCycle(..)));
}

#[test]
fn members_and_methods_resolve_across_the_chain() {
    let program = try_check(indoc! {"
        object parent {
            int x;
            void compute() { print(x); }
        }
        object child : parent {
            event create { x = 3; compute(); }
        }
        object main {
            event create { create child(); }
        }
    "})
    .expect("check should succeed");

    let parent = object(&program, "parent");
    let child = object(&program, "child");
    assert_eq!(program.objects.chain(child.id).to_vec(), vec![parent.id, child.id]);

    let (level, index, ty) = program
        .objects
        .lookup_member(child.id, "x")
        .expect("member should resolve");
    assert_eq!(level, parent.id);
    assert_eq!(index, 0);
    assert_eq!(ty, Ty::Int);

    let sig = program
        .objects
        .lookup_method(child.id, "compute")
        .expect("method should resolve");
    assert_eq!(sig.symbol.as_ref(), "mg::parent.compute");
}

#[test]
fn overriding_method_wins_dispatch() {
    let program = try_check(indoc! {"
        object parent {
            void compute() { print(1); }
        }
        object child2 : parent {
            void compute() { print(10); }
            event create { compute(); }
        }
        object main {
            event create { create child2(); }
        }
    "})
    .expect("check should succeed");

    let child2 = object(&program, "child2");
    let sig = program
        .objects
        .lookup_method(child2.id, "compute")
        .expect("method should resolve");
    assert_eq!(sig.symbol.as_ref(), "mg::child2.compute");

    // The bare call inside the create event dispatches to the override.
    let create = child2
        .functions
        .iter()
        .find(|f| f.symbol.as_ref() == "mg::child2.create")
        .expect("create event should be checked");
    match &create.body.0[0] {
        hir::Stmt::Expr(expr) => {
            assert!(matches!(
                &*expr.kind,
                hir::ExprKind::MethodCall { symbol, .. } if symbol.as_ref() == "mg::child2.compute"
            ));
        }
        _ => panic!("expected an expression statement"),
    }
}

#[test]
fn create_checks_nearest_ancestor_formals() {
    let error = try_check(indoc! {"
        object helper { event create(int n) { } }
        object main { event create { create helper(); } }
    "})
    .expect_err("check should fail");
    assert!(
        matches!(error, Error::ArgCount { name, expected: 1, actual: 0, .. } if name == "helper")
    );
}

#[test]
fn main_create_must_take_no_formals() {
    let error =
        try_check("object main { event create(int n) { } }").expect_err("check should fail");
    assert!(matches!(error, Error::ArgCount { name, .. } if name == "main"));
}

#[test]
fn super_calls_the_parent_event() {
    let program = try_check(indoc! {"
        object parent { event create { print(1); } }
        object child : parent { event create { super(); } }
        object main { event create { create child(); } }
    "})
    .expect("check should succeed");

    let child = object(&program, "child");
    let create = child
        .functions
        .iter()
        .find(|f| f.symbol.as_ref() == "mg::child.create")
        .expect("create event should be checked");
    match &create.body.0[0] {
        hir::Stmt::Expr(expr) => {
            assert!(matches!(
                &*expr.kind,
                hir::ExprKind::MethodCall { symbol, .. } if symbol.as_ref() == "mg::parent.create"
            ));
        }
        _ => panic!("expected an expression statement"),
    }
}

#[test]
fn super_without_parent_is_unknown() {
    let error = try_check("object o { event create { super(); } } object main { }")
        .expect_err("check should fail");
    assert!(matches!(error, Error::UnknownFunction(name, _) if name == "super"));
}

#[test]
fn prelude_print_is_in_scope() {
    let program = try_check("object main { event create { print(3); } }")
        .expect("check should succeed");
    let main = object(&program, "main");
    let create = &main.functions[0];
    match &create.body.0[0] {
        hir::Stmt::Expr(expr) => {
            assert!(matches!(
                &*expr.kind,
                hir::ExprKind::Call { callee: hir::Callee::Extern(name), .. }
                    if name.as_ref() == "print"
            ));
        }
        _ => panic!("expected an expression statement"),
    }
}

#[test]
fn std_namespaces_resolve_through_the_injection() {
    let program = try_check(indoc! {r#"
        object main {
            event create {
                std::print::s("success");
                std::game::end();
            }
        }
    "#})
    .expect("check should succeed");

    // The std members are extern, so the calls pass through unmangled.
    assert!(program.externs.iter().any(|e| e.name.as_ref() == "s"));
    assert!(program.externs.iter().any(|e| e.name.as_ref() == "end"));

    let main = object(&program, "main");
    let create = &main.functions[0];
    match &create.body.0[0] {
        hir::Stmt::Expr(expr) => {
            assert!(matches!(
                &*expr.kind,
                hir::ExprKind::Call { callee: hir::Callee::Extern(name), .. }
                    if name.as_ref() == "s"
            ));
        }
        _ => panic!("expected an expression statement"),
    }
}

#[test]
fn using_imports_fold_transitively() {
    let program = try_check_with(
        indoc! {r#"
            namespace lib = open "lib.mg";
            using lib::outer;
            void f() { helper(); }
            object main { }
        "#},
        &[(
            "lib.mg",
            indoc! {"
                namespace outer {
                    using inner;
                    namespace inner {
                        void helper() { }
                    }
                }
            "},
        )],
    )
    .expect("check should succeed");

    let f = function(&program, "mg::f");
    match &f.body.0[0] {
        hir::Stmt::Expr(expr) => {
            assert!(matches!(
                &*expr.kind,
                hir::ExprKind::Call { callee: hir::Callee::Fn(symbol), .. }
                    if symbol.as_ref() == "mg::lib.mg::outer::inner::helper"
            ));
        }
        _ => panic!("expected an expression statement"),
    }
}

#[test]
fn deep_homonymous_nesting_is_not_a_cycle() {
    let program = try_check(indoc! {"
        object A : S::A { }
        namespace S {
            object A : S::A { }
            namespace S {
                object A : S::A { }
                namespace S {
                    object A { }
                }
            }
        }
        object main { }
    "})
    .expect("homonymous nesting should not be detected as a cycle");

    let count = program.objects.defs().filter(|d| d.name.as_ref() == "A").count();
    assert_eq!(count, 4);
}

#[test]
fn object_equality_widens_to_the_ancestor() {
    let program = try_check(indoc! {"
        object parent { }
        object child : parent { }
        bool f(parent p, child c) { return p == c; }
        object main { }
    "})
    .expect("check should succeed");

    let f = function(&program, "mg::f");
    match &f.body.0[0] {
        hir::Stmt::Return(Some(value)) => match &*value.kind {
            hir::ExprKind::BinOp(hir::BinOp::Eq, lhs, rhs) => {
                assert_eq!(lhs.ty, rhs.ty, "both sides widen to the ancestor");
                assert!(matches!(&*rhs.kind, hir::ExprKind::Conv { .. }));
            }
            _ => panic!("expected a binary operation"),
        },
        _ => panic!("expected a return statement"),
    }
}

#[test]
fn bool_equality_is_rejected() {
    let error = try_check("bool f(bool a, bool b) { return a == b; } object main { }")
        .expect_err("check should fail");
    assert!(matches!(error, Error::IllegalOperands { op: "==", .. }));
}

#[test]
fn array_literals_must_be_homogeneous() {
    let error = try_check("void f() { int[2] a; a = [1, true]; } object main { }")
        .expect_err("check should fail");
    assert!(matches!(error, Error::HeterogeneousArray(_)));
}

#[test]
fn empty_array_literal_is_rejected() {
    let error =
        try_check("void f() { int[2] a; a = []; } object main { }").expect_err("check should fail");
    assert!(matches!(error, Error::EmptyArray(_)));
}

#[test]
fn global_initializers_must_be_constant() {
    let error = try_check("int y; int x = y; object main { }").expect_err("check should fail");
    assert!(matches!(error, Error::IllegalGlobalInit(_)));
}

#[test]
fn constant_int_initializes_a_float_global() {
    let program = try_check("float x = 3; object main { }").expect("check should succeed");
    let global = program
        .globals
        .iter()
        .find(|g| g.symbol.as_ref() == "mgv::x")
        .expect("global should exist");
    assert_eq!(global.init, Some(hir::Const::Float(3.0)));
}

#[test]
fn events_are_recorded_on_the_table() {
    let program = try_check(indoc! {"
        object o {
            event create { }
            event step { }
        }
        object main { }
    "})
    .expect("check should succeed");

    let o = object(&program, "o");
    assert_eq!(o.events, [Event::Create, Event::Step]);
    assert_eq!(program.objects.dispatch_level(o.id, Event::Step), o.id);
}

#[test]
fn foreach_binds_an_object_reference() {
    let program = try_check(indoc! {"
        object helper { }
        void f() {
            foreach (helper h) {
                destroy h;
            }
        }
        object main { }
    "})
    .expect("check should succeed");

    let helper = object(&program, "helper");
    let f = function(&program, "mg::f");
    match &f.body.0[0] {
        hir::Stmt::Foreach { object, var, body } => {
            assert_eq!(*object, helper.id);
            assert_eq!(var.as_ref(), "h");
            assert!(matches!(
                &body.0[0],
                hir::Stmt::Expr(expr) if matches!(&*expr.kind, hir::ExprKind::Destroy(_))
            ));
        }
        _ => panic!("expected a foreach statement"),
    }
}

#[test]
fn shadowed_locals_get_distinct_slots() {
    let program = try_check(indoc! {"
        void f() {
            int x = 1;
            {
                int x = 2;
                print(x);
            }
            print(x);
        }
        object main { }
    "})
    .expect("check should succeed");

    let f = function(&program, "mg::f");
    let hir::Stmt::Local { name: outer, .. } = &f.body.0[0] else {
        panic!("expected a declaration");
    };
    let hir::Stmt::Block(inner) = &f.body.0[1] else {
        panic!("expected a block");
    };
    let hir::Stmt::Local { name: shadow, .. } = &inner.0[0] else {
        panic!("expected a declaration");
    };
    assert_eq!(outer.as_ref(), "x");
    assert_eq!(shadow.as_ref(), "x.1");
}

#[test]
fn duplicate_local_in_one_block_is_rejected() {
    let error = try_check("void f() { int x; int x; } object main { }")
        .expect_err("check should fail");
    assert!(matches!(error, Error::Duplicate("local", name, _) if name == "x"));
}
