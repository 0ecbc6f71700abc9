// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::namespace;
use indoc::indoc;
use mgc_ast::ast::{BinOp, Event, ExprKind, NamespaceRef, StmtKind, TyKind};

#[test]
fn empty_file() {
    let ns = namespace("").expect("parse should succeed");
    assert!(ns.globals.is_empty());
    assert!(ns.functions.is_empty());
    assert!(ns.objects.is_empty());
}

#[test]
fn global_with_initializer() {
    let ns = namespace("int x = 3;").expect("parse should succeed");
    assert_eq!(ns.globals.len(), 1);
    let global = &ns.globals[0];
    assert_eq!(global.name.name.as_ref(), "x");
    assert!(matches!(global.ty.kind, TyKind::Int));
    let init = global.init.as_ref().expect("global should have initializer");
    assert!(matches!(*init.kind, ExprKind::Int(3)));
}

#[test]
fn array_global() {
    let ns = namespace("int[4] xs = [1, 2, 3, 4];").expect("parse should succeed");
    let global = &ns.globals[0];
    match &global.ty.kind {
        TyKind::Array(elem, 4) => assert!(matches!(elem.kind, TyKind::Int)),
        _ => panic!("expected array type"),
    }
    match &*global.init.as_ref().expect("initializer").kind {
        ExprKind::Array(items) => assert_eq!(items.len(), 4),
        _ => panic!("expected array literal"),
    }
}

#[test]
fn extern_function() {
    let ns = namespace("extern void print(int x);").expect("parse should succeed");
    let function = &ns.functions[0];
    assert_eq!(function.name.name.as_ref(), "print");
    assert!(function.body.is_none());
    assert_eq!(function.formals.len(), 1);
}

#[test]
fn function_with_body() {
    let ns = namespace(indoc! {"
        int add(int a, int b) {
            return a + b;
        }
    "})
    .expect("parse should succeed");
    let function = &ns.functions[0];
    assert!(matches!(function.ret.kind, TyKind::Int));
    let body = function.body.as_ref().expect("function should have body");
    assert_eq!(body.stmts.len(), 1);
    match &*body.stmts[0].kind {
        StmtKind::Return(Some(value)) => {
            assert!(matches!(&*value.kind, ExprKind::BinOp(BinOp::Add, ..)));
        }
        _ => panic!("expected return statement"),
    }
}

#[test]
fn object_with_parent_and_events() {
    let ns = namespace(indoc! {"
        object child : parent {
            int x;
            void compute() { print(x); }
            event create { x = 3; }
            event step { }
        }
    "})
    .expect("parse should succeed");
    let object = &ns.objects[0];
    assert_eq!(object.name.name.as_ref(), "child");
    let parent = object.parent.as_ref().expect("object should have parent");
    assert_eq!(parent.name.name.as_ref(), "parent");
    assert_eq!(object.members.len(), 1);
    assert_eq!(object.methods.len(), 1);
    assert_eq!(object.events.len(), 2);
    assert_eq!(object.events[0].0, Event::Create);
    assert_eq!(object.events[1].0, Event::Step);
    assert_eq!(
        object.methods[0].gameobj.as_deref(),
        Some("child"),
        "methods should carry their owning object"
    );
}

#[test]
fn create_event_with_formals() {
    let ns = namespace("object o { event create(int n) { } }").expect("parse should succeed");
    let (event, function) = &ns.objects[0].events[0];
    assert_eq!(*event, Event::Create);
    assert_eq!(function.formals.len(), 1);
    assert!(matches!(function.ret.kind, TyKind::Void));
}

#[test]
fn namespace_forms() {
    let ns = namespace(indoc! {r#"
        namespace a { int x; }
        private namespace b = a;
        namespace c = open "lib.mg";
        using a;
        private using a;
    "#})
    .expect("parse should succeed");
    assert_eq!(ns.namespaces.len(), 3);
    assert!(matches!(ns.namespaces[0].kind, NamespaceRef::Concrete(_)));
    assert!(!ns.namespaces[0].is_private);
    assert!(matches!(ns.namespaces[1].kind, NamespaceRef::Alias(_)));
    assert!(ns.namespaces[1].is_private);
    match &ns.namespaces[2].kind {
        NamespaceRef::File(path) => assert_eq!(path.as_ref(), "lib.mg"),
        _ => panic!("expected file namespace"),
    }
    assert_eq!(ns.usings.len(), 2);
    assert!(!ns.usings[0].is_private);
    assert!(ns.usings[1].is_private);
}

#[test]
fn decl_vs_expr_statement() {
    let ns = namespace(indoc! {"
        void f() {
            helper x;
            x = create helper();
            s::t y;
            y = none;
        }
    "})
    .expect("parse should succeed");
    let body = ns.functions[0].body.as_ref().expect("body");
    assert!(matches!(&*body.stmts[0].kind, StmtKind::Decl(..)));
    assert!(matches!(&*body.stmts[1].kind, StmtKind::Expr(_)));
    match &*body.stmts[2].kind {
        StmtKind::Decl(ty, name, None) => {
            assert_eq!(name.name.as_ref(), "y");
            match &ty.kind {
                TyKind::Object(path) => {
                    assert_eq!(path.chain.len(), 1);
                    assert_eq!(path.name.name.as_ref(), "t");
                }
                _ => panic!("expected object type"),
            }
        }
        _ => panic!("expected declaration"),
    }
}

#[test]
fn foreach_and_control_flow() {
    let ns = namespace(indoc! {"
        void f() {
            foreach (helper x) {
                destroy x;
            }
            for (int i = 0; i < 10; i++) {
                if (i == 5) { break; }
            }
            while (true) { break; }
        }
    "})
    .expect("parse should succeed");
    let body = ns.functions[0].body.as_ref().expect("body");
    assert!(matches!(&*body.stmts[0].kind, StmtKind::Foreach(..)));
    assert!(matches!(&*body.stmts[1].kind, StmtKind::For(..)));
    assert!(matches!(&*body.stmts[2].kind, StmtKind::While(..)));
}

#[test]
fn precedence() {
    let expr = crate::expr("1 + 2 * 3 == 7 && !done").expect("parse should succeed");
    match &*expr.kind {
        ExprKind::BinOp(BinOp::And, lhs, rhs) => {
            assert!(matches!(&*lhs.kind, ExprKind::BinOp(BinOp::Eq, ..)));
            assert!(matches!(&*rhs.kind, ExprKind::UnOp(..)));
        }
        _ => panic!("expected `&&` at the top"),
    }
}

#[test]
fn member_chains_and_calls() {
    let expr = crate::expr("a.b.m(1, x)[2]").expect("parse should succeed");
    match &*expr.kind {
        ExprKind::Subscript(target, index) => {
            assert!(matches!(&*target.kind, ExprKind::MethodCall(..)));
            assert!(matches!(&*index.kind, ExprKind::Int(2)));
        }
        _ => panic!("expected subscript at the top"),
    }
}

#[test]
fn compound_assignment_and_crement() {
    let ns = namespace("void f() { x += 1; x++; --x; }").expect("parse should succeed");
    let body = ns.functions[0].body.as_ref().expect("body");
    match &*body.stmts[0].kind {
        StmtKind::Expr(expr) => {
            assert!(matches!(&*expr.kind, ExprKind::AssignOp(BinOp::Add, ..)));
        }
        _ => panic!("expected expression statement"),
    }
}

#[test]
fn bad_token_is_fatal() {
    namespace("int x = $;").expect_err("parse should fail");
}

#[test]
fn unterminated_string_is_fatal() {
    namespace(r#"string s = "oops;"#).expect_err("parse should fail");
}
