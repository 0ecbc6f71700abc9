// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{resolve, Error};
use crate::{compile::std_source, loader};
use mgc_ast::ast::{Ident, Program};
use mgc_data_structures::span::Span;
use mgc_fs_util::SourceMap;
use std::{rc::Rc, sync::Arc};

/// Loads a program against an in-memory filesystem so resolution tests
/// never touch the disk.
fn load(source: &str, files: &[(&str, &str)]) -> Program {
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
    loader::load(root, &mut sources, &reader, std_source()).expect("load should succeed")
}

fn chain(names: &[&str]) -> Vec<Ident> {
    names
        .iter()
        .map(|name| Ident {
            span: Span::default(),
            name: (*name).into(),
        })
        .collect()
}

#[test]
fn empty_chain_is_top() {
    let program = load("namespace a { }", &[]);
    let ns = resolve(&program, &program.root, &[], false).expect("resolution should succeed");
    assert!(std::ptr::eq(ns, &program.root));
}

#[test]
fn nested_concrete() {
    let program = load("namespace a { namespace b { int x; } }", &[]);
    let ns = resolve(&program, &program.root, &chain(&["a", "b"]), false)
        .expect("resolution should succeed");
    assert_eq!(ns.globals.len(), 1);
}

#[test]
fn unrecognized_namespace() {
    let program = load("namespace a { }", &[]);
    let error = resolve(&program, &program.root, &chain(&["b"]), false)
        .expect_err("resolution should fail");
    assert!(matches!(error, Error::Unrecognized(name, _) if name == "b"));
}

#[test]
fn private_namespace_is_walled() {
    let program = load("private namespace a { } ", &[]);
    let error = resolve(&program, &program.root, &chain(&["a"]), false)
        .expect_err("resolution should fail");
    assert!(matches!(error, Error::Private(name, _) if name == "a"));
}

#[test]
fn alias_crosses_privacy_once() {
    let program = load(
        "private namespace hidden { int x; } namespace seen = hidden;",
        &[],
    );
    let ns = resolve(&program, &program.root, &chain(&["seen"]), false)
        .expect("the alias should cross the privacy wall");
    assert_eq!(ns.globals.len(), 1);
}

#[test]
fn alias_loop_never_resolves() {
    let program = load("namespace a = b; namespace b = a;", &[]);
    let error = resolve(&program, &program.root, &chain(&["a"]), false)
        .expect_err("resolution should fail");
    assert!(matches!(error, Error::NeverResolves(..)));
}

#[test]
fn file_namespace_resolves_to_file_root() {
    let program = load(
        r#"namespace lib = open "lib.mg";"#,
        &[("lib.mg", "int shared;")],
    );
    let ns = resolve(&program, &program.root, &chain(&["lib"]), false)
        .expect("resolution should succeed");
    assert_eq!(ns.globals.len(), 1);
    assert_eq!(ns.globals[0].name.name.as_ref(), "shared");
}

#[test]
fn injected_std_namespaces_resolve() {
    let program = load("int x;", &[]);
    let ns = resolve(&program, &program.root, &chain(&["std", "print"]), true)
        .expect("std should be injected");
    assert!(ns.functions.iter().any(|f| f.name.name.as_ref() == "s"));
    let ns = resolve(&program, &program.root, &chain(&["std", "game"]), true)
        .expect("std should be injected");
    assert!(ns.functions.iter().any(|f| f.name.name.as_ref() == "end"));
}

#[test]
fn alias_to_file_chain() {
    let program = load(
        r#"namespace lib = open "lib.mg"; namespace out = lib::inner;"#,
        &[("lib.mg", "namespace inner { int y; }")],
    );
    let ns = resolve(&program, &program.root, &chain(&["out"]), false)
        .expect("resolution should succeed");
    assert_eq!(ns.globals[0].name.name.as_ref(), "y");
}
