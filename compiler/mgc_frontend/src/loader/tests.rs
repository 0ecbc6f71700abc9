// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{load, Error};
use crate::compile::{std_source, STD_PATH};
use mgc_ast::ast::{NamespaceRef, Program};
use mgc_fs_util::SourceMap;
use std::{rc::Rc, sync::Arc};

fn try_load(source: &str, files: &[(&str, &str)]) -> Result<Program, Error> {
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
    load(root, &mut sources, &reader, std_source())
}

#[test]
fn std_is_loaded_once_and_injected_everywhere() {
    let program = try_load("namespace a { namespace b { } }", &[]).expect("load should succeed");

    assert_eq!(program.files.len(), 1);
    assert_eq!(program.files[0].0.as_ref(), STD_PATH);

    // Root, a, and a::b each get their own private `std` entry.
    let has_std = |ns: &mgc_ast::ast::Namespace| {
        ns.namespaces
            .iter()
            .any(|d| d.name.name.as_ref() == "std" && d.is_private)
    };
    assert!(has_std(&program.root));
    let a = match &program.root.namespaces[0].kind {
        NamespaceRef::Concrete(ns) => ns,
        _ => panic!("expected concrete namespace"),
    };
    assert!(has_std(a));
    let b = match &a.namespaces[0].kind {
        NamespaceRef::Concrete(ns) => ns,
        _ => panic!("expected concrete namespace"),
    };
    assert!(has_std(b));
}

#[test]
fn std_is_not_injected_into_itself() {
    let program = try_load("int x;", &[]).expect("load should succeed");
    let (_, std_root) = &program.files[0];
    assert!(std_root
        .namespaces
        .iter()
        .all(|d| d.name.name.as_ref() != "std"));
}

#[test]
fn files_load_transitively_and_once() {
    let program = try_load(
        r#"namespace a = open "a.mg"; namespace b = open "b.mg";"#,
        &[
            ("a.mg", r#"namespace shared = open "shared.mg";"#),
            ("b.mg", r#"namespace shared = open "shared.mg";"#),
            ("shared.mg", "int x;"),
        ],
    )
    .expect("load should succeed");

    let mut paths: Vec<_> = program.files.iter().map(|(p, _)| p.as_ref()).collect();
    paths.sort_unstable();
    assert_eq!(paths, vec!["a.mg", "b.mg", "shared.mg", STD_PATH]);
}

#[test]
fn file_entries_are_rewritten_to_absolute_paths() {
    let program = try_load(
        r#"namespace lib = open "lib.mg";"#,
        &[("lib.mg", "int x;")],
    )
    .expect("load should succeed");

    let entry = program
        .root
        .namespaces
        .iter()
        .find(|d| d.name.name.as_ref() == "lib")
        .expect("lib entry should exist");
    assert!(matches!(&entry.kind, NamespaceRef::File(path) if path.as_ref() == "lib.mg"));
}

#[test]
fn circular_file_dependency_is_fatal() {
    let error = try_load(
        r#"namespace a = open "a.mg";"#,
        &[
            ("a.mg", r#"namespace b = open "b.mg";"#),
            ("b.mg", r#"namespace a = open "a.mg";"#),
        ],
    )
    .expect_err("load should fail");
    assert!(matches!(error, Error::Circular(path, _) if path == "a.mg"));
}

#[test]
fn missing_file_is_fatal() {
    let error =
        try_load(r#"namespace a = open "gone.mg";"#, &[]).expect_err("load should fail");
    assert!(matches!(error, Error::Io { path, .. } if path == "gone.mg"));
}

#[test]
fn parse_error_in_loaded_file_is_fatal() {
    let error = try_load(
        r#"namespace a = open "bad.mg";"#,
        &[("bad.mg", "int = ;")],
    )
    .expect_err("load should fail");
    assert!(matches!(error, Error::Parse(_)));
}
