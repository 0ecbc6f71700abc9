// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{compile, parse_and_load, ErrorKind, STD_PATH};
use indoc::indoc;
use mgc_fs_util::SourceMap;
use std::{rc::Rc, sync::Arc};

fn no_files(path: &str) -> Result<(Rc<str>, Arc<str>), String> {
    Err(format!("no such file `{path}`"))
}

#[test]
fn whole_pipeline_produces_ast_and_hir() {
    let mut sources = SourceMap::default();
    let unit = compile(
        indoc! {"
            object main {
                event create { print(3); }
            }
        "},
        &no_files,
        &mut sources,
    )
    .expect("compile should succeed");

    assert_eq!(unit.ast.files[0].0.as_ref(), STD_PATH);
    assert_eq!(unit.hir.objects.get(unit.hir.main).name.as_ref(), "main");
    assert!(sources.find_by_name("<stdin>").is_some());
    assert!(sources.find_by_name(STD_PATH).is_some());
}

#[test]
fn parse_errors_surface_as_compile_errors() {
    let mut sources = SourceMap::default();
    let error = compile("object {", &no_files, &mut sources).expect_err("compile should fail");
    assert!(matches!(error.0, ErrorKind::Parse(_)));
}

#[test]
fn check_errors_surface_as_compile_errors() {
    let mut sources = SourceMap::default();
    let error = compile("int x;", &no_files, &mut sources).expect_err("compile should fail");
    assert!(matches!(error.0, ErrorKind::Check(_)));
}

#[test]
fn load_errors_surface_as_compile_errors() {
    let mut sources = SourceMap::default();
    let error = compile(
        r#"namespace a = open "gone.mg"; object main { }"#,
        &no_files,
        &mut sources,
    )
    .expect_err("compile should fail");
    assert!(matches!(error.0, ErrorKind::Load(_)));
}

#[test]
fn parse_and_load_skips_semantic_analysis() {
    let mut sources = SourceMap::default();
    // `x = true` is a type error, but the AST mode never checks it.
    let program = parse_and_load(
        indoc! {"
            int x;
            void f() { x = true; }
        "},
        &no_files,
        &mut sources,
    )
    .expect("loading should succeed");
    assert_eq!(program.root.functions.len(), 1);
}
