// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{run, Emit};
use indoc::indoc;
use std::{rc::Rc, sync::Arc};

fn no_files(path: &str) -> Result<(Rc<str>, Arc<str>), String> {
    Err(format!("no such file `{path}`"))
}

#[test]
fn check_mode_prints_validated_ir() {
    let output = run(
        indoc! {r#"
            object main {
                event create {
                    std::print::s("success");
                    std::game::end();
                }
            }
        "#},
        &no_files,
        Emit::Check,
    )
    .expect("compilation should succeed");

    assert!(output.contains("declare void @\"s\"(ptr)"));
    assert!(output.contains("declare void @\"end\"()"));
    assert!(output.contains("declare void @\"prints\"(ptr)"));
    assert!(output.contains("define void @\"global_create\"()"));
    assert!(output.contains("define void @\"global_step\"()"));
    assert!(output.contains("define void @\"global_draw\"()"));
    assert!(output.contains("c\"success\\00\""));
}

#[test]
fn lower_mode_prints_ir_too() {
    let output = run("object main { }", &no_files, Emit::Lower)
        .expect("compilation should succeed");
    assert!(output.contains("define %\"ref\" @\"new::main\"()"));
}

#[test]
fn ast_mode_prints_the_loaded_tree() {
    let output = run(
        "object player { int hp; } object main { }",
        &no_files,
        Emit::Ast,
    )
    .expect("loading should succeed");
    assert!(output.contains("Object"));
    assert!(output.contains("\"player\""));
    assert!(output.contains("member int \"hp\""));
}

#[test]
fn type_errors_name_both_types() {
    let error = run(
        "int x; void f() { x = true; } object main { }",
        &no_files,
        Emit::Check,
    )
    .expect_err("compilation should fail");
    assert!(error.to_string().contains("illegal assignment int = bool"));
}

#[test]
fn parse_errors_are_fatal() {
    run("object {", &no_files, Emit::Check).expect_err("compilation should fail");
}
