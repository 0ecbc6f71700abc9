// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::{validate, Error};
use crate::ir::{Block, Const, Function, Module, Operand, Terminator, Ty, Value};
use expect_test::expect;

fn ret_void(label: &str) -> Block {
    Block {
        label: label.into(),
        instrs: Vec::new(),
        term: Some(Terminator::Ret(None)),
    }
}

fn function(name: &str, blocks: Vec<Block>) -> Function {
    Function {
        name: name.into(),
        params: Vec::new(),
        ret: Ty::Void,
        blocks,
    }
}

#[test]
fn empty_module_is_valid() {
    validate(&Module::default()).expect("empty module should validate");
}

#[test]
fn terminated_function_is_valid() {
    let module = Module {
        functions: vec![function("f", vec![ret_void("entry")])],
        ..Module::default()
    };
    validate(&module).expect("module should validate");
}

#[test]
fn missing_terminator_is_rejected() {
    let module = Module {
        functions: vec![function(
            "f",
            vec![Block {
                label: "entry".into(),
                instrs: Vec::new(),
                term: None,
            }],
        )],
        ..Module::default()
    };
    assert_eq!(
        validate(&module),
        Err(Error::MissingTerminator("f".to_string(), "entry".to_string()))
    );
}

#[test]
fn branch_targets_must_exist() {
    let module = Module {
        functions: vec![function(
            "f",
            vec![Block {
                label: "entry".into(),
                instrs: Vec::new(),
                term: Some(Terminator::Br("nowhere".into())),
            }],
        )],
        ..Module::default()
    };
    assert_eq!(
        validate(&module),
        Err(Error::UnknownLabel("f".to_string(), "nowhere".to_string()))
    );
}

#[test]
fn duplicate_function_is_rejected() {
    let module = Module {
        functions: vec![
            function("f", vec![ret_void("entry")]),
            function("f", vec![ret_void("entry")]),
        ],
        ..Module::default()
    };
    assert_eq!(validate(&module), Err(Error::DuplicateFunction("f".to_string())));
}

#[test]
fn display_of_small_function() {
    let function = Function {
        name: "mg::f".into(),
        params: vec![("x".into(), Ty::I32)],
        ret: Ty::I32,
        blocks: vec![Block {
            label: "entry".into(),
            instrs: vec![crate::ir::Instr::Bin {
                dst: "t0".into(),
                op: crate::ir::BinOpcode::Add,
                ty: Ty::I32,
                lhs: Value::Local("x".into()),
                rhs: Value::Const(Const::Int(1)),
            }],
            term: Some(Terminator::Ret(Some(Operand {
                ty: Ty::I32,
                value: Value::Local("t0".into()),
            }))),
        }],
    };
    let expected = expect![[r#"
        define i32 @"mg::f"(i32 %x) {
        entry:
          %t0 = add i32 %x, 1
          ret i32 %t0
        }"#]];
    expected.assert_eq(&function.to_string());
}
