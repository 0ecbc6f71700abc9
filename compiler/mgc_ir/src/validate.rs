// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structural validation of an emitted module, run by the default compile
//! mode before printing. The checks are shape checks only; type checking
//! happened before emission.

#[cfg(test)]
mod tests;

use crate::ir::{Block, Function, Instr, Module, Terminator};
use miette::Diagnostic;
use rustc_hash::FxHashSet;
use std::rc::Rc;
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq)]
pub enum Error {
    #[error("duplicate type definition `{0}`")]
    #[diagnostic(code("Mgc.Ir.DuplicateType"))]
    DuplicateType(String),

    #[error("duplicate global `{0}`")]
    #[diagnostic(code("Mgc.Ir.DuplicateGlobal"))]
    DuplicateGlobal(String),

    #[error("duplicate function `{0}`")]
    #[diagnostic(code("Mgc.Ir.DuplicateFunction"))]
    DuplicateFunction(String),

    #[error("function `{0}` has no blocks")]
    #[diagnostic(code("Mgc.Ir.EmptyFunction"))]
    EmptyFunction(String),

    #[error("block `{1}` in function `{0}` has no terminator")]
    #[diagnostic(code("Mgc.Ir.MissingTerminator"))]
    MissingTerminator(String, String),

    #[error("duplicate label `{1}` in function `{0}`")]
    #[diagnostic(code("Mgc.Ir.DuplicateLabel"))]
    DuplicateLabel(String, String),

    #[error("branch to unknown label `{1}` in function `{0}`")]
    #[diagnostic(code("Mgc.Ir.UnknownLabel"))]
    UnknownLabel(String, String),

    #[error("call to unknown function `{1}` in function `{0}`")]
    #[diagnostic(code("Mgc.Ir.UnknownCallee"))]
    UnknownCallee(String, String),
}

/// Asserts the module's structural invariants.
pub fn validate(module: &Module) -> Result<(), Error> {
    let mut type_names = FxHashSet::default();
    for ty in &module.types {
        if !type_names.insert(Rc::clone(&ty.name)) {
            return Err(Error::DuplicateType(ty.name.to_string()));
        }
    }

    let mut global_names = FxHashSet::default();
    for global in &module.globals {
        if !global_names.insert(Rc::clone(&global.name)) {
            return Err(Error::DuplicateGlobal(global.name.to_string()));
        }
    }

    let mut callees = FxHashSet::default();
    for decl in &module.externs {
        callees.insert(Rc::clone(&decl.name));
    }
    for function in &module.functions {
        if !callees.insert(Rc::clone(&function.name)) {
            return Err(Error::DuplicateFunction(function.name.to_string()));
        }
    }

    for function in &module.functions {
        validate_function(function, &callees)?;
    }
    Ok(())
}

fn validate_function(function: &Function, callees: &FxHashSet<Rc<str>>) -> Result<(), Error> {
    if function.blocks.is_empty() {
        return Err(Error::EmptyFunction(function.name.to_string()));
    }

    let mut labels = FxHashSet::default();
    for block in &function.blocks {
        if !labels.insert(Rc::clone(&block.label)) {
            return Err(Error::DuplicateLabel(
                function.name.to_string(),
                block.label.to_string(),
            ));
        }
    }

    for block in &function.blocks {
        validate_block(function, block, &labels, callees)?;
    }
    Ok(())
}

fn validate_block(
    function: &Function,
    block: &Block,
    labels: &FxHashSet<Rc<str>>,
    callees: &FxHashSet<Rc<str>>,
) -> Result<(), Error> {
    for instr in &block.instrs {
        if let Instr::Call { callee, .. } = instr {
            if !callees.contains(callee) {
                return Err(Error::UnknownCallee(
                    function.name.to_string(),
                    callee.to_string(),
                ));
            }
        }
    }

    let check_label = |label: &Rc<str>| {
        if labels.contains(label) {
            Ok(())
        } else {
            Err(Error::UnknownLabel(
                function.name.to_string(),
                label.to_string(),
            ))
        }
    };

    match &block.term {
        None => Err(Error::MissingTerminator(
            function.name.to_string(),
            block.label.to_string(),
        )),
        Some(Terminator::Br(label)) => check_label(label),
        Some(Terminator::CondBr(_, then, otherwise)) => {
            check_label(then)?;
            check_label(otherwise)
        }
        Some(Terminator::Ret(_) | Terminator::Unreachable) => Ok(()),
    }
}
