// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lowers the typed HIR into the target IR module: object struct layout
//! with parent-first prefixes, per-type vtables and intrusive list
//! sentinels, constructors, lazy destruction, and the global event
//! dispatch functions the runtime drives.

#![warn(clippy::mod_module_files, clippy::pedantic, clippy::unwrap_used)]

mod builder;
mod emit;
mod layout;
mod objects;
#[cfg(test)]
mod tests;

use miette::Diagnostic;
use mgc_hir::hir;
use mgc_ir::ir;
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq)]
pub enum Error {
    #[error("float modulo is not supported")]
    #[diagnostic(code("Mgc.Codegen.FloatModulo"))]
    FloatModulo,
}

/// Emits the whole module: struct types, globals, sentinels, vtables,
/// constructors, event and member functions, free functions, and the
/// `global_create`/`global_step`/`global_draw` entry points.
pub fn emit(program: &hir::Program) -> Result<ir::Module, Error> {
    let mut emitter = emit::ModuleEmitter::new(program);
    emitter.emit()?;
    let module = emitter.finish();
    log::debug!(
        "emitted {} functions, {} globals",
        module.functions.len(),
        module.globals.len()
    );
    Ok(module)
}
