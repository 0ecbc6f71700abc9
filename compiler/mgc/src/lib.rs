// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![warn(clippy::mod_module_files, clippy::pedantic, clippy::unwrap_used)]

#[cfg(test)]
mod tests;

use miette::Report;
use mgc_frontend::{compile, error::WithSource, loader::FileReader};
use mgc_fs_util::SourceMap;

pub mod ast {
    pub use mgc_ast::ast::Program;
}

pub mod hir {
    pub use mgc_hir::hir::Program;
}

pub mod ir {
    pub use mgc_ir::ir::Module;
}

pub use mgc_frontend::loader::FsReader;

/// What the driver prints.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Emit {
    /// The parsed and loaded AST.
    Ast,
    /// The lowered IR, skipping final validation.
    Lower,
    /// The lowered IR after structural validation.
    Check,
}

/// Runs the compiler over a source string and renders the requested
/// output. Any stage error comes back as a report carrying the source
/// lines its labels point into.
pub fn run(source: &str, reader: &dyn FileReader, emit: Emit) -> Result<String, Report> {
    let mut sources = SourceMap::default();
    match emit {
        Emit::Ast => {
            let program = compile::parse_and_load(source, reader, &mut sources)
                .map_err(|error| Report::new(WithSource::from_map(&sources, error)))?;
            Ok(program.to_string())
        }
        Emit::Lower | Emit::Check => {
            let unit = compile::compile(source, reader, &mut sources)
                .map_err(|error| Report::new(WithSource::from_map(&sources, error)))?;
            let module = mgc_codegen::emit(&unit.hir).map_err(Report::new)?;
            if emit == Emit::Check {
                mgc_ir::validate::validate(&module).map_err(Report::new)?;
            }
            Ok(module.to_string())
        }
    }
}
