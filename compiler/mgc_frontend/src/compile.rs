// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The frontend pipeline: parse the main source, load every opened file,
//! and run the semantic analyzer. Each stage's error is wrapped so the
//! driver can report any of them uniformly with source context.

#[cfg(test)]
mod tests;

use crate::{
    loader::{self, FileReader},
    typeck,
};
use miette::Diagnostic;
use mgc_ast::ast;
use mgc_fs_util::SourceMap;
use mgc_hir::hir;
use std::sync::Arc;
use thiserror::Error;

/// The path the injected `std` namespace resolves to. The contents are
/// embedded in the compiler; the loader never consults the filesystem for
/// them.
pub const STD_PATH: &str = "std.mg";

/// The embedded standard library source.
#[must_use]
pub fn std_source() -> Arc<str> {
    include_str!("../../../library/std.mg").into()
}

#[derive(Clone, Debug, Diagnostic, Error)]
#[diagnostic(transparent)]
#[error(transparent)]
pub struct Error(pub(super) ErrorKind);

#[derive(Clone, Debug, Diagnostic, Error)]
#[diagnostic(transparent)]
pub(super) enum ErrorKind {
    #[error("syntax error")]
    Parse(#[from] mgc_parse::Error),
    #[error("load error")]
    Load(#[from] loader::Error),
    #[error("check error")]
    Check(#[from] typeck::Error),
}

/// The result of a frontend run: the loaded AST and the typed HIR. The
/// source map is owned by the caller so diagnostics can be rendered even
/// when a stage fails.
#[derive(Debug)]
pub struct CompileUnit {
    pub ast: ast::Program,
    pub hir: hir::Program,
}

/// Parses and loads the main source, without semantic analysis. This is
/// what the AST-printing mode runs.
pub fn parse_and_load(
    source: &str,
    reader: &dyn FileReader,
    sources: &mut SourceMap,
) -> Result<ast::Program, Error> {
    sources.push(Arc::from("<stdin>"), Arc::from(source));
    let root = mgc_parse::namespace(source).map_err(|e| Error(e.into()))?;
    loader::load(root, sources, reader, std_source()).map_err(|e| Error(e.into()))
}

/// Runs the whole frontend.
pub fn compile(
    source: &str,
    reader: &dyn FileReader,
    sources: &mut SourceMap,
) -> Result<CompileUnit, Error> {
    let ast = parse_and_load(source, reader, sources)?;
    log::debug!("loaded {} file(s)", ast.files.len());
    let hir = typeck::check(&ast).map_err(|e| Error(e.into()))?;
    Ok(CompileUnit { ast, hir })
}
