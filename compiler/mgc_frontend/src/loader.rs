// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! File loading: walks the parsed root namespace, loads every `open`ed
//! file exactly once, rewrites file entries to absolute paths, detects
//! circular file dependencies, and injects the private `std` entry into
//! every namespace outside `std.mg` itself. File reading is injectable so
//! tests can run against an in-memory filesystem.

#[cfg(test)]
mod tests;

use crate::compile::STD_PATH;
use miette::Diagnostic;
use mgc_ast::ast::{Ident, Namespace, NamespaceDecl, NamespaceRef, Program};
use mgc_ast::mut_visit::MutVisitor;
use mgc_data_structures::span::Span;
use mgc_fs_util::SourceMap;
use std::{rc::Rc, sync::Arc};
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq)]
pub enum Error {
    #[error("could not read file `{path}`: {message}")]
    #[diagnostic(code("Mgc.Loader.Io"))]
    Io {
        path: String,
        message: String,
        #[label("opened here")]
        span: Span,
    },

    #[error("circular file dependency")]
    #[diagnostic(code("Mgc.Loader.Circular"))]
    Circular(String, #[label("opened here")] Span),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] mgc_parse::Error),
}

/// Reads a file named by an `open` declaration, returning its resolved
/// absolute path and contents.
pub trait FileReader {
    fn read(&self, path: &str) -> Result<(Rc<str>, Arc<str>), String>;
}

impl<F> FileReader for F
where
    F: Fn(&str) -> Result<(Rc<str>, Arc<str>), String>,
{
    fn read(&self, path: &str) -> Result<(Rc<str>, Arc<str>), String> {
        self(path)
    }
}

/// A reader over the real filesystem. `std.mg` never reaches it; the
/// loader serves the embedded copy.
pub struct FsReader;

impl FileReader for FsReader {
    fn read(&self, path: &str) -> Result<(Rc<str>, Arc<str>), String> {
        let absolute = std::fs::canonicalize(path).map_err(|e| e.to_string())?;
        let contents = std::fs::read_to_string(&absolute).map_err(|e| e.to_string())?;
        Ok((absolute.to_string_lossy().as_ref().into(), contents.into()))
    }
}

struct Offsetter(u32);

impl MutVisitor for Offsetter {
    fn visit_span(&mut self, span: &mut Span) {
        span.lo += self.0;
        span.hi += self.0;
    }
}

struct Loader<'a> {
    reader: &'a dyn FileReader,
    std_source: Arc<str>,
    sources: &'a mut SourceMap,
    files: Vec<(Rc<str>, Namespace)>,
    in_progress: Vec<Rc<str>>,
}

/// Loads every file the root namespace transitively opens. The root's
/// source must already be in the source map at offset 0.
pub fn load(
    mut root: Namespace,
    sources: &mut SourceMap,
    reader: &dyn FileReader,
    std_source: Arc<str>,
) -> Result<Program, Error> {
    let mut loader = Loader {
        reader,
        std_source,
        sources,
        files: Vec::new(),
        in_progress: Vec::new(),
    };
    loader.process(&mut root)?;
    Ok(Program {
        root,
        files: loader.files,
    })
}

impl Loader<'_> {
    fn process(&mut self, ns: &mut Namespace) -> Result<(), Error> {
        self.inject_std(ns);

        // The injected entry is walked along with the user's, so `std`
        // itself loads through the same path.
        let mut index = 0;
        while index < ns.namespaces.len() {
            let span = ns.namespaces[index].span;
            if let NamespaceRef::File(path) = &ns.namespaces[index].kind {
                let absolute = self.open_file(Rc::clone(path), span)?;
                ns.namespaces[index].kind = NamespaceRef::File(absolute);
            } else if let NamespaceRef::Concrete(inner) = &mut ns.namespaces[index].kind {
                self.process(inner)?;
            }
            index += 1;
        }
        Ok(())
    }

    fn inject_std(&mut self, ns: &mut Namespace) {
        let std_path: Rc<str> = STD_PATH.into();
        if self.in_progress.contains(&std_path) {
            return;
        }

        ns.namespaces.push(NamespaceDecl {
            span: ns.span,
            is_private: true,
            name: Ident {
                span: ns.span,
                name: "std".into(),
            },
            kind: NamespaceRef::File(std_path),
        });
    }

    fn open_file(&mut self, path: Rc<str>, span: Span) -> Result<Rc<str>, Error> {
        let (absolute, contents) = if path.as_ref() == STD_PATH {
            (path, Arc::clone(&self.std_source))
        } else {
            self.reader.read(&path).map_err(|message| Error::Io {
                path: path.to_string(),
                message,
                span,
            })?
        };

        if self.in_progress.contains(&absolute) {
            return Err(Error::Circular(absolute.to_string(), span));
        }
        if self.files.iter().any(|(p, _)| *p == absolute) {
            return Ok(absolute);
        }

        log::debug!("loading file {absolute}");
        let offset = self
            .sources
            .push(absolute.as_ref().into(), Arc::clone(&contents));
        let mut ns = mgc_parse::namespace(&contents).map_err(|e| e.with_offset(offset))?;
        Offsetter(offset).visit_namespace(&mut ns);

        self.in_progress.push(Rc::clone(&absolute));
        self.process(&mut ns)?;
        self.in_progress.pop();

        self.files.push((Rc::clone(&absolute), ns));
        Ok(absolute)
    }
}
