// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Namespace resolution: answers which concrete namespace a chain such as
//! `a::b::c` refers to, starting from a given namespace of a loaded
//! program. Aliases redirect within the namespace that declares them and
//! cross privacy walls once; file entries jump to another file's root.

#[cfg(test)]
mod tests;

use miette::Diagnostic;
use mgc_ast::ast::{Ident, Namespace, NamespaceRef, Program};
use mgc_data_structures::span::Span;
use std::rc::Rc;
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq)]
pub enum Error {
    #[error("unrecognized namespace `{0}`")]
    #[diagnostic(code("Mgc.Resolve.Unrecognized"))]
    Unrecognized(String, #[label] Span),

    #[error("attempted access to private namespace `{0}`")]
    #[diagnostic(code("Mgc.Resolve.Private"))]
    Private(String, #[label] Span),

    #[error("namespace `{0}` never resolves")]
    #[diagnostic(code("Mgc.Resolve.NeverResolves"))]
    NeverResolves(String, #[label] Span),

    #[error("unresolved file namespace `{0}`")]
    #[diagnostic(code("Mgc.Resolve.UnresolvedFile"))]
    UnresolvedFile(String, #[label] Span),
}

/// One step of the resolution record: the namespace's identity paired with
/// the residual chain. Seeing the same pair twice means the chain can
/// never resolve.
type Visit = (usize, Vec<Rc<str>>);

/// Resolves `chain` starting from `top`. An empty chain names `top`
/// itself. `allow_private` applies to the first segment only; recursion
/// into a concrete or file namespace always drops the privilege, while an
/// alias grants it for one step.
pub fn resolve<'a>(
    program: &'a Program,
    top: &'a Namespace,
    chain: &[Ident],
    allow_private: bool,
) -> Result<&'a Namespace, Error> {
    let mut seen = Vec::new();
    resolve_in(program, top, chain.to_vec(), allow_private, &mut seen)
}

fn resolve_in<'a>(
    program: &'a Program,
    top: &'a Namespace,
    chain: Vec<Ident>,
    allow_private: bool,
    seen: &mut Vec<Visit>,
) -> Result<&'a Namespace, Error> {
    let Some(head) = chain.first() else {
        return Ok(top);
    };

    let visit = (identity(top), names(&chain));
    if seen.contains(&visit) {
        return Err(Error::NeverResolves(joined(&chain), full_span(&chain)));
    }
    seen.push(visit);

    let decl = top
        .namespaces
        .iter()
        .find(|decl| decl.name.name == head.name)
        .ok_or_else(|| Error::Unrecognized(head.name.to_string(), head.span))?;

    if decl.is_private && !allow_private {
        return Err(Error::Private(head.name.to_string(), head.span));
    }

    let rest = &chain[1..];
    match &decl.kind {
        NamespaceRef::Concrete(ns) => resolve_in(program, ns, rest.to_vec(), false, seen),
        NamespaceRef::Alias(alias) => {
            let mut redirected = alias.clone();
            redirected.extend_from_slice(rest);
            resolve_in(program, top, redirected, true, seen)
        }
        NamespaceRef::File(path) => {
            let file = program
                .files
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, ns)| ns)
                .ok_or_else(|| Error::UnresolvedFile(path.to_string(), head.span))?;
            resolve_in(program, file, rest.to_vec(), false, seen)
        }
    }
}

fn identity(ns: &Namespace) -> usize {
    ns as *const Namespace as usize
}

fn names(chain: &[Ident]) -> Vec<Rc<str>> {
    chain.iter().map(|s| Rc::clone(&s.name)).collect()
}

fn joined(chain: &[Ident]) -> String {
    let names: Vec<_> = chain.iter().map(|s| s.name.as_ref()).collect();
    names.join("::")
}

fn full_span(chain: &[Ident]) -> Span {
    let lo = chain.first().map_or(0, |s| s.span.lo);
    let hi = chain.last().map_or(lo, |s| s.span.hi);
    Span { lo, hi }
}
