// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{
    keyword::Keyword,
    lex::TokenKind,
    scan::Scanner,
    Error, ErrorKind, Parser, Result,
};
use mgc_ast::ast::{Ident, Path};

pub(super) fn token(s: &mut Scanner, kind: TokenKind) -> Result<()> {
    let peek = s.peek();
    if peek.kind == kind {
        s.advance();
        Ok(())
    } else {
        Err(Error(ErrorKind::Token(kind, peek.kind, peek.span)))
    }
}

pub(super) fn keyword(s: &mut Scanner, keyword: Keyword) -> Result<()> {
    token(s, TokenKind::Keyword(keyword))
}

pub(super) fn eat_token(s: &mut Scanner, kind: TokenKind) -> bool {
    if s.peek().kind == kind {
        s.advance();
        true
    } else {
        false
    }
}

pub(super) fn eat_keyword(s: &mut Scanner, keyword: Keyword) -> bool {
    eat_token(s, TokenKind::Keyword(keyword))
}

pub(super) fn ident(s: &mut Scanner) -> Result<Ident> {
    let peek = s.peek();
    if peek.kind == TokenKind::Ident {
        let name = s.read().into();
        s.advance();
        Ok(Ident {
            span: peek.span,
            name,
        })
    } else {
        Err(Error(ErrorKind::Rule("identifier", peek.kind, peek.span)))
    }
}

/// Parses `a::b::…::name`.
pub(super) fn path(s: &mut Scanner) -> Result<Path> {
    let lo = s.peek().span.lo;
    let mut parts = vec![ident(s)?];
    while s.peek().kind == TokenKind::ColonColon {
        s.advance();
        parts.push(ident(s)?);
    }

    let name = parts.pop().expect("path should have at least one part");
    Ok(Path {
        span: s.span(lo),
        chain: parts,
        name,
    })
}

/// Tries a parser, rolling the scanner back if it fails.
pub(super) fn opt<T>(s: &mut Scanner, mut p: impl Parser<T>) -> Option<T> {
    let mark = s.mark();
    match p(s) {
        Ok(value) => Some(value),
        Err(_) => {
            s.reset(mark);
            None
        }
    }
}

/// Parses a comma-separated sequence terminated by `close`, which is not
/// consumed.
pub(super) fn comma_sep<T>(
    s: &mut Scanner,
    close: TokenKind,
    mut p: impl Parser<T>,
) -> Result<Vec<T>> {
    let mut items = Vec::new();
    if s.peek().kind == close {
        return Ok(items);
    }

    items.push(p(s)?);
    while eat_token(s, TokenKind::Comma) {
        items.push(p(s)?);
    }
    Ok(items)
}
