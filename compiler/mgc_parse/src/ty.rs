// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{
    keyword::Keyword,
    lex::{Delim, TokenKind},
    prim,
    scan::Scanner,
    Error, ErrorKind, Result,
};
use mgc_ast::ast::{Ty, TyKind};

/// Parses a type: a primitive keyword or an object chain, followed by any
/// number of `[N]` array suffixes.
pub(super) fn ty(s: &mut Scanner) -> Result<Ty> {
    let lo = s.peek().span.lo;
    let kind = match s.peek().kind {
        TokenKind::Keyword(Keyword::Int) => prim_ty(s, TyKind::Int),
        TokenKind::Keyword(Keyword::Bool) => prim_ty(s, TyKind::Bool),
        TokenKind::Keyword(Keyword::Float) => prim_ty(s, TyKind::Float),
        TokenKind::Keyword(Keyword::String) => prim_ty(s, TyKind::String),
        TokenKind::Keyword(Keyword::Void) => prim_ty(s, TyKind::Void),
        TokenKind::Keyword(Keyword::Sprite) => prim_ty(s, TyKind::Sprite),
        TokenKind::Keyword(Keyword::Sound) => prim_ty(s, TyKind::Sound),
        TokenKind::Ident => TyKind::Object(prim::path(s)?),
        _ => {
            let peek = s.peek();
            return Err(Error(ErrorKind::Rule("type", peek.kind, peek.span)));
        }
    };

    let mut ty = Ty {
        span: s.span(lo),
        kind,
    };
    while s.peek().kind == TokenKind::Open(Delim::Bracket) {
        s.advance();
        let len = array_len(s)?;
        prim::token(s, TokenKind::Close(Delim::Bracket))?;
        ty = Ty {
            span: s.span(lo),
            kind: TyKind::Array(Box::new(ty), len),
        };
    }
    Ok(ty)
}

fn prim_ty(s: &mut Scanner, kind: TyKind) -> TyKind {
    s.advance();
    kind
}

fn array_len(s: &mut Scanner) -> Result<u64> {
    let peek = s.peek();
    if peek.kind == TokenKind::Int {
        let len = s
            .read()
            .parse()
            .map_err(|_| Error(ErrorKind::Lit("int", peek.span)))?;
        s.advance();
        Ok(len)
    } else {
        Err(Error(ErrorKind::Rule(
            "array length",
            peek.kind,
            peek.span,
        )))
    }
}
