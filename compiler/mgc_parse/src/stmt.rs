// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{
    expr,
    keyword::Keyword,
    lex::{Delim, TokenKind},
    prim,
    scan::Scanner,
    ty, Result,
};
use mgc_ast::ast::{Block, Stmt, StmtKind};

pub(super) fn block(s: &mut Scanner) -> Result<Block> {
    let lo = s.peek().span.lo;
    prim::token(s, TokenKind::Open(Delim::Brace))?;
    let mut stmts = Vec::new();
    while s.peek().kind != TokenKind::Close(Delim::Brace) {
        stmts.push(stmt(s)?);
    }
    prim::token(s, TokenKind::Close(Delim::Brace))?;
    Ok(Block {
        span: s.span(lo),
        stmts,
    })
}

pub(super) fn stmt(s: &mut Scanner) -> Result<Stmt> {
    let lo = s.peek().span.lo;
    let kind = match s.peek().kind {
        TokenKind::Open(Delim::Brace) => StmtKind::Block(block(s)?),
        TokenKind::Keyword(Keyword::Return) => {
            s.advance();
            let value = if s.peek().kind == TokenKind::Semi {
                None
            } else {
                Some(expr::expr(s)?)
            };
            prim::token(s, TokenKind::Semi)?;
            StmtKind::Return(value)
        }
        TokenKind::Keyword(Keyword::Break) => {
            s.advance();
            prim::token(s, TokenKind::Semi)?;
            StmtKind::Break
        }
        TokenKind::Keyword(Keyword::If) => return if_stmt(s),
        TokenKind::Keyword(Keyword::While) => {
            s.advance();
            prim::token(s, TokenKind::Open(Delim::Paren))?;
            let cond = expr::expr(s)?;
            prim::token(s, TokenKind::Close(Delim::Paren))?;
            let body = body(s)?;
            StmtKind::While(cond, body)
        }
        TokenKind::Keyword(Keyword::For) => {
            s.advance();
            prim::token(s, TokenKind::Open(Delim::Paren))?;
            let init = if prim::eat_token(s, TokenKind::Semi) {
                None
            } else {
                Some(Box::new(simple_stmt(s)?))
            };
            let cond = if s.peek().kind == TokenKind::Semi {
                None
            } else {
                Some(expr::expr(s)?)
            };
            prim::token(s, TokenKind::Semi)?;
            let step = if s.peek().kind == TokenKind::Close(Delim::Paren) {
                None
            } else {
                Some(expr::expr(s)?)
            };
            prim::token(s, TokenKind::Close(Delim::Paren))?;
            let body = body(s)?;
            StmtKind::For(init, cond, step, body)
        }
        TokenKind::Keyword(Keyword::Foreach) => {
            s.advance();
            prim::token(s, TokenKind::Open(Delim::Paren))?;
            let path = prim::path(s)?;
            let name = prim::ident(s)?;
            prim::token(s, TokenKind::Close(Delim::Paren))?;
            let body = body(s)?;
            StmtKind::Foreach(path, name, body)
        }
        _ => return simple_stmt(s),
    };

    Ok(Stmt {
        span: s.span(lo),
        kind: Box::new(kind),
    })
}

fn if_stmt(s: &mut Scanner) -> Result<Stmt> {
    let lo = s.peek().span.lo;
    prim::keyword(s, Keyword::If)?;
    prim::token(s, TokenKind::Open(Delim::Paren))?;
    let cond = expr::expr(s)?;
    prim::token(s, TokenKind::Close(Delim::Paren))?;
    let then = body(s)?;
    let otherwise = if prim::eat_keyword(s, Keyword::Else) {
        Some(Box::new(stmt(s)?))
    } else {
        None
    };

    Ok(Stmt {
        span: s.span(lo),
        kind: Box::new(StmtKind::If(cond, then, otherwise)),
    })
}

/// A declaration or an expression statement, terminated with a semicolon.
/// Used as both an ordinary statement and a `for` initializer.
fn simple_stmt(s: &mut Scanner) -> Result<Stmt> {
    let lo = s.peek().span.lo;
    if let Some(kind) = prim::opt(s, decl) {
        return Ok(Stmt {
            span: s.span(lo),
            kind: Box::new(kind),
        });
    }

    let expr = expr::expr(s)?;
    prim::token(s, TokenKind::Semi)?;
    Ok(Stmt {
        span: s.span(lo),
        kind: Box::new(StmtKind::Expr(expr)),
    })
}

/// Tries to parse `T name;` or `T name = expr;`. Fails without effect (the
/// caller rolls back) when the statement is actually an expression.
fn decl(s: &mut Scanner) -> Result<StmtKind> {
    let ty = ty::ty(s)?;
    let name = prim::ident(s)?;
    let init = if prim::eat_token(s, TokenKind::Eq) {
        Some(expr::expr(s)?)
    } else {
        None
    };
    prim::token(s, TokenKind::Semi)?;
    Ok(StmtKind::Decl(ty, name, init))
}

/// A loop or conditional body: a block, or a single statement wrapped in
/// one.
fn body(s: &mut Scanner) -> Result<Block> {
    if s.peek().kind == TokenKind::Open(Delim::Brace) {
        block(s)
    } else {
        let stmt = stmt(s)?;
        Ok(Block {
            span: stmt.span,
            stmts: vec![stmt],
        })
    }
}
