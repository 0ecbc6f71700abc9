// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{
    keyword::Keyword,
    lex::{Delim, TokenKind},
    prim,
    scan::Scanner,
    Error, ErrorKind, Result,
};
use mgc_ast::ast::{BinOp, Crement, Expr, ExprKind, Fixity, UnOp};
use std::rc::Rc;

pub(super) fn expr(s: &mut Scanner) -> Result<Expr> {
    assign(s)
}

fn assign(s: &mut Scanner) -> Result<Expr> {
    let lo = s.peek().span.lo;
    let lhs = or_expr(s)?;
    let op = match s.peek().kind {
        TokenKind::Eq => None,
        TokenKind::PlusEq => Some(BinOp::Add),
        TokenKind::MinusEq => Some(BinOp::Sub),
        TokenKind::StarEq => Some(BinOp::Mul),
        TokenKind::SlashEq => Some(BinOp::Div),
        _ => return Ok(lhs),
    };

    s.advance();
    let rhs = assign(s)?;
    let kind = match op {
        None => ExprKind::Assign(Box::new(lhs), Box::new(rhs)),
        Some(op) => ExprKind::AssignOp(op, Box::new(lhs), Box::new(rhs)),
    };
    Ok(Expr {
        span: s.span(lo),
        kind: Box::new(kind),
    })
}

fn or_expr(s: &mut Scanner) -> Result<Expr> {
    left_assoc(s, and_expr, |kind| match kind {
        TokenKind::BarBar => Some(BinOp::Or),
        _ => None,
    })
}

fn and_expr(s: &mut Scanner) -> Result<Expr> {
    left_assoc(s, equality, |kind| match kind {
        TokenKind::AmpAmp => Some(BinOp::And),
        _ => None,
    })
}

fn equality(s: &mut Scanner) -> Result<Expr> {
    left_assoc(s, relational, |kind| match kind {
        TokenKind::EqEq => Some(BinOp::Eq),
        TokenKind::Ne => Some(BinOp::Neq),
        _ => None,
    })
}

fn relational(s: &mut Scanner) -> Result<Expr> {
    left_assoc(s, additive, |kind| match kind {
        TokenKind::Lt => Some(BinOp::Lt),
        TokenKind::Le => Some(BinOp::Le),
        TokenKind::Gt => Some(BinOp::Gt),
        TokenKind::Ge => Some(BinOp::Ge),
        _ => None,
    })
}

fn additive(s: &mut Scanner) -> Result<Expr> {
    left_assoc(s, multiplicative, |kind| match kind {
        TokenKind::Plus => Some(BinOp::Add),
        TokenKind::Minus => Some(BinOp::Sub),
        _ => None,
    })
}

fn multiplicative(s: &mut Scanner) -> Result<Expr> {
    left_assoc(s, unary, |kind| match kind {
        TokenKind::Star => Some(BinOp::Mul),
        TokenKind::Slash => Some(BinOp::Div),
        TokenKind::Percent => Some(BinOp::Mod),
        _ => None,
    })
}

fn left_assoc(
    s: &mut Scanner,
    mut next: impl FnMut(&mut Scanner) -> Result<Expr>,
    op: impl Fn(TokenKind) -> Option<BinOp>,
) -> Result<Expr> {
    let lo = s.peek().span.lo;
    let mut lhs = next(s)?;
    while let Some(op) = op(s.peek().kind) {
        s.advance();
        let rhs = next(s)?;
        lhs = Expr {
            span: s.span(lo),
            kind: Box::new(ExprKind::BinOp(op, Box::new(lhs), Box::new(rhs))),
        };
    }
    Ok(lhs)
}

fn unary(s: &mut Scanner) -> Result<Expr> {
    let lo = s.peek().span.lo;
    let kind = match s.peek().kind {
        TokenKind::Minus => {
            s.advance();
            ExprKind::UnOp(UnOp::Neg, Box::new(unary(s)?))
        }
        TokenKind::Bang => {
            s.advance();
            ExprKind::UnOp(UnOp::Not, Box::new(unary(s)?))
        }
        TokenKind::PlusPlus => {
            s.advance();
            ExprKind::Crement(Crement::Incr, Fixity::Pre, Box::new(unary(s)?))
        }
        TokenKind::MinusMinus => {
            s.advance();
            ExprKind::Crement(Crement::Decr, Fixity::Pre, Box::new(unary(s)?))
        }
        TokenKind::Keyword(Keyword::Destroy) => {
            s.advance();
            ExprKind::Destroy(Box::new(unary(s)?))
        }
        TokenKind::Keyword(Keyword::Delete) => {
            s.advance();
            ExprKind::Delete(Box::new(unary(s)?))
        }
        _ => return postfix(s),
    };

    Ok(Expr {
        span: s.span(lo),
        kind: Box::new(kind),
    })
}

fn postfix(s: &mut Scanner) -> Result<Expr> {
    let lo = s.peek().span.lo;
    let mut expr = primary(s)?;
    loop {
        let kind = match s.peek().kind {
            TokenKind::Dot => {
                s.advance();
                let name = prim::ident(s)?;
                if s.peek().kind == TokenKind::Open(Delim::Paren) {
                    let args = call_args(s)?;
                    ExprKind::MethodCall(Box::new(expr), name, args)
                } else {
                    ExprKind::Member(Box::new(expr), name)
                }
            }
            TokenKind::Open(Delim::Bracket) => {
                s.advance();
                let index = self::expr(s)?;
                prim::token(s, TokenKind::Close(Delim::Bracket))?;
                ExprKind::Subscript(Box::new(expr), Box::new(index))
            }
            TokenKind::PlusPlus => {
                s.advance();
                ExprKind::Crement(Crement::Incr, Fixity::Post, Box::new(expr))
            }
            TokenKind::MinusMinus => {
                s.advance();
                ExprKind::Crement(Crement::Decr, Fixity::Post, Box::new(expr))
            }
            _ => break,
        };
        expr = Expr {
            span: s.span(lo),
            kind: Box::new(kind),
        };
    }
    Ok(expr)
}

fn primary(s: &mut Scanner) -> Result<Expr> {
    let peek = s.peek();
    let lo = peek.span.lo;
    let kind = match peek.kind {
        TokenKind::Int => {
            let value = s
                .read()
                .parse()
                .map_err(|_| Error(ErrorKind::Lit("int", peek.span)))?;
            s.advance();
            ExprKind::Int(value)
        }
        TokenKind::Float => {
            let value = s
                .read()
                .parse()
                .map_err(|_| Error(ErrorKind::Lit("float", peek.span)))?;
            s.advance();
            ExprKind::Float(value)
        }
        TokenKind::Str => {
            let value = unescape(s.read(), peek.span)?;
            s.advance();
            ExprKind::Str(value)
        }
        TokenKind::Keyword(Keyword::True) => {
            s.advance();
            ExprKind::Bool(true)
        }
        TokenKind::Keyword(Keyword::False) => {
            s.advance();
            ExprKind::Bool(false)
        }
        TokenKind::Keyword(Keyword::None) => {
            s.advance();
            ExprKind::None
        }
        TokenKind::Open(Delim::Paren) => {
            s.advance();
            let inner = expr(s)?;
            prim::token(s, TokenKind::Close(Delim::Paren))?;
            return Ok(inner);
        }
        TokenKind::Open(Delim::Bracket) => {
            s.advance();
            let items = prim::comma_sep(s, TokenKind::Close(Delim::Bracket), expr)?;
            prim::token(s, TokenKind::Close(Delim::Bracket))?;
            ExprKind::Array(items)
        }
        TokenKind::Keyword(Keyword::Create) => {
            s.advance();
            let path = prim::path(s)?;
            let args = call_args(s)?;
            ExprKind::Create(path, args)
        }
        TokenKind::Ident => {
            let path = prim::path(s)?;
            if s.peek().kind == TokenKind::Open(Delim::Paren) {
                let args = call_args(s)?;
                ExprKind::Call(path, args)
            } else {
                ExprKind::Path(path)
            }
        }
        _ => return Err(Error(ErrorKind::Rule("expression", peek.kind, peek.span))),
    };

    Ok(Expr {
        span: s.span(lo),
        kind: Box::new(kind),
    })
}

fn call_args(s: &mut Scanner) -> Result<Vec<Expr>> {
    prim::token(s, TokenKind::Open(Delim::Paren))?;
    let args = prim::comma_sep(s, TokenKind::Close(Delim::Paren), expr)?;
    prim::token(s, TokenKind::Close(Delim::Paren))?;
    Ok(args)
}

fn unescape(raw: &str, span: mgc_data_structures::span::Span) -> Result<Rc<str>> {
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => return Err(Error(ErrorKind::Escape(other, span))),
                None => return Err(Error(ErrorKind::UnterminatedString(span))),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out.into())
}
