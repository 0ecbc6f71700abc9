// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{
    keyword::Keyword,
    lex::{Delim, TokenKind},
    prim,
    scan::Scanner,
    stmt, ty, Error, ErrorKind, Result,
};
use mgc_ast::ast::{
    Event, Function, GameObject, Global, Ident, Namespace, NamespaceDecl, NamespaceRef, Ty,
    TyKind, Using,
};
use std::rc::Rc;

/// Parses a whole source file as a namespace body.
pub(super) fn parse_file(s: &mut Scanner) -> Result<Namespace> {
    let ns = namespace_body(s)?;
    prim::token(s, TokenKind::Eof)?;
    Ok(ns)
}

fn namespace_body(s: &mut Scanner) -> Result<Namespace> {
    let lo = s.peek().span.lo;
    let mut ns = Namespace::default();
    while !matches!(
        s.peek().kind,
        TokenKind::Eof | TokenKind::Close(Delim::Brace)
    ) {
        item(s, &mut ns)?;
    }
    ns.span = s.span(lo);
    Ok(ns)
}

fn item(s: &mut Scanner, ns: &mut Namespace) -> Result<()> {
    match s.peek().kind {
        TokenKind::Keyword(Keyword::Public | Keyword::Private) => {
            let is_private = s.peek().kind == TokenKind::Keyword(Keyword::Private);
            s.advance();
            match s.peek().kind {
                TokenKind::Keyword(Keyword::Namespace) => {
                    ns.namespaces.push(namespace_decl(s, is_private)?);
                }
                TokenKind::Keyword(Keyword::Using) => ns.usings.push(using(s, is_private)?),
                _ => {
                    let peek = s.peek();
                    return Err(Error(ErrorKind::Rule(
                        "namespace or using declaration",
                        peek.kind,
                        peek.span,
                    )));
                }
            }
        }
        TokenKind::Keyword(Keyword::Namespace) => {
            ns.namespaces.push(namespace_decl(s, false)?);
        }
        TokenKind::Keyword(Keyword::Using) => ns.usings.push(using(s, false)?),
        TokenKind::Keyword(Keyword::Extern) => {
            s.advance();
            let ret = ty::ty(s)?;
            let name = prim::ident(s)?;
            let formals = formals(s)?;
            prim::token(s, TokenKind::Semi)?;
            ns.functions.push(Function {
                span: s.span(ret.span.lo),
                ret,
                name,
                formals,
                body: None,
                gameobj: None,
            });
        }
        TokenKind::Keyword(Keyword::Object) => ns.objects.push(object(s)?),
        _ => {
            let ty = ty::ty(s)?;
            let name = prim::ident(s)?;
            if s.peek().kind == TokenKind::Open(Delim::Paren) {
                let formals = formals(s)?;
                let body = stmt::block(s)?;
                ns.functions.push(Function {
                    span: s.span(ty.span.lo),
                    ret: ty,
                    name,
                    formals,
                    body: Some(body),
                    gameobj: None,
                });
            } else {
                ns.globals.push(global(s, ty, name)?);
            }
        }
    }
    Ok(())
}

fn global(s: &mut Scanner, ty: Ty, name: Ident) -> Result<Global> {
    let init = if prim::eat_token(s, TokenKind::Eq) {
        Some(crate::expr::expr(s)?)
    } else {
        None
    };
    prim::token(s, TokenKind::Semi)?;
    Ok(Global {
        span: s.span(ty.span.lo),
        ty,
        name,
        init,
    })
}

fn namespace_decl(s: &mut Scanner, is_private: bool) -> Result<NamespaceDecl> {
    let lo = s.peek().span.lo;
    prim::keyword(s, Keyword::Namespace)?;
    let name = prim::ident(s)?;
    let kind = if prim::eat_token(s, TokenKind::Eq) {
        if prim::eat_keyword(s, Keyword::Open) {
            let path = string_lit(s)?;
            prim::token(s, TokenKind::Semi)?;
            NamespaceRef::File(path)
        } else {
            let chain = chain(s)?;
            prim::token(s, TokenKind::Semi)?;
            NamespaceRef::Alias(chain)
        }
    } else {
        prim::token(s, TokenKind::Open(Delim::Brace))?;
        let body = namespace_body(s)?;
        prim::token(s, TokenKind::Close(Delim::Brace))?;
        NamespaceRef::Concrete(body)
    };

    Ok(NamespaceDecl {
        span: s.span(lo),
        is_private,
        name,
        kind,
    })
}

fn using(s: &mut Scanner, is_private: bool) -> Result<Using> {
    let lo = s.peek().span.lo;
    prim::keyword(s, Keyword::Using)?;
    let chain = chain(s)?;
    prim::token(s, TokenKind::Semi)?;
    Ok(Using {
        span: s.span(lo),
        is_private,
        chain,
    })
}

fn chain(s: &mut Scanner) -> Result<Vec<Ident>> {
    let mut segments = vec![prim::ident(s)?];
    while prim::eat_token(s, TokenKind::ColonColon) {
        segments.push(prim::ident(s)?);
    }
    Ok(segments)
}

fn object(s: &mut Scanner) -> Result<GameObject> {
    let lo = s.peek().span.lo;
    prim::keyword(s, Keyword::Object)?;
    let name = prim::ident(s)?;
    let parent = if prim::eat_token(s, TokenKind::Colon) {
        Some(prim::path(s)?)
    } else {
        None
    };

    prim::token(s, TokenKind::Open(Delim::Brace))?;
    let mut object = GameObject {
        span: Default::default(),
        name,
        parent,
        members: Vec::new(),
        methods: Vec::new(),
        events: Vec::new(),
    };
    while s.peek().kind != TokenKind::Close(Delim::Brace) {
        object_item(s, &mut object)?;
    }
    prim::token(s, TokenKind::Close(Delim::Brace))?;
    object.span = s.span(lo);
    Ok(object)
}

fn object_item(s: &mut Scanner, object: &mut GameObject) -> Result<()> {
    if s.peek().kind == TokenKind::Keyword(Keyword::Event) {
        let lo = s.peek().span.lo;
        s.advance();
        let event = event_name(s)?;
        let formals = if s.peek().kind == TokenKind::Open(Delim::Paren) {
            formals(s)?
        } else {
            Vec::new()
        };
        let name_span = s.span(lo);
        let body = stmt::block(s)?;
        object.events.push((
            event,
            Function {
                span: s.span(lo),
                ret: Ty {
                    span: name_span,
                    kind: TyKind::Void,
                },
                name: Ident {
                    span: name_span,
                    name: event.name().into(),
                },
                formals,
                body: Some(body),
                gameobj: Some(Rc::clone(&object.name.name)),
            },
        ));
        return Ok(());
    }

    let ty = ty::ty(s)?;
    let name = prim::ident(s)?;
    if s.peek().kind == TokenKind::Open(Delim::Paren) {
        let formals = formals(s)?;
        // An extern-shaped method is accepted here and rejected by the
        // semantic analyzer, which owns the shape errors.
        let body = if s.peek().kind == TokenKind::Semi {
            s.advance();
            None
        } else {
            Some(stmt::block(s)?)
        };
        object.methods.push(Function {
            span: s.span(ty.span.lo),
            ret: ty,
            name,
            formals,
            body,
            gameobj: Some(Rc::clone(&object.name.name)),
        });
    } else {
        prim::token(s, TokenKind::Semi)?;
        object.members.push((ty, name));
    }
    Ok(())
}

fn event_name(s: &mut Scanner) -> Result<Event> {
    let peek = s.peek();
    let event = match peek.kind {
        TokenKind::Keyword(Keyword::Create) => Event::Create,
        TokenKind::Keyword(Keyword::Step) => Event::Step,
        TokenKind::Keyword(Keyword::Draw) => Event::Draw,
        TokenKind::Keyword(Keyword::Destroy) => Event::Destroy,
        _ => return Err(Error(ErrorKind::Rule("event name", peek.kind, peek.span))),
    };
    s.advance();
    Ok(event)
}

fn formals(s: &mut Scanner) -> Result<Vec<(Ty, Ident)>> {
    prim::token(s, TokenKind::Open(Delim::Paren))?;
    let formals = prim::comma_sep(s, TokenKind::Close(Delim::Paren), |s| {
        let ty = ty::ty(s)?;
        let name = prim::ident(s)?;
        Ok((ty, name))
    })?;
    prim::token(s, TokenKind::Close(Delim::Paren))?;
    Ok(formals)
}

fn string_lit(s: &mut Scanner) -> Result<Rc<str>> {
    let peek = s.peek();
    if peek.kind == TokenKind::Str {
        let raw = s.read();
        let value = raw[1..raw.len() - 1].into();
        s.advance();
        Ok(value)
    } else {
        Err(Error(ErrorKind::Rule("string literal", peek.kind, peek.span)))
    }
}
