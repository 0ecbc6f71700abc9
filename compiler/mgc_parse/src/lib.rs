// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The mgc parser uses recursive descent to turn an input string into an mg
//! abstract syntax tree. Errors are fatal: the first lexical or syntactic
//! problem is reported and parsing stops, matching the compiler's
//! no-recovery contract.

mod expr;
mod item;
mod keyword;
mod lex;
mod prim;
mod scan;
mod stmt;
#[cfg(test)]
mod tests;
mod ty;

use lex::TokenKind;
use miette::Diagnostic;
use mgc_ast::ast::Namespace;
use mgc_data_structures::span::Span;
use scan::Scanner;
use std::result;
use thiserror::Error;

#[derive(Clone, Debug, Diagnostic, Error, PartialEq)]
#[error(transparent)]
#[diagnostic(transparent)]
pub struct Error(ErrorKind);

impl Error {
    #[must_use]
    pub fn with_offset(self, offset: u32) -> Self {
        Self(self.0.with_offset(offset))
    }
}

#[derive(Clone, Debug, Diagnostic, Error, PartialEq)]
enum ErrorKind {
    #[error("unknown character `{0}`")]
    #[diagnostic(code("Mgc.Parse.UnknownChar"))]
    UnknownChar(char, #[label] Span),
    #[error("unterminated string literal")]
    #[diagnostic(code("Mgc.Parse.UnterminatedString"))]
    UnterminatedString(#[label] Span),
    #[error("unterminated block comment")]
    #[diagnostic(code("Mgc.Parse.UnterminatedComment"))]
    UnterminatedComment(#[label] Span),
    #[error("invalid {0} literal")]
    #[diagnostic(code("Mgc.Parse.Literal"))]
    Lit(&'static str, #[label] Span),
    #[error("unknown escape sequence: `{0}`")]
    #[diagnostic(code("Mgc.Parse.Escape"))]
    Escape(char, #[label] Span),
    #[error("expected {0}, found {1}")]
    #[diagnostic(code("Mgc.Parse.Token"))]
    Token(TokenKind, TokenKind, #[label] Span),
    #[error("expected {0}, found {1}")]
    #[diagnostic(code("Mgc.Parse.Rule"))]
    Rule(&'static str, TokenKind, #[label] Span),
}

impl ErrorKind {
    fn with_offset(self, offset: u32) -> Self {
        match self {
            Self::UnknownChar(ch, span) => Self::UnknownChar(ch, span + offset),
            Self::UnterminatedString(span) => Self::UnterminatedString(span + offset),
            Self::UnterminatedComment(span) => Self::UnterminatedComment(span + offset),
            Self::Lit(name, span) => Self::Lit(name, span + offset),
            Self::Escape(ch, span) => Self::Escape(ch, span + offset),
            Self::Token(expected, actual, span) => Self::Token(expected, actual, span + offset),
            Self::Rule(name, token, span) => Self::Rule(name, token, span + offset),
        }
    }
}

type Result<T> = result::Result<T, Error>;

trait Parser<T>: FnMut(&mut Scanner) -> Result<T> {}

impl<T, F: FnMut(&mut Scanner) -> Result<T>> Parser<T> for F {}

/// Parses a whole source file as a namespace body.
pub fn namespace(input: &str) -> Result<Namespace> {
    let mut scanner = Scanner::new(input)?;
    item::parse_file(&mut scanner)
}

/// Parses a single expression, for tests and tooling.
pub fn expr(input: &str) -> Result<mgc_ast::ast::Expr> {
    let mut scanner = Scanner::new(input)?;
    let expr = expr::expr(&mut scanner)?;
    prim::token(&mut scanner, TokenKind::Eof)?;
    Ok(expr)
}
