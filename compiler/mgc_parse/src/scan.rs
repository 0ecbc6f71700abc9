// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{
    lex::{self, Token, TokenKind},
    Error,
};
use mgc_data_structures::span::Span;

/// A cursor over the fully lexed token stream. Backtracking is supported
/// through [`Scanner::mark`] and [`Scanner::reset`]; the statement grammar
/// needs it to tell a declaration from an expression.
pub(super) struct Scanner<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub(super) fn new(input: &'a str) -> Result<Self, Error> {
        Ok(Self {
            input,
            tokens: lex::tokenize(input)?,
            pos: 0,
        })
    }

    pub(super) fn peek(&self) -> Token {
        self.tokens[self.pos]
    }

    /// The source text of the current token.
    pub(super) fn read(&self) -> &'a str {
        &self.input[self.peek().span]
    }

    pub(super) fn advance(&mut self) {
        if self.peek().kind != TokenKind::Eof {
            self.pos += 1;
        }
    }

    pub(super) fn mark(&self) -> usize {
        self.pos
    }

    pub(super) fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    /// The span from `lo` to the end of the most recently consumed token.
    pub(super) fn span(&self, lo: u32) -> Span {
        let hi = if self.pos == 0 {
            lo
        } else {
            self.tokens[self.pos - 1].span.hi
        };
        Span { lo, hi }
    }
}
