// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{keyword::Keyword, Error, ErrorKind};
use mgc_data_structures::span::Span;
use std::{
    fmt::{self, Display, Formatter},
    iter::Peekable,
    str::CharIndices,
};

/// A delimiter token.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Delim {
    /// `{` or `}`
    Brace,
    /// `[` or `]`
    Bracket,
    /// `(` or `)`
    Paren,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum TokenKind {
    Ident,
    Keyword(Keyword),
    Int,
    Float,
    Str,
    Open(Delim),
    Close(Delim),
    Semi,
    Comma,
    Colon,
    ColonColon,
    Dot,
    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Star,
    StarEq,
    Slash,
    SlashEq,
    Percent,
    Eq,
    EqEq,
    Ne,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    AmpAmp,
    BarBar,
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = match self {
            TokenKind::Ident => "identifier",
            TokenKind::Keyword(keyword) => return write!(f, "keyword `{keyword}`"),
            TokenKind::Int => "integer literal",
            TokenKind::Float => "float literal",
            TokenKind::Str => "string literal",
            TokenKind::Open(Delim::Brace) => "`{`",
            TokenKind::Open(Delim::Bracket) => "`[`",
            TokenKind::Open(Delim::Paren) => "`(`",
            TokenKind::Close(Delim::Brace) => "`}`",
            TokenKind::Close(Delim::Bracket) => "`]`",
            TokenKind::Close(Delim::Paren) => "`)`",
            TokenKind::Semi => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::ColonColon => "`::`",
            TokenKind::Dot => "`.`",
            TokenKind::Plus => "`+`",
            TokenKind::PlusPlus => "`++`",
            TokenKind::PlusEq => "`+=`",
            TokenKind::Minus => "`-`",
            TokenKind::MinusMinus => "`--`",
            TokenKind::MinusEq => "`-=`",
            TokenKind::Star => "`*`",
            TokenKind::StarEq => "`*=`",
            TokenKind::Slash => "`/`",
            TokenKind::SlashEq => "`/=`",
            TokenKind::Percent => "`%`",
            TokenKind::Eq => "`=`",
            TokenKind::EqEq => "`==`",
            TokenKind::Ne => "`!=`",
            TokenKind::Bang => "`!`",
            TokenKind::Lt => "`<`",
            TokenKind::Le => "`<=`",
            TokenKind::Gt => "`>`",
            TokenKind::Ge => "`>=`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::BarBar => "`||`",
            TokenKind::Eof => "EOF",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

/// Lexes the entire input. Stops at the first lexical error.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    loop {
        skip_trivia(input, &mut chars)?;
        let Some(&(lo, c)) = chars.peek() else {
            break;
        };
        chars.next();
        let lo = offset(lo);

        let kind = match c {
            '{' => TokenKind::Open(Delim::Brace),
            '}' => TokenKind::Close(Delim::Brace),
            '[' => TokenKind::Open(Delim::Bracket),
            ']' => TokenKind::Close(Delim::Bracket),
            '(' => TokenKind::Open(Delim::Paren),
            ')' => TokenKind::Close(Delim::Paren),
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '%' => TokenKind::Percent,
            ':' => {
                if eat(&mut chars, ':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '+' => {
                if eat(&mut chars, '+') {
                    TokenKind::PlusPlus
                } else if eat(&mut chars, '=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if eat(&mut chars, '-') {
                    TokenKind::MinusMinus
                } else if eat(&mut chars, '=') {
                    TokenKind::MinusEq
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if eat(&mut chars, '=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if eat(&mut chars, '=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '=' => {
                if eat(&mut chars, '=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if eat(&mut chars, '=') {
                    TokenKind::Ne
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if eat(&mut chars, '=') {
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if eat(&mut chars, '=') {
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if eat(&mut chars, '&') {
                    TokenKind::AmpAmp
                } else {
                    return Err(Error(ErrorKind::UnknownChar(c, char_span(lo, c))));
                }
            }
            '|' => {
                if eat(&mut chars, '|') {
                    TokenKind::BarBar
                } else {
                    return Err(Error(ErrorKind::UnknownChar(c, char_span(lo, c))));
                }
            }
            '"' => lex_string(input, &mut chars, lo)?,
            _ if c.is_ascii_digit() => lex_number(&mut chars),
            _ if c == '_' || c.is_alphabetic() => lex_ident(input, &mut chars, lo),
            _ => return Err(Error(ErrorKind::UnknownChar(c, char_span(lo, c)))),
        };

        let hi = chars.peek().map_or(input.len(), |&(i, _)| i);
        tokens.push(Token {
            kind,
            span: Span {
                lo,
                hi: offset(hi),
            },
        });
    }

    let end = offset(input.len());
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span { lo: end, hi: end },
    });
    Ok(tokens)
}

fn skip_trivia(input: &str, chars: &mut Peekable<CharIndices>) -> Result<(), Error> {
    loop {
        match chars.peek() {
            Some(&(_, c)) if c.is_whitespace() => {
                chars.next();
            }
            Some(&(lo, '/')) => {
                let mut ahead = chars.clone();
                ahead.next();
                match ahead.peek() {
                    Some(&(_, '/')) => {
                        while let Some(&(_, c)) = chars.peek() {
                            if c == '\n' {
                                break;
                            }
                            chars.next();
                        }
                    }
                    Some(&(_, '*')) => {
                        chars.next();
                        chars.next();
                        let mut closed = false;
                        while let Some((_, c)) = chars.next() {
                            if c == '*' && eat(chars, '/') {
                                closed = true;
                                break;
                            }
                        }
                        if !closed {
                            return Err(Error(ErrorKind::UnterminatedComment(Span {
                                lo: offset(lo),
                                hi: offset(input.len()),
                            })));
                        }
                    }
                    _ => return Ok(()),
                }
            }
            _ => return Ok(()),
        }
    }
}

fn lex_string(
    input: &str,
    chars: &mut Peekable<CharIndices>,
    lo: u32,
) -> Result<TokenKind, Error> {
    loop {
        match chars.next() {
            None => {
                return Err(Error(ErrorKind::UnterminatedString(Span {
                    lo,
                    hi: offset(input.len()),
                })))
            }
            Some((_, '"')) => return Ok(TokenKind::Str),
            Some((_, '\\')) => {
                // The escape is validated when the literal is converted.
                chars.next();
            }
            Some(_) => {}
        }
    }
}

fn lex_number(chars: &mut Peekable<CharIndices>) -> TokenKind {
    while matches!(chars.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
        chars.next();
    }

    let mut ahead = chars.clone();
    if matches!(ahead.next(), Some((_, '.')))
        && matches!(ahead.peek(), Some(&(_, c)) if c.is_ascii_digit())
    {
        chars.next();
        while matches!(chars.peek(), Some(&(_, c)) if c.is_ascii_digit()) {
            chars.next();
        }
        TokenKind::Float
    } else {
        TokenKind::Int
    }
}

fn lex_ident(input: &str, chars: &mut Peekable<CharIndices>, lo: u32) -> TokenKind {
    while matches!(chars.peek(), Some(&(_, c)) if c == '_' || c.is_alphanumeric()) {
        chars.next();
    }

    let hi = chars.peek().map_or(input.len(), |&(i, _)| i);
    match input[lo as usize..hi].parse() {
        Ok(keyword) => TokenKind::Keyword(keyword),
        Err(()) => TokenKind::Ident,
    }
}

fn eat(chars: &mut Peekable<CharIndices>, want: char) -> bool {
    if matches!(chars.peek(), Some(&(_, c)) if c == want) {
        chars.next();
        true
    } else {
        false
    }
}

fn char_span(lo: u32, c: char) -> Span {
    Span {
        lo,
        hi: lo + u32::try_from(c.len_utf8()).expect("char length should fit into u32"),
    }
}

fn offset(value: usize) -> u32 {
    value.try_into().expect("offset should fit into u32")
}
