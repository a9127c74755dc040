use std::iter::Peekable;
use std::str::CharIndices;

use crate::expression::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    True,
    False,

    LParen,
    RParen,
    Comma,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,

    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,

    Question,
    Colon,

    Eof,
}

struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn eat_if(&mut self, want: char) -> bool {
        if self.chars.peek().map(|&(_, c)| c) == Some(want) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut end = self.src.len();
        while let Some(&(i, c)) = self.chars.peek() {
            if !pred(c) {
                end = i;
                break;
            }
            self.chars.next();
        }
        end
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, ExprError> {
        let mut end = self.eat_while(|c| c.is_ascii_digit() || c == '.');
        if let Some(&(_, 'e' | 'E')) = self.chars.peek() {
            self.chars.next();
            if let Some(&(_, '+' | '-')) = self.chars.peek() {
                self.chars.next();
            }
            let digits_at = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.src.len());
            end = self.eat_while(|c| c.is_ascii_digit());
            if end == digits_at {
                return Err(ExprError::new(
                    digits_at,
                    "invalid number exponent (expected digits)",
                ));
            }
        }
        let text = &self.src[start..end];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| ExprError::new(start, format!("invalid number '{text}'")))
    }

    fn next_token(&mut self) -> Result<Token, ExprError> {
        self.eat_while(char::is_whitespace);
        let Some((offset, c)) = self.chars.next() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                offset: self.src.len(),
            });
        };

        let kind = match c {
            '0'..='9' | '.' => self.number(offset)?,
            c if c.is_ascii_alphabetic() || c == '_' => {
                let end = self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
                match &self.src[offset..end] {
                    "true" => TokenKind::True,
                    "false" => TokenKind::False,
                    ident => TokenKind::Ident(ident.to_owned()),
                }
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            '!' if self.eat_if('=') => TokenKind::Ne,
            '!' => TokenKind::Bang,
            '<' if self.eat_if('=') => TokenKind::Le,
            '<' => TokenKind::Lt,
            '>' if self.eat_if('=') => TokenKind::Ge,
            '>' => TokenKind::Gt,
            '=' if self.eat_if('=') => TokenKind::EqEq,
            '&' if self.eat_if('&') => TokenKind::AndAnd,
            '|' if self.eat_if('|') => TokenKind::OrOr,
            other => {
                return Err(ExprError::new(
                    offset,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        Ok(Token { kind, offset })
    }
}

pub(crate) fn lex(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut lexer = Lexer::new(input);
    let mut out = Vec::new();
    loop {
        let tok = lexer.next_token()?;
        let done = tok.kind == TokenKind::Eof;
        out.push(tok);
        if done {
            return Ok(out);
        }
    }
}
