use crate::expression::ast::{BinaryOp, Expr, UnaryOp};
use crate::expression::error::ExprError;
use crate::expression::lexer::{Token, TokenKind, lex};

/// Parse a keyframe expression. A leading `=` is accepted and ignored.
pub(crate) fn parse_expr(src: &str) -> Result<Expr, ExprError> {
    let src = src.trim();
    let src = src.strip_prefix('=').unwrap_or(src);
    let mut p = Parser {
        tokens: lex(src)?,
        pos: 0,
    };
    let expr = p.parse_cond()?;
    p.expect(&TokenKind::Eof)?;
    Ok(expr)
}

/// Number of binary precedence levels, loosest first.
const LEVELS: usize = 6;

fn binary_op(level: usize, kind: &TokenKind) -> Option<BinaryOp> {
    let op = match (level, kind) {
        (0, TokenKind::OrOr) => BinaryOp::Or,
        (1, TokenKind::AndAnd) => BinaryOp::And,
        (2, TokenKind::EqEq) => BinaryOp::Eq,
        (2, TokenKind::Ne) => BinaryOp::Ne,
        (3, TokenKind::Lt) => BinaryOp::Lt,
        (3, TokenKind::Le) => BinaryOp::Le,
        (3, TokenKind::Gt) => BinaryOp::Gt,
        (3, TokenKind::Ge) => BinaryOp::Ge,
        (4, TokenKind::Plus) => BinaryOp::Add,
        (4, TokenKind::Minus) => BinaryOp::Sub,
        (5, TokenKind::Star) => BinaryOp::Mul,
        (5, TokenKind::Slash) => BinaryOp::Div,
        (5, TokenKind::Percent) => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ExprError> {
        if self.consume(kind) {
            return Ok(());
        }
        Err(ExprError::new(
            self.peek().offset,
            format!("expected {kind:?}, found {:?}", self.peek().kind),
        ))
    }

    fn parse_cond(&mut self) -> Result<Expr, ExprError> {
        let cond = self.parse_level(0)?;
        if !self.consume(&TokenKind::Question) {
            return Ok(cond);
        }
        let then = self.parse_cond()?;
        self.expect(&TokenKind::Colon)?;
        let otherwise = self.parse_cond()?;
        Ok(Expr::Cond {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_level(&mut self, level: usize) -> Result<Expr, ExprError> {
        if level == LEVELS {
            return self.parse_unary();
        }
        let mut e = self.parse_level(level + 1)?;
        while let Some(op) = binary_op(level, &self.peek().kind) {
            self.bump();
            let r = self.parse_level(level + 1)?;
            e = Expr::Binary {
                op,
                left: Box::new(e),
                right: Box::new(r),
            };
        }
        Ok(e)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = if self.consume(&TokenKind::Minus) {
            UnaryOp::Neg
        } else if self.consume(&TokenKind::Bang) {
            UnaryOp::Not
        } else if self.consume(&TokenKind::Plus) {
            return self.parse_unary();
        } else {
            return self.parse_primary();
        };
        Ok(Expr::Unary {
            op,
            expr: Box::new(self.parse_unary()?),
        })
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.consume(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_cond()?);
            if self.consume(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::RParen)?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let t = self.bump();
        match t.kind {
            TokenKind::Number(v) => Ok(Expr::Num(v)),
            TokenKind::True => Ok(Expr::Num(1.0)),
            TokenKind::False => Ok(Expr::Num(0.0)),
            TokenKind::Ident(name) => {
                if self.consume(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    Ok(Expr::Call {
                        func: name,
                        args,
                        offset: t.offset,
                    })
                } else {
                    Ok(Expr::Var {
                        name,
                        offset: t.offset,
                    })
                }
            }
            TokenKind::LParen => {
                let e = self.parse_cond()?;
                self.expect(&TokenKind::RParen)?;
                Ok(e)
            }
            other => Err(ExprError::new(
                t.offset,
                format!("unexpected token {other:?}"),
            )),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/parser.rs"]
mod tests;
