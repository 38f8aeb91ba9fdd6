//! Recursive-descent parser for handler scripts.
//!
//! Grammar (statement-keyword led, no separators):
//!
//! ```text
//! script   := item*
//! item     := "fn" IDENT block
//!           | "let" IDENT "=" expr
//! block    := "{" stmt* "}"
//! stmt     := "let" IDENT "=" expr
//!           | "send" expr
//!           | "fail" expr
//!           | "if" expr block ("else" block)?
//!           | "loop" block
//!           | "break"
//! expr     := additive (("==" | "!=") additive)?
//! additive := term (("+" | "-") term)*
//! term     := factor (("*" | "/") factor)*
//! factor   := INT | STRING | "true" | "false" | "none" | "recv"
//!           | IDENT | "(" expr ")"
//! ```

use super::token::{Token, TokenKind};
use super::ScriptError;

/// Top-level item of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A hook (or helper) definition.
    Fn { name: String, body: Vec<Stmt> },
    /// A plain value binding, evaluated once at load time.
    Let { name: String, value: Expr },
}

/// Statement inside a function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Let {
        name: String,
        value: Expr,
    },
    Send(Expr),
    Fail(Expr),
    If {
        cond: Expr,
        then: Vec<Stmt>,
        otherwise: Option<Vec<Stmt>>,
    },
    Loop(Vec<Stmt>),
    Break,
}

/// Expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Str(String),
    Bool(bool),
    None,
    Recv,
    Ident(String),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
}

/// Parse a token stream into top-level items.
pub fn parse(tokens: Vec<Token>) -> Result<Vec<Item>, ScriptError> {
    let mut parser = Parser { tokens, pos: 0 };
    let mut items = Vec::new();
    while parser.peek().is_some() {
        items.push(parser.item()?);
    }
    Ok(items)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Line of the current token, or of the last one at end of input.
    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map(|t| t.line)
            .unwrap_or(1)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::Parse {
            line: self.line(),
            message: message.into(),
        }
    }

    fn error_at(&self, token: Option<&Token>, message: impl Into<String>) -> ScriptError {
        ScriptError::Parse {
            line: token.map(|t| t.line).unwrap_or_else(|| self.line()),
            message: message.into(),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ScriptError> {
        match self.next() {
            Some(token) if token.kind == kind => Ok(()),
            other => Err(self.error_at(other.as_ref(), format!("expected {what}"))),
        }
    }

    fn expect_ident(&mut self) -> Result<String, ScriptError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok(name),
            other => Err(self.error_at(other.as_ref(), "expected a name")),
        }
    }

    fn item(&mut self) -> Result<Item, ScriptError> {
        match self.next() {
            Some(Token {
                kind: TokenKind::Fn,
                ..
            }) => {
                let name = self.expect_ident()?;
                let body = self.block()?;
                Ok(Item::Fn { name, body })
            }
            Some(Token {
                kind: TokenKind::Let,
                ..
            }) => {
                let name = self.expect_ident()?;
                self.expect(TokenKind::Assign, "`=`")?;
                let value = self.expr()?;
                Ok(Item::Let { name, value })
            }
            other => Err(self.error_at(other.as_ref(), "expected `fn` or `let` at top level")),
        }
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        loop {
            match self.peek() {
                Some(TokenKind::RBrace) => {
                    self.next();
                    return Ok(stmts);
                }
                Some(_) => stmts.push(self.stmt()?),
                None => return Err(self.error("unexpected end of script, expected `}`")),
            }
        }
    }

    fn stmt(&mut self) -> Result<Stmt, ScriptError> {
        match self.peek() {
            Some(TokenKind::Let) => {
                self.next();
                let name = self.expect_ident()?;
                self.expect(TokenKind::Assign, "`=`")?;
                let value = self.expr()?;
                Ok(Stmt::Let { name, value })
            }
            Some(TokenKind::Send) => {
                self.next();
                Ok(Stmt::Send(self.expr()?))
            }
            Some(TokenKind::Fail) => {
                self.next();
                Ok(Stmt::Fail(self.expr()?))
            }
            Some(TokenKind::If) => {
                self.next();
                let cond = self.expr()?;
                let then = self.block()?;
                let otherwise = if self.peek() == Some(&TokenKind::Else) {
                    self.next();
                    Some(self.block()?)
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then,
                    otherwise,
                })
            }
            Some(TokenKind::Loop) => {
                self.next();
                Ok(Stmt::Loop(self.block()?))
            }
            Some(TokenKind::Break) => {
                self.next();
                Ok(Stmt::Break)
            }
            _ => Err(self.error("expected a statement")),
        }
    }

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Some(TokenKind::EqEq) => BinOp::Eq,
            Some(TokenKind::NotEq) => BinOp::Ne,
            _ => return Ok(lhs),
        };
        self.next();
        let rhs = self.additive()?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn additive(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.next();
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, ScriptError> {
        let mut lhs = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.next();
            let rhs = self.factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn factor(&mut self) -> Result<Expr, ScriptError> {
        let token = self.next();
        match token.as_ref().map(|t| &t.kind) {
            Some(TokenKind::Int(value)) => Ok(Expr::Int(*value)),
            Some(TokenKind::Str(value)) => Ok(Expr::Str(value.clone())),
            Some(TokenKind::True) => Ok(Expr::Bool(true)),
            Some(TokenKind::False) => Ok(Expr::Bool(false)),
            Some(TokenKind::NoneLit) => Ok(Expr::None),
            Some(TokenKind::Recv) => Ok(Expr::Recv),
            Some(TokenKind::Ident(name)) => Ok(Expr::Ident(name.clone())),
            Some(TokenKind::LParen) => {
                let expr = self.expr()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Ok(expr)
            }
            _ => Err(self.error_at(token.as_ref(), "expected an expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::token::tokenize;
    use super::*;

    fn parse_text(text: &str) -> Result<Vec<Item>, ScriptError> {
        parse(tokenize(text)?)
    }

    #[test]
    fn test_parse_fn_and_let() {
        let items = parse_text("let greeting = \"hi\"\nfn transfer_data { send greeting }").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            Item::Let {
                name: "greeting".to_string(),
                value: Expr::Str("hi".to_string()),
            }
        );
        assert_eq!(
            items[1],
            Item::Fn {
                name: "transfer_data".to_string(),
                body: vec![Stmt::Send(Expr::Ident("greeting".to_string()))],
            }
        );
    }

    #[test]
    fn test_operator_precedence() {
        let items = parse_text("let x = 1 + 2 * 3").unwrap();
        let Item::Let { value, .. } = &items[0] else {
            panic!("expected let");
        };
        assert_eq!(
            *value,
            Expr::Binary {
                op: BinOp::Add,
                lhs: Box::new(Expr::Int(1)),
                rhs: Box::new(Expr::Binary {
                    op: BinOp::Mul,
                    lhs: Box::new(Expr::Int(2)),
                    rhs: Box::new(Expr::Int(3)),
                }),
            }
        );
    }

    #[test]
    fn test_parens_override_precedence() {
        let items = parse_text("let x = (1 + 2) * 3").unwrap();
        let Item::Let { value, .. } = &items[0] else {
            panic!("expected let");
        };
        let Expr::Binary { op, .. } = value else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinOp::Mul);
    }

    #[test]
    fn test_if_else_and_loop() {
        let items = parse_text(
            "fn transfer_data {\n\
             \x20   loop {\n\
             \x20       let m = recv\n\
             \x20       if m == none { break } else { send m }\n\
             \x20   }\n\
             }",
        )
        .unwrap();
        let Item::Fn { body, .. } = &items[0] else {
            panic!("expected fn");
        };
        let Stmt::Loop(inner) = &body[0] else {
            panic!("expected loop");
        };
        assert_eq!(inner.len(), 2);
        assert!(matches!(
            inner[1],
            Stmt::If {
                otherwise: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_bare_fn_is_rejected() {
        let err = parse_text("fn").unwrap_err();
        assert!(err.to_string().contains("expected a name"));
    }

    #[test]
    fn test_missing_brace_is_rejected() {
        let err = parse_text("fn transfer_data { send \"x\"").unwrap_err();
        assert!(err.to_string().contains("expected `}`"));
    }

    #[test]
    fn test_let_without_assign_is_rejected() {
        let err = parse_text("let x 1").unwrap_err();
        assert!(err.to_string().contains("expected `=`"));
    }

    #[test]
    fn test_statement_at_top_level_is_rejected() {
        let err = parse_text("send \"x\"").unwrap_err();
        assert!(err.to_string().contains("expected `fn` or `let`"));
    }

    #[test]
    fn test_error_carries_line_number() {
        let err = parse_text("fn transfer_data {\n    send +\n}").unwrap_err();
        assert!(err.to_string().starts_with("line 2:"), "{err}");
    }
}
