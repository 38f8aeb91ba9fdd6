//! Tree-walking evaluator for handler scripts.
//!
//! Two execution contexts exist: top-level statements run once at load time
//! with no session attached, and hook bodies run against one session with
//! `resource`, `origin` and `protocol` bound and `send`/`recv` wired to the
//! session channel.

use std::collections::HashMap;
use std::fmt;

use super::parser::{BinOp, Expr, Stmt};
use super::ScriptError;
use crate::session::Session;

/// Runtime value of a script expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    None,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::None => f.write_str("none"),
        }
    }
}

/// Result of executing a statement block.
enum Flow {
    Normal,
    Break,
}

/// One run of script code against an optional session.
pub struct Interp<'a> {
    session: Option<&'a mut dyn Session>,
    vars: HashMap<String, Value>,
}

impl<'a> Interp<'a> {
    /// Context for load-time execution of top-level statements.
    pub fn top_level() -> Self {
        Self {
            session: None,
            vars: HashMap::new(),
        }
    }

    /// Context for running a hook against `session`.
    ///
    /// `globals` are the script's top-level `let` bindings; the session's
    /// identity fields shadow globals of the same name.
    pub fn for_session(session: &'a mut dyn Session, mut globals: HashMap<String, Value>) -> Self {
        globals.insert(
            "resource".to_string(),
            Value::Str(session.resource().to_string()),
        );
        globals.insert(
            "origin".to_string(),
            Value::Str(session.origin().to_string()),
        );
        let protocol = match session.protocol() {
            Some(p) => Value::Str(p.to_string()),
            None => Value::None,
        };
        globals.insert("protocol".to_string(), protocol);
        Self {
            session: Some(session),
            vars: globals,
        }
    }

    /// Bind a name in the current context.
    pub fn define(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    /// Execute a hook body to completion.
    pub fn run(&mut self, body: &[Stmt]) -> Result<(), ScriptError> {
        match self.exec_block(body)? {
            Flow::Normal => Ok(()),
            Flow::Break => Err(ScriptError::Runtime("break outside loop".to_string())),
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow, ScriptError> {
        for stmt in stmts {
            if let Flow::Break = self.exec(stmt)? {
                return Ok(Flow::Break);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow, ScriptError> {
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.eval(value)?;
                self.vars.insert(name.clone(), value);
                Ok(Flow::Normal)
            }
            Stmt::Send(expr) => {
                let value = self.eval(expr)?;
                match self.session.as_mut() {
                    Some(session) => session.send(&value.to_string())?,
                    None => {
                        return Err(ScriptError::Runtime(
                            "send is only available inside a session hook".to_string(),
                        ));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Fail(expr) => {
                let value = self.eval(expr)?;
                Err(ScriptError::Failure(value.to_string()))
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                let cond = match self.eval(cond)? {
                    Value::Bool(b) => b,
                    other => {
                        return Err(ScriptError::Runtime(format!(
                            "if condition must be a boolean, got {other}"
                        )));
                    }
                };
                if cond {
                    self.exec_block(then)
                } else if let Some(otherwise) = otherwise {
                    self.exec_block(otherwise)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Loop(body) => {
                loop {
                    if let Flow::Break = self.exec_block(body)? {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Break => Ok(Flow::Break),
        }
    }

    /// Evaluate one expression in the current context.
    pub fn eval(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::Int(value) => Ok(Value::Int(*value)),
            Expr::Str(value) => Ok(Value::Str(value.clone())),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::None => Ok(Value::None),
            Expr::Ident(name) => self
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| ScriptError::Runtime(format!("undefined name {name}"))),
            Expr::Recv => match self.session.as_mut() {
                Some(session) => Ok(match session.recv()? {
                    Some(message) => Value::Str(message),
                    None => Value::None,
                }),
                None => Err(ScriptError::Runtime(
                    "recv is only available inside a session hook".to_string(),
                )),
            },
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                apply(*op, lhs, rhs)
            }
        }
    }
}

fn apply(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, ScriptError> {
    match op {
        BinOp::Eq => Ok(Value::Bool(lhs == rhs)),
        BinOp::Ne => Ok(Value::Bool(lhs != rhs)),
        // `+` concatenates unless both sides are integers.
        BinOp::Add => match (&lhs, &rhs) {
            (Value::Int(a), Value::Int(b)) => a
                .checked_add(*b)
                .map(Value::Int)
                .ok_or_else(|| ScriptError::Runtime("integer overflow".to_string())),
            _ => Ok(Value::Str(format!("{lhs}{rhs}"))),
        },
        BinOp::Sub | BinOp::Mul | BinOp::Div => {
            let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) else {
                return Err(ScriptError::Runtime(format!(
                    "{} needs integer operands, got {lhs} and {rhs}",
                    symbol(op)
                )));
            };
            let result = match op {
                BinOp::Sub => a.checked_sub(*b),
                BinOp::Mul => a.checked_mul(*b),
                BinOp::Div => {
                    if *b == 0 {
                        return Err(ScriptError::Runtime("division by zero".to_string()));
                    }
                    a.checked_div(*b)
                }
                _ => unreachable!(),
            };
            result
                .map(Value::Int)
                .ok_or_else(|| ScriptError::Runtime("integer overflow".to_string()))
        }
    }
}

fn symbol(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Eq => "==",
        BinOp::Ne => "!=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;
    use crate::session::MemorySession;

    fn run_transfer(src: &str, session: &mut MemorySession) -> Result<(), ScriptError> {
        Script::load(src)?.call("transfer_data", session)
    }

    #[test]
    fn test_send_session_fields() {
        let mut session = MemorySession::new("/chat")
            .with_origin("http://example.com")
            .with_protocol("p1");
        run_transfer(
            "fn transfer_data { send \"called for \" + resource + \", \" + protocol }",
            &mut session,
        )
        .unwrap();
        assert_eq!(session.written(), "called for /chat, p1");
    }

    #[test]
    fn test_absent_protocol_renders_none() {
        let mut session = MemorySession::new("/chat");
        run_transfer("fn transfer_data { send \"proto: \" + protocol }", &mut session).unwrap();
        assert_eq!(session.written(), "proto: none");
    }

    #[test]
    fn test_arithmetic() {
        let mut session = MemorySession::new("/m");
        run_transfer(
            "fn transfer_data { send \"\" + (1 + 2 * 3 - 10 / 2) }",
            &mut session,
        )
        .unwrap();
        assert_eq!(session.written(), "2");
    }

    #[test]
    fn test_division_by_zero() {
        let mut session = MemorySession::new("/m");
        let err = run_transfer("fn transfer_data { send 1 / 0 }", &mut session).unwrap_err();
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_non_integer_arithmetic_is_rejected() {
        let mut session = MemorySession::new("/m");
        let err = run_transfer("fn transfer_data { send \"a\" * 2 }", &mut session).unwrap_err();
        assert!(err.to_string().contains("integer operands"));
    }

    #[test]
    fn test_equality_across_types() {
        let mut session = MemorySession::new("/m");
        run_transfer(
            "fn transfer_data {\n\
             \x20   if none == none { send \"n\" }\n\
             \x20   if 1 == \"1\" { send \"bad\" } else { send \"t\" }\n\
             \x20   if \"a\" != \"b\" { send \"s\" }\n\
             }",
            &mut session,
        )
        .unwrap();
        assert_eq!(session.written(), "nts");
    }

    #[test]
    fn test_if_condition_must_be_boolean() {
        let mut session = MemorySession::new("/m");
        let err = run_transfer("fn transfer_data { if 1 { send \"x\" } }", &mut session)
            .unwrap_err();
        assert!(err.to_string().contains("must be a boolean"));
    }

    #[test]
    fn test_undefined_name() {
        let mut session = MemorySession::new("/m");
        let err = run_transfer("fn transfer_data { send nonsense }", &mut session).unwrap_err();
        assert!(err.to_string().contains("undefined name nonsense"));
    }

    #[test]
    fn test_echo_loop() {
        let mut session = MemorySession::new("/echo");
        session.push_incoming("hello");
        session.push_incoming("world");
        run_transfer(
            "fn transfer_data {\n\
             \x20   loop {\n\
             \x20       let m = recv\n\
             \x20       if m == none { break }\n\
             \x20       send m + \"!\"\n\
             \x20   }\n\
             }",
            &mut session,
        )
        .unwrap();
        assert_eq!(session.sent(), ["hello!", "world!"]);
    }

    #[test]
    fn test_fail_message_is_verbatim() {
        let mut session = MemorySession::new("/m");
        let err = run_transfer(
            "fn transfer_data { fail \"Intentional error for \" + resource }",
            &mut session,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Intentional error for /m");
    }

    #[test]
    fn test_break_outside_loop() {
        let mut session = MemorySession::new("/m");
        let err = run_transfer("fn transfer_data { break }", &mut session).unwrap_err();
        assert!(err.to_string().contains("break outside loop"));
    }

    #[test]
    fn test_top_level_bindings_visible_in_hooks() {
        let mut session = MemorySession::new("/m");
        run_transfer(
            "let greeting = \"hi \"\nfn transfer_data { send greeting + resource }",
            &mut session,
        )
        .unwrap();
        assert_eq!(session.written(), "hi /m");
    }

    #[test]
    fn test_hook_locals_do_not_leak_between_calls() {
        let script = Script::load(
            "fn transfer_data {\n\
             \x20   let x = resource\n\
             \x20   send x\n\
             }",
        )
        .unwrap();
        let mut first = MemorySession::new("/a");
        script.call("transfer_data", &mut first).unwrap();
        let mut second = MemorySession::new("/b");
        script.call("transfer_data", &mut second).unwrap();
        assert_eq!(first.written(), "/a");
        assert_eq!(second.written(), "/b");
    }
}
