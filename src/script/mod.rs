//! Handler scripting language - loading code objects from text.
//!
//! Handler behavior arrives as external source text, not statically linked
//! code. [`Script::load`] turns that text into an immutable code unit:
//! tokenize ([`token`]), parse ([`parser`]), then execute the top-level
//! statements exactly once ([`eval`]). Any failure along the way fails the
//! load; loading never invokes the hooks themselves, it only makes them
//! retrievable.
//!
//! A script's top level consists of `fn` definitions and `let` bindings.
//! The hooks the dispatch layer cares about are [`SHAKE_HANDS_HOOK`]
//! (optional) and [`TRANSFER_DATA_HOOK`] (required); whether a script
//! actually satisfies that contract is the registry's concern, not the
//! loader's, so that missing or malformed hooks become warnings rather
//! than load failures.
//!
//! ```
//! use wsdispatch::script::Script;
//! use wsdispatch::session::MemorySession;
//!
//! let script = Script::load(
//!     "fn transfer_data { send \"hello from \" + resource }",
//! ).unwrap();
//!
//! let mut session = MemorySession::new("/greet");
//! script.call("transfer_data", &mut session).unwrap();
//! assert_eq!(session.written(), "hello from /greet");
//! ```

mod eval;
mod parser;
mod token;

use std::collections::HashMap;
use std::io;

use thiserror::Error;

use crate::session::Session;
use eval::Interp;
pub use eval::Value;
use parser::{Item, Stmt};

/// Name of the optional opening-handshake hook.
pub const SHAKE_HANDS_HOOK: &str = "shake_hands";

/// Name of the required data-transfer hook.
pub const TRANSFER_DATA_HOOK: &str = "transfer_data";

/// Errors from loading or running handler scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The handler file was empty.
    #[error("empty handler script")]
    Empty,

    /// The script failed to tokenize or parse.
    #[error("line {line}: {message}")]
    Parse { line: u32, message: String },

    /// Handler code misbehaved at run time.
    #[error("{0}")]
    Runtime(String),

    /// Handler code failed on purpose via `fail`; the message is verbatim.
    #[error("{0}")]
    Failure(String),

    /// The session channel failed underneath handler code.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A named top-level binding.
#[derive(Debug, Clone)]
enum Binding {
    /// A `fn` item; invocable as a hook.
    Function(Vec<Stmt>),
    /// A `let` item; present but not callable.
    Value(Value),
}

/// A loaded handler script: an immutable set of named bindings.
///
/// Created once from file text, then only read. Sharing a `Script` across
/// threads is safe; each [`call`](Self::call) runs in its own environment.
#[derive(Debug, Clone)]
pub struct Script {
    bindings: HashMap<String, Binding>,
}

impl Script {
    /// Parse `text` and execute its top-level statements.
    ///
    /// Fails on empty text, on lex/parse errors, and on any error raised
    /// while evaluating top-level `let` bindings. Top-level code runs with
    /// no session, so `send`, `recv` and the session identity names are
    /// load-time errors there.
    pub fn load(text: &str) -> Result<Self, ScriptError> {
        if text.trim().is_empty() {
            return Err(ScriptError::Empty);
        }
        let items = parser::parse(token::tokenize(text)?)?;

        let mut interp = Interp::top_level();
        let mut bindings = HashMap::new();
        for item in items {
            match item {
                Item::Let { name, value } => {
                    let value = interp.eval(&value)?;
                    interp.define(&name, value.clone());
                    bindings.insert(name, Binding::Value(value));
                }
                Item::Fn { name, body } => {
                    bindings.insert(name, Binding::Function(body));
                }
            }
        }
        Ok(Self { bindings })
    }

    /// Whether the script defines `name` at all, callable or not.
    pub fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Whether `name` is bound to a function.
    pub fn is_callable(&self, name: &str) -> bool {
        matches!(self.bindings.get(name), Some(Binding::Function(_)))
    }

    /// Invoke the function bound to `name` against `session`.
    ///
    /// The body runs with the session's `resource`/`origin`/`protocol`
    /// bound, the script's top-level `let` values visible, and `send`/
    /// `recv` wired to the session channel.
    pub fn call(&self, name: &str, session: &mut dyn Session) -> Result<(), ScriptError> {
        let body = match self.bindings.get(name) {
            Some(Binding::Function(body)) => body,
            Some(Binding::Value(_)) => {
                return Err(ScriptError::Runtime(format!("{name} is not callable")));
            }
            None => {
                return Err(ScriptError::Runtime(format!("{name} is not defined")));
            }
        };

        let globals: HashMap<String, Value> = self
            .bindings
            .iter()
            .filter_map(|(name, binding)| match binding {
                Binding::Value(value) => Some((name.clone(), value.clone())),
                Binding::Function(_) => None,
            })
            .collect();

        Interp::for_session(session, globals).run(body)
    }
}
