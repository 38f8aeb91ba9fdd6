//! # wsdispatch
//!
//! Handler dispatch layer for a WebSocket-style protocol server.
//!
//! Given a directory tree of handler scripts (files ending in `_wsh.ws`),
//! this crate resolves each incoming session's resource path to a handler,
//! runs the opening handshake, and hands the session to the handler's
//! data-transfer hook. Malformed or failing handler files are isolated:
//! they become queryable warnings at build time and per-session errors at
//! dispatch time, never crashes of the dispatcher itself.
//!
//! ## Architecture
//!
//! - **Build phase** (once): [`Dispatcher::new`] walks the root directory,
//!   loads every handler script through the [`script`] loader, keys it by
//!   the [`resource`] name derived from its path, and records per-file
//!   problems as warnings instead of failing the scan.
//! - **Session phase** (concurrent): [`Dispatcher::shake_hands`] and
//!   [`Dispatcher::transfer_data`] are O(1) lookups into the immutable
//!   [`registry`] followed by hook invocation. Hooks block the calling
//!   execution unit; the surrounding server owns threading and timeouts.
//!
//! ## Example
//!
//! ```ignore
//! use wsdispatch::{Dispatcher, MemorySession};
//!
//! let dispatcher = Dispatcher::new("/srv/handlers")?;
//! for warning in dispatcher.source_warnings() {
//!     eprintln!("{warning}");
//! }
//!
//! let mut session = MemorySession::new("/echo").with_origin("http://example.com");
//! dispatcher.shake_hands(&mut session)?;
//! dispatcher.transfer_data(&mut session)?;
//! ```

pub mod error;
pub mod registry;
pub mod resource;
pub mod script;
pub mod session;

mod dispatcher;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, Result};
pub use registry::{HandlerRegistry, HandlerSource, Warning};
pub use session::{MemorySession, Session};
