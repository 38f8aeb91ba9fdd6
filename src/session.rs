//! Session boundary consumed by handler code.
//!
//! The dispatch layer never owns the wire protocol. A [`Session`] exposes
//! the routing fields of one upgraded connection plus a whole-message
//! channel the transfer hook may read and write. Framing, HTTP parsing and
//! TLS all live below this trait.

use std::collections::VecDeque;
use std::io;

/// One upgraded connection, as seen by the dispatcher and handler code.
///
/// Identity fields (`resource`, `origin`, `protocol`) are read-only: the
/// dispatcher only reads them for routing and handshake checks, and never
/// mutates them.
pub trait Session {
    /// Resource path requested by the client, e.g. `/chat`.
    fn resource(&self) -> &str;

    /// Origin the client connected from.
    fn origin(&self) -> &str;

    /// Sub-protocol requested by the client, if any.
    fn protocol(&self) -> Option<&str>;

    /// Write one outgoing text message.
    fn send(&mut self, message: &str) -> io::Result<()>;

    /// Read the next incoming text message; `None` once the peer is done.
    fn recv(&mut self) -> io::Result<Option<String>>;
}

/// In-memory [`Session`] for tests and demos.
///
/// Incoming messages are queued up front; everything the handler sends is
/// captured and can be inspected afterwards.
#[derive(Debug, Default)]
pub struct MemorySession {
    resource: String,
    origin: String,
    protocol: Option<String>,
    incoming: VecDeque<String>,
    outgoing: Vec<String>,
}

impl MemorySession {
    /// Create a session for `resource` with no origin, protocol or input.
    pub fn new(resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            ..Self::default()
        }
    }

    /// Set the origin.
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    /// Set the sub-protocol.
    pub fn with_protocol(mut self, protocol: &str) -> Self {
        self.protocol = Some(protocol.to_string());
        self
    }

    /// Queue an incoming message for the handler to `recv`.
    pub fn push_incoming(&mut self, message: &str) {
        self.incoming.push_back(message.to_string());
    }

    /// Messages the handler sent, in order.
    pub fn sent(&self) -> &[String] {
        &self.outgoing
    }

    /// All sent messages concatenated, for compact assertions.
    pub fn written(&self) -> String {
        self.outgoing.concat()
    }
}

impl Session for MemorySession {
    fn resource(&self) -> &str {
        &self.resource
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    fn send(&mut self, message: &str) -> io::Result<()> {
        self.outgoing.push(message.to_string());
        Ok(())
    }

    fn recv(&mut self) -> io::Result<Option<String>> {
        Ok(self.incoming.pop_front())
    }
}
