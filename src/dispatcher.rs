//! Public dispatch façade.
//!
//! A [`Dispatcher`] is built once against a handler root directory and then
//! shared by reference across however many session-handling execution units
//! the surrounding server runs. Per session it performs an O(1) registry
//! lookup and delegates to the resolved handler's hooks; no scanning
//! happens per session.

use std::path::Path;

use crate::error::{DispatchError, Result};
use crate::registry::{HandlerRegistry, HandlerSource};
use crate::session::Session;

/// Routes sessions to handlers loaded from a directory tree.
///
/// Construction walks the whole tree and loads every handler file, so it is
/// a one-time cost paid before the server accepts sessions. After that the
/// registry is immutable and every lookup is a pure read, safe under
/// concurrent use from multiple threads. There is no hidden process-wide
/// instance: construct one and pass it by reference.
///
/// Per session the flow is `shake_hands` then `transfer_data`; a
/// [`DispatchError`] from either is terminal for that session and affects
/// no other.
#[derive(Debug)]
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    /// Build a dispatcher over the handler tree rooted at `root`.
    ///
    /// Broken handler files become warnings, queryable via
    /// [`source_warnings`](Self::source_warnings), never errors; only an
    /// unreadable root fails construction.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            registry: HandlerRegistry::build(root)?,
        })
    }

    /// Wrap an already-built registry.
    pub fn from_registry(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Registry this dispatcher routes through.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Problems recorded while scanning the handler tree, one
    /// `"path: reason"` line per broken file. Lets operators detect broken
    /// handlers without waiting for session failures.
    pub fn source_warnings(&self) -> Vec<String> {
        self.registry
            .warnings()
            .iter()
            .map(|warning| warning.to_string())
            .collect()
    }

    /// Run the opening-handshake phase for `session`.
    ///
    /// Resolves the session's resource and invokes the handler's handshake
    /// hook if it defines one. The hook rejects the handshake by failing -
    /// that is how application policy such as origin allow-listing is
    /// expressed - and its message reaches the caller unchanged.
    pub fn shake_hands(&self, session: &mut dyn Session) -> Result<()> {
        let handler = self.resolve(session.resource())?;
        tracing::debug!(resource = session.resource(), "shaking hands");
        handler.shake_hands(session)?;
        Ok(())
    }

    /// Run the data-transfer phase for `session`.
    ///
    /// Blocks the calling execution unit for as long as the handler's
    /// transfer hook runs; the hook owns the session's channel for the
    /// whole data phase. The dispatcher imposes no timeout of its own.
    pub fn transfer_data(&self, session: &mut dyn Session) -> Result<()> {
        let handler = self.resolve(session.resource())?;
        tracing::debug!(resource = session.resource(), "transferring data");
        handler.transfer_data(session)?;
        Ok(())
    }

    fn resolve(&self, resource: &str) -> Result<&HandlerSource> {
        self.registry
            .get(resource)
            .ok_or_else(|| DispatchError::NoHandler(resource.to_string()))
    }
}
