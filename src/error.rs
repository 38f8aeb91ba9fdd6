//! Error types for wsdispatch.

use std::path::PathBuf;

use thiserror::Error;

use crate::script::ScriptError;

/// Main error type for all dispatch operations.
///
/// Build-time problems with individual handler files never surface here;
/// they are recorded as [`Warning`](crate::registry::Warning)s instead.
/// A `DispatchError` is always fatal to exactly one session (or, for
/// [`Scan`](DispatchError::Scan), to construction itself).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the requested resource.
    #[error("No handler for resource {0}")]
    NoHandler(String),

    /// A handler hook failed.
    ///
    /// The display form is the hook's own message, unwrapped, so
    /// application-level failures stay diagnosable.
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// The handler root directory could not be scanned at all.
    #[error("failed to scan handler root {path}: {source}")]
    Scan {
        /// Root directory that failed to scan.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using DispatchError.
pub type Result<T> = std::result::Result<T, DispatchError>;
