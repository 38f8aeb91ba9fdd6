//! Handler discovery and registration.
//!
//! Walks a root directory for `*_wsh.ws` files, loads each through the
//! script loader, validates the hook contract, and builds the immutable
//! resource-to-handler mapping that dispatch routes on. The scan is a fold
//! over candidate files accumulating `(mapping, warnings)`: one broken
//! handler file never aborts construction, it becomes a [`Warning`].

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{DispatchError, Result};
use crate::resource::{ResourceResolver, HANDLER_FILE_SUFFIX};
use crate::script::{Script, ScriptError, SHAKE_HANDS_HOOK, TRANSFER_DATA_HOOK};
use crate::session::Session;

/// One loaded, validated handler bound to a resource.
#[derive(Debug, Clone)]
pub struct HandlerSource {
    path: PathBuf,
    script: Script,
}

impl HandlerSource {
    /// Source file this handler was loaded from. Diagnostic only; routing
    /// never looks at it after load.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the handler defines an opening-handshake hook.
    pub fn has_shake_hands(&self) -> bool {
        self.script.is_callable(SHAKE_HANDS_HOOK)
    }

    /// Run the opening-handshake hook; a no-op when the handler has none.
    pub fn shake_hands(&self, session: &mut dyn Session) -> std::result::Result<(), ScriptError> {
        if !self.has_shake_hands() {
            return Ok(());
        }
        self.script.call(SHAKE_HANDS_HOOK, session)
    }

    /// Run the data-transfer hook for the life of the session's data phase.
    pub fn transfer_data(&self, session: &mut dyn Session) -> std::result::Result<(), ScriptError> {
        self.script.call(TRANSFER_DATA_HOOK, session)
    }
}

/// A per-file problem recorded during the scan.
///
/// Displays as `"<path>: <reason>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    path: PathBuf,
    reason: String,
}

impl Warning {
    fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// File the warning is about.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Immutable mapping from resource names to handlers.
///
/// Built once; every later lookup is a pure read, so a shared reference can
/// serve any number of concurrent sessions without locking.
#[derive(Debug)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerSource>,
    warnings: Vec<Warning>,
}

impl HandlerRegistry {
    /// Scan `root` recursively and register every valid handler file.
    ///
    /// Traversal is in lexical order, so registration is deterministic.
    /// Individual unreadable, unparseable or contract-violating files
    /// become warnings and contribute no mapping entry; only an unreadable
    /// root fails the build.
    ///
    /// Contract validation per file:
    /// - `transfer_data` missing or not a function: warning, excluded.
    /// - `shake_hands` missing: registered, handshake is a no-op.
    /// - `shake_hands` bound but not a function: warning, excluded.
    pub fn build(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let resolver = ResourceResolver::new(&root.to_string_lossy());
        let mut handlers: HashMap<String, HandlerSource> = HashMap::new();
        let mut warnings: Vec<Warning> = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf);
                    if err.depth() == 0 {
                        let source = err
                            .into_io_error()
                            .unwrap_or_else(|| io::Error::other("directory walk aborted"));
                        return Err(DispatchError::Scan {
                            path: root.to_path_buf(),
                            source,
                        });
                    }
                    let reason = format!("skipped: {err}");
                    record(
                        &mut warnings,
                        path.unwrap_or_else(|| root.to_path_buf()),
                        reason,
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if !entry
                .file_name()
                .to_string_lossy()
                .ends_with(HANDLER_FILE_SUFFIX)
            {
                continue;
            }
            let path = entry.into_path();

            // A suffix match with nothing in front of it is not a handler.
            let Some(resource) = resolver.resolve(&path.to_string_lossy()) else {
                continue;
            };

            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    record(&mut warnings, path, format!("failed to read: {err}"));
                    continue;
                }
            };
            let script = match Script::load(&text) {
                Ok(script) => script,
                Err(err) => {
                    record(&mut warnings, path, err.to_string());
                    continue;
                }
            };

            if !script.has(TRANSFER_DATA_HOOK) {
                record(
                    &mut warnings,
                    path,
                    format!("{TRANSFER_DATA_HOOK} is not defined."),
                );
                continue;
            }
            if !script.is_callable(TRANSFER_DATA_HOOK) {
                record(
                    &mut warnings,
                    path,
                    format!("{TRANSFER_DATA_HOOK} is not callable."),
                );
                continue;
            }
            if script.has(SHAKE_HANDS_HOOK) && !script.is_callable(SHAKE_HANDS_HOOK) {
                record(
                    &mut warnings,
                    path,
                    format!("{SHAKE_HANDS_HOOK} is not callable."),
                );
                continue;
            }

            // Lexical traversal makes this deterministic: the first file
            // registered for a resource keeps it.
            if let Some(existing) = handlers.get(&resource) {
                let reason = format!(
                    "duplicate handler for resource {resource} (already provided by {})",
                    existing.path().display()
                );
                record(&mut warnings, path, reason);
                continue;
            }

            tracing::debug!(resource = %resource, path = %path.display(), "registered handler");
            handlers.insert(resource, HandlerSource { path, script });
        }

        Ok(Self { handlers, warnings })
    }

    /// Look up the handler registered for `resource`.
    pub fn get(&self, resource: &str) -> Option<&HandlerSource> {
        self.handlers.get(resource)
    }

    /// Warnings recorded during the scan, in traversal order.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Registered resource names, in no particular order.
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn record(warnings: &mut Vec<Warning>, path: PathBuf, reason: String) {
    let warning = Warning::new(path, reason);
    tracing::warn!("{warning}");
    warnings.push(warning);
}
