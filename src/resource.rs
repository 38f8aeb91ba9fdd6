//! Resource name resolution.
//!
//! Maps handler file paths to the canonical, `/`-separated resource names
//! sessions route on: `/a/b/sub/chat_wsh.ws` under root `/a/b` becomes
//! `/sub/chat`.
//!
//! Normalization works on path segments, not raw strings, and treats `/`
//! and `\` as equivalent separators on every platform. `std::path` is
//! deliberately not used here: on Unix it would treat `\` as an ordinary
//! name character and break that equivalence.

/// Full file-name suffix of a handler script.
pub const HANDLER_FILE_SUFFIX: &str = "_wsh.ws";

/// A path reduced to its canonical segments.
///
/// `.` segments are dropped, `..` collapses into its parent (or is kept at
/// the front of a relative path), and repeated or trailing separators
/// disappear.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NormalizedPath {
    absolute: bool,
    segments: Vec<String>,
}

fn normalize(path: &str) -> NormalizedPath {
    let absolute = path.starts_with('/') || path.starts_with('\\');
    let mut segments: Vec<String> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| s != "..") {
                    segments.pop();
                } else if !absolute {
                    // A relative path may still point above its start.
                    segments.push("..".to_string());
                }
            }
            _ => segments.push(part.to_string()),
        }
    }
    NormalizedPath { absolute, segments }
}

/// Converts candidate file paths into resource names relative to one root.
///
/// The root is normalized once at construction; [`resolve`](Self::resolve)
/// is a pure function after that.
#[derive(Debug, Clone)]
pub struct ResourceResolver {
    root: NormalizedPath,
}

impl ResourceResolver {
    /// Create a resolver for the given handler root directory.
    pub fn new(root: &str) -> Self {
        Self {
            root: normalize(root),
        }
    }

    /// Convert a candidate file path into its resource name.
    ///
    /// Returns `None` when the path is not a handler under this root: not
    /// contained in the root (segment-wise, so `/a/bc` is not under
    /// `/a/b`), missing the `_wsh.ws` suffix, or nothing left of the file
    /// name once the suffix is stripped. `None` is not an error; it means
    /// "this file is not a handler".
    ///
    /// # Example
    ///
    /// ```
    /// use wsdispatch::resource::ResourceResolver;
    ///
    /// let resolver = ResourceResolver::new("/srv/handlers");
    /// assert_eq!(
    ///     resolver.resolve("/srv/handlers/sub/chat_wsh.ws"),
    ///     Some("/sub/chat".to_string()),
    /// );
    /// assert_eq!(resolver.resolve("/srv/handlers/README.md"), None);
    /// ```
    pub fn resolve(&self, path: &str) -> Option<String> {
        let candidate = normalize(path);
        if candidate.absolute != self.root.absolute {
            return None;
        }
        if candidate.segments.len() <= self.root.segments.len() {
            return None;
        }
        if candidate.segments[..self.root.segments.len()] != self.root.segments[..] {
            return None;
        }

        let rel = &candidate.segments[self.root.segments.len()..];
        let (file, dirs) = rel.split_last()?;
        let stem = file.strip_suffix(HANDLER_FILE_SUFFIX)?;
        if stem.is_empty() {
            return None;
        }

        let mut resource = String::new();
        for dir in dirs {
            resource.push('/');
            resource.push_str(dir);
        }
        resource.push('/');
        resource.push_str(stem);
        Some(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_under_root() {
        let resolver = ResourceResolver::new("/a/b");
        assert_eq!(resolver.resolve("/a/b/h_wsh.ws"), Some("/h".to_string()));
        assert_eq!(
            resolver.resolve("/a/b/c/h_wsh.ws"),
            Some("/c/h".to_string())
        );
        assert_eq!(
            resolver.resolve("/a/b/c/d/h_wsh.ws"),
            Some("/c/d/h".to_string())
        );
    }

    #[test]
    fn test_non_handlers_do_not_match() {
        let resolver = ResourceResolver::new("/a/b");
        // Wrong suffix.
        assert_eq!(resolver.resolve("/a/b/h.ws"), None);
        // Relative candidate against an absolute root.
        assert_eq!(resolver.resolve("a/b/h_wsh.ws"), None);
        // Sibling directory sharing a string prefix.
        assert_eq!(resolver.resolve("/a/bc/h_wsh.ws"), None);
        // Suffix with nothing in front of it.
        assert_eq!(resolver.resolve("/a/b/_wsh.ws"), None);
        // The root itself.
        assert_eq!(resolver.resolve("/a/b"), None);
    }

    #[test]
    fn test_relative_root() {
        let resolver = ResourceResolver::new("a/b");
        assert_eq!(resolver.resolve("a/b/h_wsh.ws"), Some("/h".to_string()));
        assert_eq!(resolver.resolve("/a/b/h_wsh.ws"), None);
    }

    #[test]
    fn test_root_normalization() {
        let resolver = ResourceResolver::new("/a/b///");
        assert_eq!(resolver.resolve("/a/b/h_wsh.ws"), Some("/h".to_string()));
        assert_eq!(
            resolver.resolve("/a/b/../b/h_wsh.ws"),
            Some("/h".to_string())
        );

        let resolver = ResourceResolver::new("/a/../a/b/../b/");
        assert_eq!(resolver.resolve("/a/b/h_wsh.ws"), Some("/h".to_string()));
    }

    #[test]
    fn test_backslash_separators() {
        let resolver = ResourceResolver::new(r"\a\b");
        assert_eq!(resolver.resolve(r"\a\b\h_wsh.ws"), Some("/h".to_string()));
        assert_eq!(resolver.resolve("/a/b/h_wsh.ws"), Some("/h".to_string()));
        assert_eq!(
            resolver.resolve(r"\a\b\sub\h_wsh.ws"),
            Some("/sub/h".to_string())
        );
    }

    #[test]
    fn test_dot_segments_in_candidate() {
        let resolver = ResourceResolver::new("/a/b");
        assert_eq!(
            resolver.resolve("/a/b/./c/../c/h_wsh.ws"),
            Some("/c/h".to_string())
        );
    }

    #[test]
    fn test_relative_parent_segments() {
        let resolver = ResourceResolver::new("../h");
        assert_eq!(resolver.resolve("../h/x_wsh.ws"), Some("/x".to_string()));
        assert_eq!(resolver.resolve("h/x_wsh.ws"), None);
    }
}
