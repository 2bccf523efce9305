//! Root-confined path resolution.
//!
//! Every client path is joined onto the root and normalized lexically, then
//! checked component-wise against the root. Only a [`ResolvedPath`] may be
//! handed to a filesystem primitive.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::error::FileError;

/// An absolute path proven to lie within the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    absolute: PathBuf,
    relative: String,
}

impl ResolvedPath {
    /// Absolute filesystem path.
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    /// Normalized, slash-separated path relative to the root (`""` for the root).
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Whether this is the root itself.
    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }

    /// Final path component, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        Some(
            self.relative
                .rsplit_once('/')
                .map(|(_, name)| name)
                .unwrap_or(&self.relative),
        )
    }

    /// Relative path of the parent directory, or `None` for the root.
    pub fn parent_relative(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        Some(
            self.relative
                .rsplit_once('/')
                .map(|(parent, _)| parent)
                .unwrap_or(""),
        )
    }
}

/// Join two client-style relative paths with a single slash.
pub fn join_relative(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Resolves client-supplied relative paths against a fixed root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Canonical root directory.
    root: PathBuf,
    /// Whether existing paths must also canonicalize under the root.
    confine_symlinks: bool,
}

impl PathResolver {
    /// Create a resolver for `root`.
    ///
    /// The root is canonicalized once here and must be an existing directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, FileError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root)?;
        if !canonical.is_dir() {
            return Err(FileError::invalid(format!(
                "root is not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root: canonical,
            confine_symlinks: true,
        })
    }

    /// Set whether symlinks are confined to the root.
    ///
    /// When enabled (the default), a path that exists on disk must also
    /// canonicalize to a location under the root.
    pub fn confine_symlinks(mut self, confine: bool) -> Self {
        self.confine_symlinks = confine;
        self
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a client path.
    ///
    /// Empty input resolves to the root. Existence is not checked.
    pub fn resolve(&self, relative: &str) -> Result<ResolvedPath, FileError> {
        let mut normalized = self.root.clone();

        for component in Path::new(relative).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    normalized.pop();
                }
                Component::Normal(part) => normalized.push(part),
                Component::RootDir | Component::Prefix(_) => {
                    warn!(path = %relative, "Rejected absolute path");
                    return Err(FileError::AccessDenied);
                }
            }
        }

        // Path::starts_with compares whole components, so `/srv/root-evil`
        // never passes for `/srv/root`.
        let Ok(stripped) = normalized.strip_prefix(&self.root) else {
            warn!(path = %relative, "Path escapes root");
            return Err(FileError::AccessDenied);
        };

        let relative_normalized = stripped
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if self.confine_symlinks {
            self.check_canonical(&normalized)?;
        }

        debug!(path = %relative, resolved = %normalized.display(), "Resolved path");
        Ok(ResolvedPath {
            absolute: normalized,
            relative: relative_normalized,
        })
    }

    /// Resolve `name` inside the directory `parent`.
    pub fn join(&self, parent: &ResolvedPath, name: &str) -> Result<ResolvedPath, FileError> {
        self.resolve(&join_relative(parent.relative(), name))
    }

    /// Resolve the sibling of `path` called `name`.
    ///
    /// The root has no sibling inside the root.
    pub fn sibling(&self, path: &ResolvedPath, name: &str) -> Result<ResolvedPath, FileError> {
        let parent = path.parent_relative().ok_or(FileError::AccessDenied)?;
        self.resolve(&join_relative(parent, name))
    }

    /// Canonicalize the deepest existing ancestor of `path` and require it
    /// to stay under the root.
    fn check_canonical(&self, path: &Path) -> Result<(), FileError> {
        let mut probe = path;
        loop {
            if let Ok(canonical) = fs::canonicalize(probe) {
                if canonical.starts_with(&self.root) {
                    return Ok(());
                }
                warn!(
                    path = %path.display(),
                    target = %canonical.display(),
                    "Symlink points outside root"
                );
                return Err(FileError::AccessDenied);
            }
            match probe.parent() {
                Some(parent) if parent.starts_with(&self.root) => probe = parent,
                _ => return Ok(()),
            }
        }
    }
}
