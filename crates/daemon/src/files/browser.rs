//! Directory browsing filtered to directories and HTML files.
//!
//! This module lists the immediate children of a resolved directory. Files
//! that are not HTML are never surfaced, even when present on disk.

use std::fs;
use std::sync::Arc;
use std::time::SystemTime;

use protocol::Entry;
use tracing::debug;

use super::error::FileError;
use super::resolver::{join_relative, PathResolver, ResolvedPath};

/// File name suffix of previewable files, compared case-insensitively.
pub const HTML_EXTENSION: &str = ".html";

/// Whether `name` ends in `.html`, ignoring case.
pub fn is_html(name: &str) -> bool {
    name.to_lowercase().ends_with(HTML_EXTENSION)
}

/// A directory entry with metadata.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Path relative to the root.
    pub relative_path: String,
    /// Whether this is a directory (symlinks are followed).
    pub is_dir: bool,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modified timestamp.
    pub modified: SystemTime,
}

impl DirectoryEntry {
    /// Convert to the wire entry.
    pub fn to_protocol(&self) -> Entry {
        // Whole seconds, truncated toward zero on both sides of the epoch.
        let modified = match self.modified.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(since) => since.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        };

        Entry::new(
            self.name.clone(),
            self.relative_path.clone(),
            self.is_dir,
            self.size,
            modified,
        )
    }
}

/// Directory browser for resolved paths.
#[derive(Debug, Clone)]
pub struct DirectoryBrowser {
    resolver: Arc<PathResolver>,
}

impl DirectoryBrowser {
    pub fn new(resolver: Arc<PathResolver>) -> Self {
        Self { resolver }
    }

    /// List the visible children of `path`, sorted by name.
    ///
    /// A regular file lists as empty. Children whose metadata cannot be
    /// read (for example dangling symlinks) are skipped, as are children
    /// the resolver refuses, such as symlinks leading outside the root.
    pub fn list(&self, path: &ResolvedPath) -> Result<Vec<DirectoryEntry>, FileError> {
        let metadata = fs::metadata(path.absolute())?;
        if !metadata.is_dir() {
            debug!(path = %path.relative(), "Listing a file, returning no entries");
            return Ok(Vec::new());
        }

        let mut results = Vec::new();

        for entry_result in fs::read_dir(path.absolute())? {
            let entry = match entry_result {
                Ok(e) => e,
                Err(_) => continue,
            };

            let name = entry.file_name().to_string_lossy().to_string();
            let relative_path = join_relative(path.relative(), &name);

            let child = match self.resolver.resolve(&relative_path) {
                Ok(child) => child,
                Err(_) => {
                    debug!(path = %relative_path, "Skipping entry outside root");
                    continue;
                }
            };

            let metadata = match fs::metadata(child.absolute()) {
                Ok(m) => m,
                Err(_) => continue,
            };

            let is_dir = metadata.is_dir();
            if !is_dir && !is_html(&name) {
                continue;
            }

            results.push(DirectoryEntry {
                relative_path,
                name,
                is_dir,
                size: if is_dir { 0 } else { metadata.len() },
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }

        results.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(path = %path.relative(), count = results.len(), "Listed directory");
        Ok(results)
    }
}
