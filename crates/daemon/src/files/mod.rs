//! File services confined to a single root directory.
//!
//! This module provides:
//! - Path resolution that proves every client path stays under the root
//! - Directory listing filtered to directories and HTML files
//! - Directory creation, batch move/delete and rename
//! - Size-capped HTML preview with an injected content policy
//!
//! # Security
//!
//! Every filesystem call takes a [`ResolvedPath`], which can only be built
//! by [`PathResolver::resolve`]. Resolution normalizes `.` and `..`
//! lexically, compares against the root component-wise, and by default
//! canonicalizes existing paths so symlinks cannot lead outside the root.

pub mod browser;
pub mod error;
pub mod mutations;
pub mod preview;
pub mod resolver;

pub use browser::{DirectoryBrowser, DirectoryEntry};
pub use error::FileError;
pub use mutations::FileMutator;
pub use preview::HtmlPreviewer;
pub use resolver::{PathResolver, ResolvedPath};
