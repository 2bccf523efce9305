//! Directory creation, batch move/delete and rename.
//!
//! Batch operations are best effort: every item is resolved and processed
//! on its own, and one item's failure never aborts or rolls back the rest.
//! Results come back in request order.

use std::fs;
use std::sync::Arc;

use protocol::OperationResult;
use tracing::{info, warn};

use super::error::FileError;
use super::resolver::{PathResolver, ResolvedPath};

/// Characters a rename target may not contain.
pub const RESERVED_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Applies mutations to the tree beneath the resolver's root.
#[derive(Debug, Clone)]
pub struct FileMutator {
    resolver: Arc<PathResolver>,
}

impl FileMutator {
    pub fn new(resolver: Arc<PathResolver>) -> Self {
        Self { resolver }
    }

    /// Create the directory `name` inside `parent`.
    ///
    /// Creation is single level: the parent must exist. An existing target
    /// is never merged or overwritten. Returns the new relative path.
    pub fn create_group(&self, parent: &ResolvedPath, name: &str) -> Result<String, FileError> {
        if name.is_empty() {
            return Err(FileError::invalid("Group name is required"));
        }

        let target = self.resolver.join(parent, name)?;
        fs::create_dir(target.absolute())?;

        info!(path = %target.relative(), "Created directory");
        Ok(target.relative().to_string())
    }

    /// Move every item into `target_dir`, keeping its base name.
    pub fn move_files(&self, items: &[String], target_dir: &str) -> Vec<OperationResult> {
        items
            .iter()
            .map(|item| {
                let outcome = self.move_one(item, target_dir);
                record("move", item, outcome)
            })
            .collect()
    }

    /// Delete every item; directories are removed recursively.
    pub fn delete_files(&self, items: &[String]) -> Vec<OperationResult> {
        items
            .iter()
            .map(|item| {
                let outcome = self.delete_one(item);
                record("delete", item, outcome)
            })
            .collect()
    }

    /// Rename `old_path` in place to `new_name`.
    ///
    /// `new_name` is used verbatim. Returns the new relative path.
    pub fn rename(&self, old_path: &str, new_name: &str) -> Result<String, FileError> {
        if old_path.is_empty() || new_name.is_empty() {
            return Err(FileError::invalid("Both old_path and new_name are required"));
        }
        if new_name.contains(RESERVED_NAME_CHARS) {
            return Err(FileError::invalid("Name contains invalid characters"));
        }

        let source = self.resolver.resolve(old_path)?;
        fs::symlink_metadata(source.absolute())?;

        let target = self.resolver.sibling(&source, new_name)?;
        if fs::symlink_metadata(target.absolute()).is_ok() {
            return Err(FileError::Conflict);
        }

        fs::rename(source.absolute(), target.absolute())?;

        info!(from = %source.relative(), to = %target.relative(), "Renamed entry");
        Ok(target.relative().to_string())
    }

    fn move_one(&self, item: &str, target_dir: &str) -> Result<(), FileError> {
        let source = self.resolver.resolve(item)?;
        let name = source
            .file_name()
            .ok_or_else(|| FileError::invalid("Cannot move the root directory"))?;
        let target_dir = self.resolver.resolve(target_dir)?;
        let destination = self.resolver.join(&target_dir, name)?;

        let metadata = fs::symlink_metadata(source.absolute())?;
        if metadata.is_dir() && destination.absolute().starts_with(source.absolute()) {
            return Err(FileError::invalid("Cannot move a directory into itself"));
        }
        // std has no no-clobber rename, so a destination created after this
        // check can still be replaced.
        if fs::symlink_metadata(destination.absolute()).is_ok() {
            return Err(FileError::AlreadyExists);
        }

        fs::rename(source.absolute(), destination.absolute())?;
        Ok(())
    }

    fn delete_one(&self, item: &str) -> Result<(), FileError> {
        let path = self.resolver.resolve(item)?;
        if path.is_root() {
            return Err(FileError::invalid("Cannot delete the root directory"));
        }

        // symlink_metadata so a link is removed, never its target.
        let metadata = fs::symlink_metadata(path.absolute())?;
        if metadata.is_dir() {
            fs::remove_dir_all(path.absolute())?;
        } else {
            fs::remove_file(path.absolute())?;
        }
        Ok(())
    }
}

fn record(operation: &str, item: &str, outcome: Result<(), FileError>) -> OperationResult {
    match outcome {
        Ok(()) => {
            info!(operation, item, "Batch item succeeded");
            OperationResult::ok(item)
        }
        Err(e) => {
            warn!(operation, item, error = %e, "Batch item failed");
            OperationResult::failed(item, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<PathResolver>, FileMutator) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir_all(root.join("docs/deep")).unwrap();
        fs::create_dir_all(root.join("archive")).unwrap();
        fs::write(root.join("a.html"), "A").unwrap();
        fs::write(root.join("b.html"), "B").unwrap();
        fs::write(root.join("docs/deep/page.html"), "Deep").unwrap();

        let resolver = Arc::new(PathResolver::new(&root).unwrap());
        let mutator = FileMutator::new(Arc::clone(&resolver));
        (temp_dir, resolver, mutator)
    }

    fn items(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    // =========================================================================
    // create_group
    // =========================================================================

    #[test]
    fn test_create_group() {
        let (_temp_dir, resolver, mutator) = setup();
        let parent = resolver.resolve("docs").unwrap();

        let created = mutator.create_group(&parent, "new group").unwrap();
        assert_eq!(created, "docs/new group");
        assert!(resolver.root().join("docs/new group").is_dir());
    }

    #[test]
    fn test_create_group_not_idempotent() {
        let (_temp_dir, resolver, mutator) = setup();
        let parent = resolver.resolve("").unwrap();

        assert!(mutator.create_group(&parent, "fresh").is_ok());
        assert_eq!(
            mutator.create_group(&parent, "fresh"),
            Err(FileError::AlreadyExists)
        );
    }

    #[test]
    fn test_create_group_does_not_merge_into_file() {
        let (_temp_dir, resolver, mutator) = setup();
        let parent = resolver.resolve("").unwrap();

        assert_eq!(
            mutator.create_group(&parent, "a.html"),
            Err(FileError::AlreadyExists)
        );
        assert_eq!(fs::read_to_string(resolver.root().join("a.html")).unwrap(), "A");
    }

    #[test]
    fn test_create_group_requires_name() {
        let (_temp_dir, resolver, mutator) = setup();
        let parent = resolver.resolve("").unwrap();

        assert!(matches!(
            mutator.create_group(&parent, ""),
            Err(FileError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_create_group_escape_denied() {
        let (temp_dir, resolver, mutator) = setup();
        let parent = resolver.resolve("").unwrap();

        assert_eq!(
            mutator.create_group(&parent, "../outside"),
            Err(FileError::AccessDenied)
        );
        assert!(!temp_dir.path().join("outside").exists());
    }

    #[test]
    fn test_create_group_missing_parent() {
        let (_temp_dir, resolver, mutator) = setup();
        let parent = resolver.resolve("missing").unwrap();

        assert_eq!(
            mutator.create_group(&parent, "child"),
            Err(FileError::NotFound)
        );
    }

    // =========================================================================
    // move_files
    // =========================================================================

    #[test]
    fn test_move_files() {
        let (_temp_dir, resolver, mutator) = setup();

        let results = mutator.move_files(&items(&["a.html", "docs/deep"]), "archive");

        assert!(results.iter().all(|r| r.success), "{:?}", results);
        assert!(resolver.root().join("archive/a.html").is_file());
        assert!(resolver.root().join("archive/deep/page.html").is_file());
        assert!(!resolver.root().join("a.html").exists());
    }

    #[test]
    fn test_move_partial_failure_preserves_order() {
        let (_temp_dir, resolver, mutator) = setup();

        let results = mutator.move_files(
            &items(&["missing.html", "../../etc/passwd", "b.html"]),
            "archive",
        );

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].item, "missing.html");
        assert_eq!(results[0].error.as_deref(), Some("Path not found"));
        assert_eq!(results[1].item, "../../etc/passwd");
        assert_eq!(results[1].error.as_deref(), Some("Access denied"));
        assert_eq!(results[2], OperationResult::ok("b.html"));
        assert!(resolver.root().join("archive/b.html").is_file());
    }

    #[test]
    fn test_move_target_outside_root_denied() {
        let (temp_dir, resolver, mutator) = setup();

        let results = mutator.move_files(&items(&["a.html"]), "..");

        assert_eq!(results[0].error.as_deref(), Some("Access denied"));
        assert!(resolver.root().join("a.html").exists());
        assert!(!temp_dir.path().join("a.html").exists());
    }

    #[test]
    fn test_move_does_not_clobber() {
        let (_temp_dir, resolver, mutator) = setup();
        fs::write(resolver.root().join("archive/a.html"), "existing").unwrap();

        let results = mutator.move_files(&items(&["a.html"]), "archive");

        assert!(!results[0].success);
        assert_eq!(results[0].error.as_deref(), Some("Target already exists"));
        assert_eq!(
            fs::read_to_string(resolver.root().join("archive/a.html")).unwrap(),
            "existing"
        );
        assert!(resolver.root().join("a.html").exists());
    }

    #[test]
    fn test_move_directory_into_itself() {
        let (_temp_dir, resolver, mutator) = setup();

        let results = mutator.move_files(&items(&["docs"]), "docs/deep");

        assert!(!results[0].success);
        assert!(resolver.root().join("docs/deep/page.html").exists());
    }

    #[test]
    fn test_move_root_rejected() {
        let (_temp_dir, _resolver, mutator) = setup();

        let results = mutator.move_files(&items(&["", "."]), "archive");
        assert!(results.iter().all(|r| !r.success));
    }

    // =========================================================================
    // delete_files
    // =========================================================================

    #[test]
    fn test_delete_files() {
        let (_temp_dir, resolver, mutator) = setup();

        let results = mutator.delete_files(&items(&["a.html", "docs"]));

        assert!(results.iter().all(|r| r.success));
        assert!(!resolver.root().join("a.html").exists());
        assert!(!resolver.root().join("docs").exists());
    }

    #[test]
    fn test_delete_traversal_does_not_affect_valid_item() {
        let (_temp_dir, resolver, mutator) = setup();

        let results = mutator.delete_files(&items(&["b.html", "../../etc/passwd"]));

        assert_eq!(results.len(), 2);
        assert_eq!(results[0], OperationResult::ok("b.html"));
        assert_eq!(
            results[1],
            OperationResult::failed("../../etc/passwd", "Access denied")
        );
        assert!(!resolver.root().join("b.html").exists());
    }

    #[test]
    fn test_delete_twice_reports_not_found() {
        let (_temp_dir, _resolver, mutator) = setup();

        let results = mutator.delete_files(&items(&["a.html", "a.html"]));

        assert!(results[0].success);
        assert_eq!(results[1].error.as_deref(), Some("Path not found"));
    }

    #[test]
    fn test_delete_root_rejected() {
        let (_temp_dir, resolver, mutator) = setup();

        let results = mutator.delete_files(&items(&["", "docs/.."]));

        assert!(results.iter().all(|r| !r.success));
        assert!(resolver.root().join("a.html").exists());
    }

    #[test]
    fn test_delete_symlink_keeps_target() {
        let (_temp_dir, resolver, mutator) = setup();
        std::os::unix::fs::symlink(
            resolver.root().join("docs"),
            resolver.root().join("docs-link"),
        )
        .unwrap();

        let results = mutator.delete_files(&items(&["docs-link"]));

        assert!(results[0].success, "{:?}", results);
        assert!(resolver.root().join("docs/deep/page.html").exists());
    }

    // =========================================================================
    // rename
    // =========================================================================

    #[test]
    fn test_rename_round_trip() {
        let (_temp_dir, resolver, mutator) = setup();

        let renamed = mutator.rename("docs/deep/page.html", "moved.html").unwrap();
        assert_eq!(renamed, "docs/deep/moved.html");
        assert!(!resolver.root().join("docs/deep/page.html").exists());

        let restored = mutator.rename(&renamed, "page.html").unwrap();
        assert_eq!(restored, "docs/deep/page.html");
        assert_eq!(
            fs::read_to_string(resolver.root().join("docs/deep/page.html")).unwrap(),
            "Deep"
        );
    }

    #[test]
    fn test_rename_preserves_non_ascii() {
        let (_temp_dir, resolver, mutator) = setup();

        let renamed = mutator.rename("a.html", "报告 Été.html").unwrap();
        assert_eq!(renamed, "报告 Été.html");
        assert!(resolver.root().join("报告 Été.html").is_file());
    }

    #[test]
    fn test_rename_invalid_input() {
        let (_temp_dir, _resolver, mutator) = setup();

        assert!(matches!(mutator.rename("", "x.html"), Err(FileError::InvalidInput(_))));
        assert!(matches!(mutator.rename("a.html", ""), Err(FileError::InvalidInput(_))));
        for bad in ["a/b", "a\\b", "a:b", "a*b", "a?b", "a\"b", "a<b", "a>b", "a|b", "../x"] {
            assert!(
                matches!(mutator.rename("a.html", bad), Err(FileError::InvalidInput(_))),
                "name {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_rename_errors() {
        let (_temp_dir, _resolver, mutator) = setup();

        assert_eq!(mutator.rename("../a.html", "x.html"), Err(FileError::AccessDenied));
        assert_eq!(mutator.rename("nope.html", "x.html"), Err(FileError::NotFound));
        assert_eq!(mutator.rename("a.html", "b.html"), Err(FileError::Conflict));
        assert_eq!(mutator.rename("a.html", ".."), Err(FileError::AccessDenied));
    }
}
