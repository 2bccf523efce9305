//! Sandboxed HTML preview.

use std::fs;

use tracing::debug;

use super::browser::is_html;
use super::error::FileError;
use super::resolver::ResolvedPath;

/// Default preview size ceiling (100 MiB).
pub const DEFAULT_MAX_PREVIEW_SIZE: u64 = 100 * 1024 * 1024;

/// Opening head tag that receives the injected policy.
pub const HEAD_TAG: &str = "<head>";

/// Markup inserted right after the first [`HEAD_TAG`].
pub const CONTENT_POLICY: &str = concat!(
    r#"<base href=".">"#,
    r#"<meta http-equiv="Content-Security-Policy" content="default-src 'self'; "#,
    r#"script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; "#,
    r#"img-src 'self' data:;">"#,
);

/// Inject [`CONTENT_POLICY`] after the first literal `<head>`.
///
/// Later occurrences are left alone; content without a head tag is
/// returned unchanged.
pub fn inject_content_policy(content: &str) -> String {
    content.replacen(HEAD_TAG, &format!("{}{}", HEAD_TAG, CONTENT_POLICY), 1)
}

/// Reads HTML files for preview.
#[derive(Debug, Clone)]
pub struct HtmlPreviewer {
    /// Largest file size served, in bytes.
    max_size: u64,
}

impl Default for HtmlPreviewer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PREVIEW_SIZE)
    }
}

impl HtmlPreviewer {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    /// The size ceiling in bytes.
    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Read `path` and return it with the content policy injected.
    ///
    /// The size is checked from metadata before anything is read; a file
    /// exactly at the ceiling is allowed.
    pub fn preview(&self, path: &ResolvedPath) -> Result<String, FileError> {
        let metadata = fs::metadata(path.absolute())?;

        if metadata.is_dir() || !is_html(path.relative()) {
            return Err(FileError::invalid("Only HTML files can be previewed"));
        }

        let size = metadata.len();
        if size > self.max_size {
            return Err(FileError::PayloadTooLarge {
                size,
                limit: self.max_size,
            });
        }

        let bytes = fs::read(path.absolute())
            .map_err(|e| FileError::Unexpected(e.to_string()))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| FileError::Unexpected(format!("file is not valid UTF-8: {}", e)))?;

        debug!(path = %path.relative(), size, "Serving preview");
        Ok(inject_content_policy(&content))
    }
}
