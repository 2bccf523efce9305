//! Pre-dispatch request filter.
//!
//! The guard rejects structurally suspicious requests before any handler
//! runs: a `path` query argument containing `../` or starting with `/`,
//! and bodies whose declared length exceeds the configured ceiling. It is a
//! cheap first line only; [`PathResolver`](crate::files::PathResolver)
//! remains the actual boundary.

use axum::extract::Query;
use axum::http::{header, HeaderMap, Uri};
use protocol::{ErrorCode, PathQuery};
use thiserror::Error;
use tracing::warn;

/// Default request body ceiling (10 MiB).
pub const DEFAULT_MAX_BODY_SIZE: u64 = 10 * 1024 * 1024;

/// Reasons a request is rejected by the guard.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    /// The `path` argument looks like a traversal or absolute path.
    #[error("Invalid path")]
    SuspiciousPath(String),

    /// The declared body length exceeds the ceiling.
    #[error("Request too large")]
    BodyTooLarge { declared: u64, limit: u64 },
}

impl GuardError {
    /// Wire error code for this rejection.
    pub fn code(&self) -> ErrorCode {
        match self {
            GuardError::SuspiciousPath(_) => ErrorCode::InvalidInput,
            GuardError::BodyTooLarge { .. } => ErrorCode::PayloadTooLarge,
        }
    }
}

/// Check a `path` query argument.
pub fn check_path_argument(path: &str) -> Result<(), GuardError> {
    if path.contains("../") || path.starts_with('/') {
        return Err(GuardError::SuspiciousPath(path.to_string()));
    }
    Ok(())
}

/// Shape checks applied to every request.
#[derive(Debug, Clone)]
pub struct RequestGuard {
    max_body_size: u64,
}

impl Default for RequestGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_SIZE)
    }
}

impl RequestGuard {
    pub fn new(max_body_size: u64) -> Self {
        Self { max_body_size }
    }

    /// The body ceiling in bytes.
    pub fn max_body_size(&self) -> u64 {
        self.max_body_size
    }

    /// Inspect a request's URI and headers.
    ///
    /// A query string that cannot be parsed is let through; the handler
    /// reports it.
    pub fn inspect(&self, uri: &Uri, headers: &HeaderMap) -> Result<(), GuardError> {
        if uri.query().is_some() {
            if let Ok(Query(query)) = Query::<PathQuery>::try_from_uri(uri) {
                if let Err(e) = check_path_argument(&query.path) {
                    warn!(path = %query.path, uri = %uri, "Rejected suspicious path argument");
                    return Err(e);
                }
            }
        }

        let declared = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(declared) = declared {
            if declared > self.max_body_size {
                warn!(declared, limit = self.max_body_size, "Rejected oversized request body");
                return Err(GuardError::BodyTooLarge {
                    declared,
                    limit: self.max_body_size,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    fn headers_with_length(len: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_str(len).unwrap());
        headers
    }

    #[test]
    fn test_check_path_argument() {
        assert!(check_path_argument("").is_ok());
        assert!(check_path_argument("docs/page.html").is_ok());
        assert!(check_path_argument("docs/..hidden").is_ok());
        assert!(check_path_argument("..").is_ok());

        assert!(check_path_argument("../etc").is_err());
        assert!(check_path_argument("docs/../../x").is_err());
        assert!(check_path_argument("/etc/passwd").is_err());
    }

    #[test]
    fn test_inspect_query_path() {
        let guard = RequestGuard::default();
        let headers = HeaderMap::new();

        assert!(guard.inspect(&uri("/api/list"), &headers).is_ok());
        assert!(guard.inspect(&uri("/api/list?path=docs"), &headers).is_ok());
        assert_eq!(
            guard.inspect(&uri("/api/list?path=..%2Fsecret"), &headers),
            Err(GuardError::SuspiciousPath("../secret".to_string()))
        );
        assert!(guard
            .inspect(&uri("/preview?path=%2Fetc%2Fpasswd"), &headers)
            .is_err());
    }

    #[test]
    fn test_inspect_ignores_other_arguments() {
        let guard = RequestGuard::default();

        let result = guard.inspect(&uri("/api/list?other=../x&path=ok"), &HeaderMap::new());
        assert!(result.is_ok());
    }

    #[test]
    fn test_inspect_body_size() {
        let guard = RequestGuard::new(100);

        assert!(guard.inspect(&uri("/api/rename"), &headers_with_length("100")).is_ok());
        assert_eq!(
            guard.inspect(&uri("/api/rename"), &headers_with_length("101")),
            Err(GuardError::BodyTooLarge {
                declared: 101,
                limit: 100
            })
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            GuardError::SuspiciousPath("/x".to_string()).code().status(),
            400
        );
        assert_eq!(
            GuardError::BodyTooLarge {
                declared: 2,
                limit: 1
            }
            .code()
            .status(),
            413
        );
    }
}
