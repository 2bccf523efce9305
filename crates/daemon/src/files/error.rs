//! Closed error taxonomy for file operations.

use std::io;

use protocol::ErrorCode;
use thiserror::Error;

/// Errors produced by the file services.
///
/// Display strings are sent to clients verbatim, so low-level detail only
/// appears inside [`FileError::Unexpected`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileError {
    /// The request is malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// The path resolves outside the root.
    #[error("Access denied")]
    AccessDenied,

    /// The path does not exist.
    #[error("Path not found")]
    NotFound,

    /// The target of a create or move already exists.
    #[error("Target already exists")]
    AlreadyExists,

    /// The target name of a rename is taken.
    #[error("Target name already exists")]
    Conflict,

    /// The file exceeds the size ceiling.
    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// Any other failure, carrying the underlying cause.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl FileError {
    /// Wire error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            FileError::InvalidInput(_) => ErrorCode::InvalidInput,
            FileError::AccessDenied => ErrorCode::AccessDenied,
            FileError::NotFound => ErrorCode::NotFound,
            FileError::AlreadyExists => ErrorCode::AlreadyExists,
            FileError::Conflict => ErrorCode::Conflict,
            FileError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            FileError::Unexpected(_) => ErrorCode::Unexpected,
        }
    }

    /// Shorthand for [`FileError::InvalidInput`].
    pub fn invalid(message: impl Into<String>) -> Self {
        FileError::InvalidInput(message.into())
    }
}

impl From<io::Error> for FileError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FileError::NotFound,
            io::ErrorKind::AlreadyExists => FileError::AlreadyExists,
            _ => FileError::Unexpected(err.to_string()),
        }
    }
}
