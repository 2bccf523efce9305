//! JSON message definitions for the htmlshelf HTTP API.
//!
//! Request bodies default every missing field to empty so that a client
//! omitting a key gets the same validation error as one sending `""`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Wire value of [`Entry::entry_type`] for directories.
pub const ENTRY_TYPE_DIRECTORY: &str = "directory";

/// Wire value of [`Entry::entry_type`] for files.
pub const ENTRY_TYPE_FILE: &str = "file";

/// Decode a JSON request body.
///
/// The body must be a JSON object. Malformed JSON, non-object bodies and
/// type mismatches all surface as [`ProtocolError::Deserialization`].
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(ProtocolError::Deserialization(
            "request body must be a JSON object".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

// ============================================================================
// Listing
// ============================================================================

/// Query arguments accepted by `/api/list` and `/preview`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathQuery {
    /// Client-supplied path relative to the root.
    pub path: String,
}

/// A single directory or HTML file visible to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry name (not full path).
    pub name: String,
    /// Path relative to the root, slash separated.
    pub path: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Either `"directory"` or `"file"`.
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds).
    pub modified: i64,
}

impl Entry {
    /// Build an entry, deriving the wire `type` from `is_dir`.
    pub fn new(name: String, path: String, is_dir: bool, size: u64, modified: i64) -> Self {
        let entry_type = if is_dir {
            ENTRY_TYPE_DIRECTORY
        } else {
            ENTRY_TYPE_FILE
        };
        Self {
            name,
            path,
            is_dir,
            entry_type: entry_type.to_string(),
            size: if is_dir { 0 } else { size },
            modified,
        }
    }
}

/// Response for `/api/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResponse {
    /// The path argument exactly as the client sent it.
    pub path: String,
    /// Visible entries, sorted by name.
    pub items: Vec<Entry>,
}

// ============================================================================
// Mutations
// ============================================================================

/// Request body for `/api/create_group`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateGroupRequest {
    /// Parent directory, relative to the root.
    pub path: String,
    /// Name of the directory to create.
    pub name: String,
}

/// Response for `/api/create_group`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGroupResponse {
    /// Always `true`; failures are reported as error bodies.
    pub success: bool,
    /// Relative path of the new directory.
    pub path: String,
}

/// Request body for `/api/move_files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveFilesRequest {
    /// Items to move, relative to the root.
    pub files: Vec<String>,
    /// Destination directory, relative to the root.
    pub target_dir: String,
}

/// Request body for `/api/delete_files`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteFilesRequest {
    /// Items to delete, relative to the root.
    pub files: Vec<String>,
}

/// Outcome of one item in a batch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// The item exactly as the client sent it.
    #[serde(rename = "file")]
    pub item: String,
    /// Whether the item was processed.
    pub success: bool,
    /// Failure reason when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    /// A successful item.
    pub fn ok(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            success: true,
            error: None,
        }
    }

    /// A failed item with its reason.
    pub fn failed(item: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Response for `/api/move_files` and `/api/delete_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    /// One result per requested item, in request order.
    pub results: Vec<OperationResult>,
}

/// Request body for `/api/rename`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenameRequest {
    /// Item to rename, relative to the root.
    pub old_path: String,
    /// New name; used verbatim.
    pub new_name: String,
}

/// Response for `/api/rename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameResponse {
    /// Always `true`; failures are reported as error bodies.
    pub success: bool,
    /// Relative path after the rename.
    pub new_path: String,
}

// ============================================================================
// Errors
// ============================================================================

/// JSON error body returned by every `/api` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Error codes for the closed failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or structurally suspicious request.
    InvalidInput,
    /// Path resolves outside the root.
    AccessDenied,
    /// Resource not found.
    NotFound,
    /// Resource already exists.
    AlreadyExists,
    /// Target name is taken.
    Conflict,
    /// Request or file exceeds a size ceiling.
    PayloadTooLarge,
    /// Any other failure.
    Unexpected,
}

impl ErrorCode {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            ErrorCode::InvalidInput => 400,
            ErrorCode::AccessDenied => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::AlreadyExists | ErrorCode::Conflict => 409,
            ErrorCode::PayloadTooLarge => 413,
            ErrorCode::Unexpected => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default_to_empty() {
        let req: CreateGroupRequest = decode(b"{}").unwrap();
        assert_eq!(req.path, "");
        assert_eq!(req.name, "");

        let req: MoveFilesRequest = decode(br#"{"files": ["a.html"]}"#).unwrap();
        assert_eq!(req.files, vec!["a.html".to_string()]);
        assert_eq!(req.target_dir, "");
    }

    #[test]
    fn test_decode_malformed_json() {
        let result: Result<RenameRequest> = decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Deserialization(_))));
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        let result: Result<DeleteFilesRequest> = decode(b"[1, 2]");
        assert!(matches!(result, Err(ProtocolError::Deserialization(_))));

        let result: Result<DeleteFilesRequest> = decode(br#"{"files": "x"}"#);
        assert!(matches!(result, Err(ProtocolError::Deserialization(_))));

        let req: DeleteFilesRequest = decode(br#"{"files": ["x"]}"#).unwrap();
        assert_eq!(req.files, vec!["x".to_string()]);
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = Entry::new("docs".to_string(), "a/docs".to_string(), true, 4096, 1704067200);
        let json: serde_json::Value = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["name"], "docs");
        assert_eq!(json["path"], "a/docs");
        assert_eq!(json["is_dir"], true);
        assert_eq!(json["type"], "directory");
        assert_eq!(json["size"], 0);
        assert_eq!(json["modified"], 1704067200);
    }

    #[test]
    fn test_operation_result_wire_format() {
        let ok = serde_json::to_value(OperationResult::ok("a.html")).unwrap();
        assert_eq!(ok, serde_json::json!({"file": "a.html", "success": true}));

        let failed = serde_json::to_value(OperationResult::failed("../x", "Access denied")).unwrap();
        assert_eq!(
            failed,
            serde_json::json!({"file": "../x", "success": false, "error": "Access denied"})
        );
    }

    #[test]
    fn test_error_code_status() {
        assert_eq!(ErrorCode::InvalidInput.status(), 400);
        assert_eq!(ErrorCode::AccessDenied.status(), 403);
        assert_eq!(ErrorCode::NotFound.status(), 404);
        assert_eq!(ErrorCode::AlreadyExists.status(), 409);
        assert_eq!(ErrorCode::Conflict.status(), 409);
        assert_eq!(ErrorCode::PayloadTooLarge.status(), 413);
        assert_eq!(ErrorCode::Unexpected.status(), 500);
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::PayloadTooLarge).unwrap();
        assert_eq!(json, "\"payload_too_large\"");
    }
}
