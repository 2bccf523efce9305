//! # htmlshelf Protocol Library
//!
//! Wire types for the htmlshelf HTTP API, shared by the daemon and any
//! client that talks to it.
//!
//! ## Overview
//!
//! - **Message Definitions**: JSON request and response bodies for listing,
//!   directory creation, batch move/delete, rename
//! - **Error Codes**: the closed failure taxonomy and its HTTP status mapping
//! - **Decoding**: strict JSON body decoding with defaulted fields
//!
//! ## Example Usage
//!
//! ```rust
//! use protocol::messages::{decode, RenameRequest};
//!
//! let req: RenameRequest = decode(br#"{"old_path": "a.html", "new_name": "b.html"}"#).unwrap();
//! assert_eq!(req.new_name, "b.html");
//! ```
//!
//! ## Modules
//!
//! - [`messages`]: Request/response definitions
//! - [`error`]: Error types

pub mod error;
pub mod messages;

pub use error::{ProtocolError, Result};
pub use messages::{
    BatchResponse, CreateGroupRequest, CreateGroupResponse, DeleteFilesRequest, Entry, ErrorBody,
    ErrorCode, ListResponse, MoveFilesRequest, OperationResult, PathQuery, RenameRequest,
    RenameResponse,
};
