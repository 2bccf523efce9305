//! HTTP router dispatching API requests to the file services.
//!
//! This module wires the endpoints to [`DirectoryBrowser`], [`FileMutator`]
//! and [`HtmlPreviewer`], runs the [`RequestGuard`] in front of all of them,
//! and maps the error taxonomy onto status codes. `/api` errors are JSON
//! `{"error": ...}` bodies; preview errors are plain text.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, Query, Request, State};
use axum::http::{header, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use protocol::messages::decode;
use protocol::{
    BatchResponse, CreateGroupRequest, CreateGroupResponse, DeleteFilesRequest, ErrorBody,
    ErrorCode, ListResponse, MoveFilesRequest, PathQuery, ProtocolError, RenameRequest,
    RenameResponse,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::config::FileConfig;
use crate::files::{DirectoryBrowser, FileError, FileMutator, HtmlPreviewer, PathResolver};
use crate::guard::{GuardError, RequestGuard};

/// Result type for API handlers.
pub type RouterResult<T> = Result<T, RouterError>;

/// Errors that can occur while handling a request.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// File operation error.
    #[error(transparent)]
    File(#[from] FileError),

    /// Request body could not be decoded.
    #[error("Invalid request body: {0}")]
    Body(#[from] ProtocolError),

    /// Request body could not be read.
    #[error("Invalid request body: {0}")]
    UnreadableBody(String),

    /// Streamed request body exceeded the ceiling.
    #[error("Request too large")]
    BodyTooLarge,

    /// Query string could not be decoded.
    #[error("Invalid query string: {0}")]
    Query(String),

    /// Rejected by the request guard.
    #[error(transparent)]
    Guard(#[from] GuardError),
}

impl RouterError {
    /// Wire error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            RouterError::File(e) => e.code(),
            RouterError::Body(_) | RouterError::UnreadableBody(_) | RouterError::Query(_) => {
                ErrorCode::InvalidInput
            }
            RouterError::BodyTooLarge => ErrorCode::PayloadTooLarge,
            RouterError::Guard(e) => e.code(),
        }
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code().status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for RouterError {
    fn into_response(self) -> Response {
        if self.code() == ErrorCode::Unexpected {
            error!(error = %self, "Request failed unexpectedly");
        } else {
            debug!(error = %self, "Request rejected");
        }
        (self.status(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// Plain-text error response for the preview endpoint.
#[derive(Debug)]
pub struct PreviewError(RouterError);

impl From<RouterError> for PreviewError {
    fn from(err: RouterError) -> Self {
        PreviewError(err)
    }
}

impl From<FileError> for PreviewError {
    fn from(err: FileError) -> Self {
        PreviewError(RouterError::File(err))
    }
}

impl IntoResponse for PreviewError {
    fn into_response(self) -> Response {
        let message = match &self.0 {
            RouterError::File(FileError::Unexpected(cause)) => {
                error!(error = %cause, "Preview failed unexpectedly");
                format!("Error previewing file: {}", cause)
            }
            other => other.to_string(),
        };
        (
            self.0.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}

/// Shared state handed to every handler.
///
/// Holds no mutable state; the filesystem is the only shared resource.
#[derive(Debug, Clone)]
pub struct AppState {
    pub resolver: Arc<PathResolver>,
    pub browser: DirectoryBrowser,
    pub mutator: FileMutator,
    pub previewer: HtmlPreviewer,
    pub guard: RequestGuard,
}

impl AppState {
    /// Build the services around the configured root.
    pub fn from_config(config: &FileConfig) -> Result<Self> {
        let resolver = PathResolver::new(&config.root)
            .with_context(|| format!("Invalid root directory: {}", config.root.display()))?
            .confine_symlinks(config.confine_symlinks);

        Ok(Self::new(
            resolver,
            HtmlPreviewer::new(config.max_preview_size),
            RequestGuard::new(config.max_body_size),
        ))
    }

    pub fn new(resolver: PathResolver, previewer: HtmlPreviewer, guard: RequestGuard) -> Self {
        let resolver = Arc::new(resolver);
        Self {
            mutator: FileMutator::new(Arc::clone(&resolver)),
            browser: DirectoryBrowser::new(Arc::clone(&resolver)),
            resolver,
            previewer,
            guard,
        }
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.guard.max_body_size()).unwrap_or(usize::MAX);

    Router::new()
        .route("/api/list", get(list_files))
        .route("/api/create_group", post(create_group))
        .route("/api/move_files", post(move_files))
        .route("/api/delete_files", post(delete_files))
        .route("/api/rename", post(rename_item))
        .route("/preview", get(preview_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            request_guard,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn request_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = state.guard.inspect(request.uri(), request.headers()) {
        return RouterError::from(e).into_response();
    }
    next.run(request).await
}

/// Unwrap a buffered body, mapping axum's rejection into a JSON error.
///
/// Bodies without a `Content-Length` pass the guard and only hit the
/// limit while being buffered.
fn body_bytes(body: Result<Bytes, BytesRejection>) -> RouterResult<Bytes> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            warn!("Rejected oversized streamed request body");
            RouterError::BodyTooLarge
        } else {
            RouterError::UnreadableBody(rejection.body_text())
        }
    })
}

fn path_query(uri: &Uri) -> RouterResult<PathQuery> {
    if uri.query().is_none() {
        return Ok(PathQuery::default());
    }
    Query::<PathQuery>::try_from_uri(uri)
        .map(|Query(query)| query)
        .map_err(|e| RouterError::Query(e.body_text()))
}

// =========================================================================
// Handlers
// =========================================================================

async fn list_files(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> RouterResult<Json<ListResponse>> {
    let query = path_query(&uri)?;
    debug!(path = %query.path, "Listing directory");

    let directory = state.resolver.resolve(&query.path)?;
    let entries = state.browser.list(&directory)?;

    Ok(Json(ListResponse {
        path: query.path,
        items: entries.iter().map(|e| e.to_protocol()).collect(),
    }))
}

async fn create_group(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> RouterResult<Json<CreateGroupResponse>> {
    let req: CreateGroupRequest = decode(&body_bytes(body)?)?;
    debug!(path = %req.path, name = %req.name, "Creating directory");

    if req.name.is_empty() {
        return Err(FileError::invalid("Group name is required").into());
    }
    let parent = state.resolver.resolve(&req.path)?;
    let path = state.mutator.create_group(&parent, &req.name)?;

    Ok(Json(CreateGroupResponse {
        success: true,
        path,
    }))
}

async fn move_files(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> RouterResult<Json<BatchResponse>> {
    let req: MoveFilesRequest = decode(&body_bytes(body)?)?;
    debug!(count = req.files.len(), target_dir = %req.target_dir, "Moving files");

    Ok(Json(BatchResponse {
        results: state.mutator.move_files(&req.files, &req.target_dir),
    }))
}

async fn delete_files(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> RouterResult<Json<BatchResponse>> {
    let req: DeleteFilesRequest = decode(&body_bytes(body)?)?;
    debug!(count = req.files.len(), "Deleting files");

    Ok(Json(BatchResponse {
        results: state.mutator.delete_files(&req.files),
    }))
}

async fn rename_item(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> RouterResult<Json<RenameResponse>> {
    let req: RenameRequest = decode(&body_bytes(body)?)?;
    debug!(old_path = %req.old_path, new_name = %req.new_name, "Renaming entry");

    let new_path = state.mutator.rename(&req.old_path, &req.new_name)?;

    Ok(Json(RenameResponse {
        success: true,
        new_path,
    }))
}

async fn preview_file(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<Html<String>, PreviewError> {
    let query = path_query(&uri)?;
    if query.path.is_empty() {
        return Err(FileError::invalid("Missing path parameter").into());
    }

    let path = state.resolver.resolve(&query.path)?;
    let content = state.previewer.preview(&path)?;
    Ok(Html(content))
}
