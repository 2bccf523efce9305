//! # htmlshelf Daemon Library
//!
//! This crate provides the HTTP file manager behind htmlshelf: a server that
//! lets a browser list, organize and preview the HTML documents stored under
//! one configured root directory.
//!
//! ## Overview
//!
//! - **Path Confinement**: Every client path is resolved beneath the root
//! - **Listing**: Directories and HTML files, sorted by name
//! - **Mutations**: Create directories, batch move and delete, rename
//! - **Preview**: Serve HTML with a restrictive content security policy
//! - **Request Guard**: Reject suspicious path arguments and oversized bodies
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                      ShelfServer                       │
//! ├────────────────────────────────────────────────────────┤
//! │  TraceLayer → RequestGuard → axum Router               │
//! │                                                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  │
//! │  │  Directory   │  │     File     │  │     HTML     │  │
//! │  │   Browser    │  │   Mutator    │  │   Previewer  │  │
//! │  └──────────────┘  └──────────────┘  └──────────────┘  │
//! │                                                        │
//! │  ┌──────────────────────────────────────────────────┐  │
//! │  │                  PathResolver                    │  │
//! │  └──────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shelfd::{Config, ShelfServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load_default()?;
//!     config.apply_env_overrides();
//!     config.validate()?;
//!
//!     let server = ShelfServer::new(config)?;
//!     server.run_until(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and defaults
//! - [`files`]: Path resolution and the file services
//! - [`guard`]: Pre-dispatch request checks
//! - [`logging`]: Tracing subscriber setup
//! - [`router`]: HTTP endpoints and error mapping
//! - [`server`]: Listener lifecycle

pub mod config;
pub mod files;
pub mod guard;
pub mod logging;
pub mod router;
pub mod server;

// Re-export protocol for convenience
pub use protocol;

// Re-export config types for convenience
pub use config::{Config, ConfigError};

// Re-export files types for convenience
pub use files::{
    DirectoryBrowser, DirectoryEntry, FileError, FileMutator, HtmlPreviewer, PathResolver,
    ResolvedPath,
};

// Re-export guard types for convenience
pub use guard::{GuardError, RequestGuard};

// Re-export router types for convenience
pub use router::{build_router, AppState, RouterError, RouterResult};

// Re-export server types for convenience
pub use server::{ServerState, ShelfServer};
