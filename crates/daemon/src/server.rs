//! HTTP server lifecycle.
//!
//! [`ShelfServer`] owns the listener task: it builds the [`AppState`] from
//! configuration, binds the socket, serves the router until its shutdown
//! token is cancelled, and then waits for in-flight requests to drain.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::router::{build_router, AppState};

/// Server lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Initial state, not started.
    Stopped,
    /// Binding the listener.
    Starting,
    /// Accepting requests.
    Running,
    /// Draining in-flight requests.
    ShuttingDown,
}

/// The HTTP server.
pub struct ShelfServer {
    config: Config,
    app: Arc<AppState>,
    state: Arc<RwLock<ServerState>>,
    local_addr: RwLock<Option<SocketAddr>>,
    shutdown_token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ShelfServer {
    /// Create a server for `config`. Fails if the root cannot be opened.
    pub fn new(config: Config) -> Result<Self> {
        let app = Arc::new(AppState::from_config(&config.files)?);
        info!(root = %app.resolver.root().display(), "Serving root directory");

        Ok(Self {
            config,
            app,
            state: Arc::new(RwLock::new(ServerState::Stopped)),
            local_addr: RwLock::new(None),
            shutdown_token: CancellationToken::new(),
            task: Mutex::new(None),
        })
    }

    /// Returns the current state.
    pub async fn state(&self) -> ServerState {
        *self.state.read().await
    }

    /// The bound address, once started.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read().await
    }

    /// Returns the shutdown token for external tasks to observe shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Bind the listener and start serving in a background task.
    pub async fn start(&self) -> Result<SocketAddr> {
        let bind_addr = self.config.bind_addr()?;
        {
            let mut state = self.state.write().await;
            if *state != ServerState::Stopped {
                anyhow::bail!("Server is already running");
            }
            *state = ServerState::Starting;
        }

        let listener = match TcpListener::bind(bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                *self.state.write().await = ServerState::Stopped;
                return Err(e).with_context(|| format!("Failed to bind {}", bind_addr));
            }
        };
        let addr = listener
            .local_addr()
            .context("Failed to read listener address")?;

        let router = build_router(Arc::clone(&self.app));
        let token = self.shutdown_token.clone();
        let state = Arc::clone(&self.state);

        // Marked running before the task exists, so the task's final
        // Stopped write is never overwritten.
        *self.local_addr.write().await = Some(addr);
        *self.state.write().await = ServerState::Running;

        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = result {
                error!(error = %e, "HTTP server failed");
            }
            *state.write().await = ServerState::Stopped;
        });

        *self.task.lock().await = Some(handle);

        info!(addr = %addr, "HTTP server listening");
        Ok(addr)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            match *state {
                ServerState::Stopped => return Ok(()),
                ServerState::ShuttingDown => anyhow::bail!("Server is already shutting down"),
                _ => *state = ServerState::ShuttingDown,
            }
        }

        info!("Stopping HTTP server...");
        self.shutdown_token.cancel();

        if let Some(handle) = self.task.lock().await.take() {
            handle.await.context("HTTP server task panicked")?;
        }

        *self.state.write().await = ServerState::Stopped;
        info!("HTTP server stopped");
        Ok(())
    }

    /// Serve until `shutdown` resolves, then stop gracefully.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        self.start().await?;
        tokio::select! {
            _ = shutdown => {}
            _ = self.shutdown_token.cancelled() => {}
        }
        self.stop().await
    }
}
