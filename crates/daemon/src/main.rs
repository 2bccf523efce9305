//! htmlshelf daemon
//!
//! HTTP file manager for a tree of HTML documents.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelfd::config::{default_config_path, Config, EnvOverride};
use shelfd::logging;
use shelfd::server::ShelfServer;

/// htmlshelf daemon - browse, organize and preview HTML files over HTTP.
#[derive(Parser, Debug)]
#[command(name = "shelfd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the daemon.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Root directory to serve
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Address to listen on, e.g. 0.0.0.0:5000
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    let mut config = Config::load(&config_path)?;
    let overrides = config.apply_env_overrides();

    let command = cli.command.unwrap_or(Commands::Serve {
        root: None,
        bind: None,
    });

    match command {
        Commands::Serve { root, bind } => {
            if let Some(root) = root {
                config.files.root = absolutize(&root)?;
            }
            if let Some(bind) = bind {
                config.server.bind_addr = bind;
            }

            let _log_guard = logging::init(&config.logging, cli.verbose)?;
            tracing::info!(config = %config_path.display(), "htmlshelf daemon starting...");
            log_env_overrides(&overrides);

            config.validate()?;

            let server = ShelfServer::new(config)?;
            server.run_until(wait_for_shutdown_signal()).await?;
        }
        Commands::InitConfig { force } => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    config_path.display()
                );
            }
            Config::default().save(&config_path)?;
            println!("Wrote default configuration to {}", config_path.display());
        }
        Commands::ShowConfig => {
            config.validate()?;
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn log_env_overrides(overrides: &[EnvOverride]) {
    for o in overrides {
        tracing::info!(var = o.var, value = %o.value, "Overriding config from environment");
    }
}

/// Resolve a relative `--root` against the working directory.
fn absolutize(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        _ => {
            tracing::warn!("Failed to register signal handlers, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Received ctrl-c");
}
