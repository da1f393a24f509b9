//! Cache Proxy - A forward HTTP/1.0 proxy with an in-memory object cache
//!
//! Usage: `cache_proxy <port>`

use std::io::IsTerminal;
use std::net::SocketAddr;
use std::process::ExitCode;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_proxy::api::{create_router, AppState};
use cache_proxy::config::{Config, Invocation};
use cache_proxy::error::ProxyError;
use cache_proxy::http::ForwardingPipeline;
use cache_proxy::server::{
    serve_inherited_connection, Acceptor, Dispatcher, Strategy, WorkerLauncher,
};
use cache_proxy::{spawn_reaper_task, SharedCache};

/// Main entry point for the proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Parse the command line (port, or worker mode)
/// 3. Load configuration from environment variables
/// 4. Build the cache and the dispatcher for the configured strategy
/// 5. Optionally start the statistics endpoint
/// 6. Accept connections until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> ExitCode {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(std::io::stdout().is_terminal()))
        .init();

    let invocation = match Invocation::from_args(std::env::args()) {
        Ok(invocation) => invocation,
        Err(e @ ProxyError::Usage(_)) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match invocation {
        Invocation::Serve { port } => run(port).await,
        Invocation::Worker => run_worker().await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs the listening proxy.
async fn run(port: u16) -> anyhow::Result<()> {
    info!("Starting cache proxy");

    let config = Config::from_env(port)?;
    info!(
        "Configuration loaded: strategy={}, max_cache_size={}, max_object_size={}, port={}",
        config.strategy, config.max_cache_size, config.max_object_size, config.port
    );

    let cache = SharedCache::from_config(&config).context("failed to allocate the cache")?;
    let pipeline = ForwardingPipeline::new(cache.clone()).reply_on_error(config.reply_on_error);

    let mut background: Vec<JoinHandle<()>> = Vec::new();
    let dispatcher = match config.strategy {
        Strategy::Sequential => Dispatcher::Sequential(pipeline),
        Strategy::ThreadPerConnection => Dispatcher::ThreadPerConnection(pipeline),
        Strategy::ProcessPerConnection => {
            let launcher = WorkerLauncher::current_exe()
                .context("failed to locate the proxy executable")?;
            let (reaper, reaper_task) = spawn_reaper_task();
            background.push(reaper_task);
            info!("Worker reaper started");
            Dispatcher::ProcessPerConnection { launcher, reaper }
        }
    };

    if let Some(stats_port) = config.stats_port {
        let app = create_router(AppState::new(cache, config.strategy));
        let addr = SocketAddr::from(([127, 0, 0, 1], stats_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind stats endpoint on {}", addr))?;
        info!("Statistics endpoint listening on {}", addr);
        background.push(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("Statistics endpoint stopped: {}", e);
            }
        }));
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let acceptor = Acceptor::bind(addr)
        .await
        .with_context(|| format!("failed to listen on port {}", config.port))?;

    acceptor.run(dispatcher, shutdown_signal()).await;

    for task in background {
        task.abort();
    }
    info!("Proxy shutdown complete");
    Ok(())
}

/// Serves the single connection a parent proxy handed over on stdin.
///
/// Each worker starts from an empty cache of its own.
async fn run_worker() -> anyhow::Result<()> {
    let config = Config::from_env(0)?;
    let cache = SharedCache::from_config(&config)?;
    let pipeline = ForwardingPipeline::new(cache).reply_on_error(config.reply_on_error);

    match serve_inherited_connection(&pipeline).await {
        Ok(outcome) => info!(?outcome, pid = std::process::id(), "Worker finished"),
        Err(e) => warn!(pid = std::process::id(), error = %e, "Worker connection closed"),
    }
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
