//! Concurrency strategies.
//!
//! Decides who runs the forwarding pipeline for an accepted connection: the
//! accept loop itself, a task per connection sharing one cache, or a worker
//! process per connection.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde::Serialize;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::ProxyError;
use crate::http::ForwardingPipeline;
use crate::server::process::WorkerLauncher;
use crate::tasks::ReaperHandle;

// == Strategy ==
/// Name of a concurrency strategy, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One request at a time on the accept loop
    Sequential,
    /// A worker process per connection; each worker has its own cache
    ProcessPerConnection,
    /// A detached task per connection; all tasks share one cache
    #[default]
    ThreadPerConnection,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::ProcessPerConnection => "process",
            Strategy::ThreadPerConnection => "thread",
        }
    }
}

impl FromStr for Strategy {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Strategy::Sequential),
            "process" => Ok(Strategy::ProcessPerConnection),
            "thread" => Ok(Strategy::ThreadPerConnection),
            other => Err(ProxyError::Config(format!(
                "unknown strategy {:?} (expected sequential, process or thread)",
                other
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Dispatcher ==
/// Hands accepted connections to workers under one strategy.
#[derive(Debug)]
pub enum Dispatcher {
    Sequential(ForwardingPipeline),
    ProcessPerConnection {
        launcher: WorkerLauncher,
        reaper: ReaperHandle,
    },
    ThreadPerConnection(ForwardingPipeline),
}

impl Dispatcher {
    pub fn strategy(&self) -> Strategy {
        match self {
            Dispatcher::Sequential(_) => Strategy::Sequential,
            Dispatcher::ProcessPerConnection { .. } => Strategy::ProcessPerConnection,
            Dispatcher::ThreadPerConnection(_) => Strategy::ThreadPerConnection,
        }
    }

    // == Dispatch ==
    /// Starts handling one connection.
    ///
    /// Only the sequential strategy waits for the connection to finish;
    /// the others return as soon as the worker is running.
    pub async fn dispatch(&self, stream: TcpStream, peer: SocketAddr) {
        match self {
            Dispatcher::Sequential(pipeline) => {
                handle_connection(pipeline, stream, peer).await;
            }
            Dispatcher::ThreadPerConnection(pipeline) => {
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    handle_connection(&pipeline, stream, peer).await;
                });
            }
            Dispatcher::ProcessPerConnection { launcher, reaper } => {
                match launcher.launch(stream) {
                    Ok(child) => {
                        debug!(%peer, pid = ?child.id(), "Started worker process");
                        reaper.adopt(child);
                    }
                    Err(e) => warn!(%peer, error = %e, "Failed to start worker process"),
                }
            }
        }
    }
}

/// Runs the pipeline for one connection and logs how it ended.
///
/// Errors stop here; they never reach the accept loop.
pub async fn handle_connection(pipeline: &ForwardingPipeline, stream: TcpStream, peer: SocketAddr) {
    match pipeline.serve(stream).await {
        Ok(outcome) => debug!(%peer, ?outcome, "Connection finished"),
        Err(e) => warn!(%peer, error = %e, "Connection closed"),
    }
}
