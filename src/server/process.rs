//! Worker processes for the process-per-connection strategy.
//!
//! The parent re-executes the proxy binary with [`WORKER_FLAG`] and the
//! accepted socket as the child's stdin. The child serves that one
//! connection with a cache of its own and exits.

use std::os::fd::{AsFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::net::TcpStream;
use tokio::process::{Child, Command};

use crate::config::WORKER_FLAG;
use crate::error::Result;
use crate::http::{ForwardingPipeline, Outcome};

// == Worker Launcher ==
/// Starts worker processes from a proxy executable.
#[derive(Debug, Clone)]
pub struct WorkerLauncher {
    program: PathBuf,
}

impl WorkerLauncher {
    /// Launches workers from the given executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Launches workers from the running executable.
    pub fn current_exe() -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    // == Launch ==
    /// Moves `stream` into a new worker process.
    ///
    /// The parent's copy of the socket is closed before this returns, so
    /// the connection's lifetime belongs to the child alone.
    pub fn launch(&self, stream: TcpStream) -> Result<Child> {
        let stream = stream.into_std()?;
        stream.set_nonblocking(false)?;
        let socket = OwnedFd::from(stream);

        let child = Command::new(&self.program)
            .arg(WORKER_FLAG)
            .stdin(Stdio::from(socket))
            .spawn()?;
        Ok(child)
    }
}

// == Worker Side ==
/// Serves the connection inherited on stdin.
pub async fn serve_inherited_connection(pipeline: &ForwardingPipeline) -> Result<Outcome> {
    let socket = std::io::stdin().as_fd().try_clone_to_owned()?;
    let stream = std::net::TcpStream::from(socket);
    stream.set_nonblocking(true)?;
    let stream = TcpStream::from_std(stream)?;

    pipeline.serve(stream).await
}
