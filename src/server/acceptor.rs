//! Connection acceptor.
//!
//! # Responsibilities
//! - Bind the listening port
//! - Accept connections and log the peer
//! - Hand each connection to the active [`Dispatcher`]
//! - Keep accepting through per-connection failures

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::Result;
use crate::server::Dispatcher;

/// Pause after a failed accept before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listening socket feeding a dispatcher.
pub struct Acceptor {
    inner: TcpListener,
}

impl Acceptor {
    /// Binds and listens on `addr`.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let inner = TcpListener::bind(addr).await?;
        info!(address = %inner.local_addr()?, "Listener bound");
        Ok(Self { inner })
    }

    /// Get the local address this acceptor is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }

    // == Run ==
    /// Accepts connections until `shutdown` completes.
    ///
    /// Accept errors are logged and do not end the loop.
    pub async fn run<F>(self, dispatcher: Dispatcher, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(strategy = %dispatcher.strategy(), "Accepting connections");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Acceptor stopping");
                    break;
                }
                accepted = self.inner.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!("Accepted connection from ({}, {})", peer.ip(), peer.port());
                        dispatcher.dispatch(stream, peer).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                },
            }
        }
    }
}
