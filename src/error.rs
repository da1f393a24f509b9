//! Error types for the proxy
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Proxy Error Enum ==
/// Unified error type for the proxy.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Wrong command line
    #[error("usage: {0} <port>")]
    Usage(String),

    /// Cache storage could not be set up at startup
    #[error("Cache initialization failed: {0}")]
    Allocation(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Request line or URI could not be parsed
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Method other than GET or HEAD
    #[error("Proxy does not implement this method: {0}")]
    UnsupportedMethod(String),

    /// Origin server could not be reached
    #[error("Failed to connect to the end server {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Socket failure while talking to the client or origin
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProxyError {
    // == Error Response ==
    /// Returns the HTTP/1.0 response a client should see for this error, if any.
    ///
    /// Only per-connection request errors map to a response; everything else
    /// either happens before a client exists or means the socket is gone.
    pub fn error_response(&self) -> Option<Vec<u8>> {
        let (code, reason) = match self {
            ProxyError::MalformedRequest(_) => (400, "Bad Request"),
            ProxyError::UnsupportedMethod(_) => (501, "Not Implemented"),
            ProxyError::Connect { .. } => (502, "Bad Gateway"),
            _ => return None,
        };

        let body = format!("{} {}: {}\r\n", code, reason, self);
        Some(
            format!(
                "HTTP/1.0 {} {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                code,
                reason,
                body.len(),
                body
            )
            .into_bytes(),
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
