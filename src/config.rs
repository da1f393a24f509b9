//! Configuration Module
//!
//! Handles the command line and the environment-driven proxy settings.

use std::env;

use crate::cache::{MAX_CACHE_SIZE, MAX_OBJECT_SIZE};
use crate::error::{ProxyError, Result};
use crate::server::Strategy;

/// Argument that starts the binary as a process-per-connection worker.
pub const WORKER_FLAG: &str = "--worker";

// == Invocation ==
/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Listen on the given port
    Serve { port: u16 },
    /// Handle the single connection inherited on stdin
    Worker,
}

impl Invocation {
    /// Parses the full argument vector, program name included.
    ///
    /// Exactly one argument is accepted: the listening port, or the
    /// internal worker flag.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        let program = args
            .first()
            .cloned()
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

        if args.len() != 2 {
            return Err(ProxyError::Usage(program));
        }
        if args[1] == WORKER_FLAG {
            return Ok(Invocation::Worker);
        }

        args[1]
            .parse()
            .map(|port| Invocation::Serve { port })
            .map_err(|_| ProxyError::Usage(program))
    }
}

/// Proxy configuration parameters.
///
/// All values except the port can be configured via environment variables
/// with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listening port for client connections
    pub port: u16,
    /// How accepted connections are handed to workers
    pub strategy: Strategy,
    /// Byte budget for the object cache
    pub max_cache_size: usize,
    /// Largest response that will be cached
    pub max_object_size: usize,
    /// Answer request errors with an HTTP status instead of closing silently
    pub reply_on_error: bool,
    /// Port for the statistics endpoint, disabled when None
    pub stats_port: Option<u16>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PROXY_STRATEGY` - `sequential`, `process` or `thread` (default: thread)
    /// - `MAX_CACHE_SIZE` - Cache byte budget (default: 1049000)
    /// - `MAX_OBJECT_SIZE` - Largest cacheable response (default: 102400)
    /// - `PROXY_REPLY_ERRORS` - `1`/`true` to send 400/501/502 (default: off)
    /// - `STATS_PORT` - Statistics endpoint port (default: disabled)
    ///
    /// # Errors
    /// An unknown strategy name is rejected rather than silently defaulted.
    pub fn from_env(port: u16) -> Result<Self> {
        let strategy = match env::var("PROXY_STRATEGY") {
            Ok(name) => name.parse()?,
            Err(_) => Strategy::default(),
        };

        Ok(Self {
            port,
            strategy,
            max_cache_size: env::var("MAX_CACHE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CACHE_SIZE),
            max_object_size: env::var("MAX_OBJECT_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_OBJECT_SIZE),
            reply_on_error: env::var("PROXY_REPLY_ERRORS")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            stats_port: env::var("STATS_PORT").ok().and_then(|v| v.parse().ok()),
        })
    }

    /// Same settings with a different strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 0,
            strategy: Strategy::default(),
            max_cache_size: MAX_CACHE_SIZE,
            max_object_size: MAX_OBJECT_SIZE,
            reply_on_error: false,
            stats_port: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.strategy, Strategy::ThreadPerConnection);
        assert_eq!(config.max_cache_size, 1_049_000);
        assert_eq!(config.max_object_size, 102_400);
        assert!(!config.reply_on_error);
        assert!(config.stats_port.is_none());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("PROXY_STRATEGY");
        env::remove_var("MAX_CACHE_SIZE");
        env::remove_var("MAX_OBJECT_SIZE");
        env::remove_var("PROXY_REPLY_ERRORS");
        env::remove_var("STATS_PORT");

        let config = Config::from_env(8080).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.strategy, Strategy::ThreadPerConnection);
        assert_eq!(config.max_cache_size, MAX_CACHE_SIZE);
        assert_eq!(config.max_object_size, MAX_OBJECT_SIZE);
        assert!(!config.reply_on_error);
    }

    #[test]
    fn test_with_strategy() {
        let config = Config::default().with_strategy(Strategy::Sequential);
        assert_eq!(config.strategy, Strategy::Sequential);
    }

    #[test]
    fn test_invocation_port() {
        let invocation = Invocation::from_args(args(&["cache_proxy", "15213"])).unwrap();
        assert_eq!(invocation, Invocation::Serve { port: 15213 });
    }

    #[test]
    fn test_invocation_worker() {
        let invocation = Invocation::from_args(args(&["cache_proxy", WORKER_FLAG])).unwrap();
        assert_eq!(invocation, Invocation::Worker);
    }

    #[test]
    fn test_invocation_wrong_argument_count() {
        let err = Invocation::from_args(args(&["cache_proxy"])).unwrap_err();
        assert!(matches!(err, ProxyError::Usage(_)));
        assert_eq!(err.to_string(), "usage: cache_proxy <port>");

        let err = Invocation::from_args(args(&["cache_proxy", "1", "2"])).unwrap_err();
        assert!(matches!(err, ProxyError::Usage(_)));
    }

    #[test]
    fn test_invocation_bad_port() {
        let err = Invocation::from_args(args(&["cache_proxy", "http"])).unwrap_err();
        assert!(matches!(err, ProxyError::Usage(_)));
    }
}
