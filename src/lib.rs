//! Cache Proxy - A forward HTTP/1.0 proxy with an in-memory object cache
//!
//! Relays GET and HEAD requests to origin servers and keeps small GET
//! responses in an LRU cache. Connections are served sequentially, by a
//! worker process each, or by a task each sharing one cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod server;
pub mod tasks;

pub use api::AppState;
pub use cache::{ObjectCache, SharedCache};
pub use config::{Config, Invocation};
pub use error::ProxyError;
pub use http::ForwardingPipeline;
pub use server::{Acceptor, Dispatcher, Strategy, WorkerLauncher};
pub use tasks::spawn_reaper_task;
