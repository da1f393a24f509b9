//! Server Module
//!
//! Accept loop and the concurrency strategies behind it.
//!
//! # Strategies
//! - `sequential` - serve each connection on the accept loop
//! - `process` - one worker process per connection
//! - `thread` - one task per connection, shared cache

pub mod acceptor;
pub mod process;
pub mod strategy;

pub use acceptor::Acceptor;
pub use process::{serve_inherited_connection, WorkerLauncher};
pub use strategy::{handle_connection, Dispatcher, Strategy};
