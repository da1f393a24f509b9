//! API Module
//!
//! Optional HTTP endpoint exposing cache statistics.
//!
//! # Endpoints
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
