//! Response models for the statistics endpoint
//!
//! This module defines the DTOs serialized by the stats router.

pub mod responses;

pub use responses::{HealthResponse, StatsResponse};
