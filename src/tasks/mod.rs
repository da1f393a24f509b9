//! Background Tasks Module
//!
//! Contains background tasks that run alongside the accept loop.
//!
//! # Tasks
//! - Worker reaper: collects exited process-per-connection workers

mod reaper;

pub use reaper::{spawn_reaper_task, ReaperHandle};
