//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Sweep: removes expired cache entries at a configured interval

mod sweep;

pub use sweep::spawn_sweep_task;
