//! Response models for the demo feed server
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing HTTP response bodies.

pub mod responses;

// Re-export commonly used types
pub use responses::{
    DeleteResponse, FeedResponse, HealthResponse, KeysResponse, LoadResponse, StatsResponse,
};
