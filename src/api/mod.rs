//! API Module
//!
//! HTTP handlers and routing for the demo feed server. The server plays the
//! part of an infinite-scroll screen: it reads the loader's state and calls
//! `load_more` / `refresh` on request.
//!
//! # Endpoints
//! - `GET /feed` - Current loader state
//! - `POST /feed/more` - Load the next page
//! - `POST /feed/refresh` - Drop cached pages and reload from the first page
//! - `GET /cache/stats` - Page cache statistics
//! - `GET /cache/keys` - Fresh page cache keys
//! - `DELETE /cache/:key` - Remove one cached page
//! - `DELETE /cache` - Remove every cached page
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
