//! API module for HTTP endpoints
//!
//! This module provides the REST surface in front of the access ledger.

pub mod http;
pub mod rest;
pub mod state;

pub use http::create_router;
pub use state::AppState;
