//! HTTP front end for `occur-core`.
//!
//! Loads a JSON snapshot of base events, then answers window and upcoming
//! queries per principal.

pub mod cli;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::router;
