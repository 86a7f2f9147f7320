//! # Credito - Credit Analysis Desk
//!
//! Library surface of the desk application: the HTTP API (axum router,
//! handlers, auth), the CLI commands and the toml configuration layer.
//! All domain logic lives in `credito-core`; this crate owns the clock,
//! the wire formats and the role gating.

pub mod api;
pub mod cli;
pub mod config;
