//! # Jeason Library
//!
//! This library exposes the Jeason server modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod files;
pub mod gateway;
pub mod notify;

// Re-export jeason_core for convenience
pub use jeason_core;
