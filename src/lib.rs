//! Podstream - tiered audio stream resolver
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod extractor;
pub mod resolver;
pub mod server;
pub mod streaming;
