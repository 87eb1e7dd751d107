//! Podstream-Common: shared types used across podstream.
//!
//! - **Media IDs**: a validated [`MediaId`] newtype, safe to interpolate into
//!   upstream URLs
//! - **Resolution types**: tiers, mirror schemas, candidates and results
//! - **Error Handling**: the crate-wide [`Error`] with HTTP status mapping
//!
//! # Examples
//!
//! ```
//! use podstream_common::{MediaId, ResolutionResult, Source};
//!
//! let id: MediaId = "fLexgOxsZu0".parse().unwrap();
//! let result = ResolutionResult::fallback(&id);
//! assert_eq!(result.source, Source::Fallback);
//! assert_eq!(result.url, "/stream/fLexgOxsZu0");
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::MediaId;
pub use types::*;
