//! Tiered stream resolution.
//!
//! Turns a [`MediaId`](podstream_common::MediaId) into a playable URL by
//! racing third-party mirrors tier by tier, then falling back to the local
//! extraction engine.
//!
//! # Module layout
//!
//! - [`registry`] -- Static, tiered mirror list.
//! - [`fetcher`] -- The per-mirror fetch trait and its HTTP implementation.
//! - [`providers`] -- Piped and Invidious response schemas.
//! - [`race`] -- First-success race over one tier.
//! - [`rank`] -- Candidate ordering inside a winning tier.
//! - [`tiers`] -- The stage machine tying it all together.

pub mod fetcher;
pub mod providers;
pub mod race;
pub mod rank;
pub mod registry;
pub mod tiers;

pub use fetcher::{HttpMirrorFetcher, MirrorError, MirrorFetcher};
pub use race::race;
pub use registry::{Mirror, MirrorRegistry};
pub use tiers::{ResolverSettings, Stage, TierResolver};
