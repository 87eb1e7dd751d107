//! Mirror response schemas.
//!
//! Each submodule knows the URL layout and JSON shape of one mirror family
//! and turns a response body into [`StreamCandidate`](podstream_common::StreamCandidate)s.

pub mod invidious;
pub mod piped;
