//! Audio streaming.
//!
//! The `/stream/{id}` route re-resolves the identifier and relays the
//! winning upstream URL through [`ProxyStreamer`], honouring Range requests.

mod proxy;

pub use proxy::{bounded_chunks, ProxyStreamer};
