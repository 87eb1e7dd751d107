//! Common error type for podstream.
//!
//! Mirror and extraction failures never reach this type: they are absorbed by
//! the tier fallback. What remains are the failures a caller can actually see.

/// Unified error type surfaced by the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The media identifier failed validation.
    #[error("Invalid media id: {0}")]
    InvalidId(String),

    /// Every resolution tier failed, so there is nothing to stream.
    #[error("No playable stream found for {0}")]
    NoStream(String),

    /// The proxied upstream refused the request or dropped before any byte.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new InvalidId error.
    pub fn invalid_id<S: Into<String>>(msg: S) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Create a new NoStream error.
    pub fn no_stream<S: Into<String>>(id: S) -> Self {
        Self::NoStream(id.into())
    }

    /// Create a new Upstream error.
    pub fn upstream<S: Into<String>>(msg: S) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Map this error to an HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidId(_) => 400,
            Self::NoStream(_) => 502,
            Self::Upstream(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "invalid_id",
            Self::NoStream(_) => "no_stream",
            Self::Upstream(_) => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_id("a/b");
        assert_eq!(err.to_string(), "Invalid media id: a/b");

        let err = Error::no_stream("abc");
        assert_eq!(err.to_string(), "No playable stream found for abc");

        let err = Error::upstream("status 404");
        assert_eq!(err.to_string(), "Upstream error: status 404");

        let err = Error::internal("unexpected state");
        assert_eq!(err.to_string(), "Internal error: unexpected state");
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(Error::invalid_id("x").http_status(), 400);
        assert_eq!(Error::no_stream("x").http_status(), 502);
        assert_eq!(Error::upstream("x").http_status(), 502);
        assert_eq!(Error::internal("x").http_status(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::invalid_id("x").code(), "invalid_id");
        assert_eq!(Error::no_stream("x").code(), "no_stream");
        assert_eq!(Error::upstream("x").code(), "upstream_error");
        assert_eq!(Error::internal("x").code(), "internal_error");
    }
}
