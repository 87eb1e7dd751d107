//! Validated media identifier.
//!
//! Identifiers arrive from untrusted path segments and are interpolated into
//! mirror URLs and extractor command lines, so they are restricted to the
//! URL-safe alphabet used by video ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Upper bound on identifier length.
pub const MAX_ID_LEN: usize = 64;

/// Opaque media identifier (e.g. a YouTube video id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MediaId(String);

impl MediaId {
    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

impl FromStr for MediaId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::invalid_id("empty"));
        }
        if s.len() > MAX_ID_LEN {
            return Err(Error::invalid_id(format!(
                "longer than {} characters",
                MAX_ID_LEN
            )));
        }
        if !s.chars().all(is_id_char) {
            return Err(Error::invalid_id(s));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for MediaId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MediaId> for String {
    fn from(id: MediaId) -> Self {
        id.0
    }
}

impl AsRef<str> for MediaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
