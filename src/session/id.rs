//! Session identifier type.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

/// Characters used for generated IDs.
const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated IDs.
pub const SESSION_ID_LEN: usize = 32;

/// Opaque identifier of a browser session, carried in the session cookie.
///
/// Generated IDs are 32 random characters from `A-Z0-9`. Parsed IDs only
/// need to be non-empty ASCII alphanumerics, so IDs issued by older
/// deployments keep working.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new random session ID.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..SESSION_ID_LEN)
            .map(|_| ID_CHARSET[rng.random_range(0..ID_CHARSET.len())] as char)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = crate::error::DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(Self(s.to_string()))
        } else {
            Err(crate::error::DispatchError::InvalidSessionId(s.into()))
        }
    }
}
