// ============================================
// File: crates/peerlink-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Creation Reason
//! Every PeerLink wire format is line and whitespace delimited, so the peer
//! identity needs one validated representation shared by the directory,
//! the key cache and the handshake.
//!
//! ## Main Functionality
//! - `PeerId`: Validated human-readable peer identity
//! - `PeerIdError`: Why a candidate identity was rejected
//!
//! ## ⚠️ Important Note for Next Developer
//! - A `PeerId` may never contain whitespace: `REGISTER` and `KEY` lines
//!   split on it
//! - Deserialization validates too, so a hand-edited keyring cannot smuggle
//!   an invalid identity in
//!
//! ## Last Modified
//! v0.1.0 - Initial identity type

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================
// Constants
// ============================================

/// Maximum identity length in bytes.
pub const MAX_PEER_ID_LEN: usize = 64;

// ============================================
// PeerIdError
// ============================================

/// Error type for `PeerId` parsing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerIdError {
    /// Identity was empty
    Empty,
    /// Identity exceeded [`MAX_PEER_ID_LEN`]
    TooLong {
        /// Actual length in bytes
        len: usize,
    },
    /// Identity contained whitespace or a control character
    InvalidChar(char),
}

impl fmt::Display for PeerIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "peer identity cannot be empty"),
            Self::TooLong { len } => write!(
                f,
                "peer identity is {len} bytes, maximum is {MAX_PEER_ID_LEN}"
            ),
            Self::InvalidChar(c) => {
                write!(f, "peer identity contains invalid character {c:?}")
            }
        }
    }
}

impl std::error::Error for PeerIdError {}

// ============================================
// PeerId
// ============================================

/// Unique human-readable name of a peer.
///
/// Used as the directory key, the key cache key, the session table key and
/// the sender field of every envelope.
///
/// # Example
/// ```
/// use peerlink_common::types::PeerId;
///
/// let alice: PeerId = "Alice".parse().unwrap();
/// assert_eq!(alice.as_str(), "Alice");
/// assert!("Alice Smith".parse::<PeerId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(String);

impl PeerId {
    /// Validates and wraps an identity.
    ///
    /// # Errors
    /// Returns [`PeerIdError`] when the name is empty, too long, or contains
    /// whitespace or control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, PeerIdError> {
        let name = name.into();
        if name.is_empty() {
            return Err(PeerIdError::Empty);
        }
        if name.len() > MAX_PEER_ID_LEN {
            return Err(PeerIdError::TooLong { len: name.len() });
        }
        if let Some(c) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(PeerIdError::InvalidChar(c));
        }
        Ok(Self(name))
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identity, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PeerId {
    type Err = PeerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PeerId {
    type Error = PeerIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for PeerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PeerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for PeerId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

// ============================================
// Tests
// ============================================
