// ============================================
// File: crates/peerlink-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Identity validation happens in the codec, the CLI and the config loader.
//! Wrapping it in one shared error keeps the message identical everywhere.
//!
//! ## Main Functionality
//! - `CommonError`: Base error enum for shared operations
//! - `Result<T>`: Type alias using `CommonError`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Crate-level errors wrap this one via `#[from]`
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use crate::types::PeerIdError;

// ============================================
// Result Type Alias
// ============================================

/// Common result type for operations that may fail.
pub type Result<T> = std::result::Result<T, CommonError>;

// ============================================
// CommonError
// ============================================

/// Common error types shared across PeerLink crates.
///
/// # Example
/// ```
/// use peerlink_common::error::{CommonError, Result};
/// use peerlink_common::types::PeerId;
///
/// fn identity(name: &str) -> Result<PeerId> {
///     Ok(PeerId::new(name)?)
/// }
///
/// assert!(matches!(identity("Alice Smith"), Err(CommonError::InvalidPeerId(_))));
/// ```
#[derive(Error, Debug)]
pub enum CommonError {
    /// A peer identity failed validation.
    #[error("Invalid peer identity: {0}")]
    InvalidPeerId(#[from] PeerIdError),
}

impl CommonError {
    /// Returns `true` if this error was caused by bad caller input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidPeerId(_))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PeerId;

    #[test]
    fn test_error_display() {
        let err: CommonError = PeerId::new("Alice Smith").unwrap_err().into();
        assert_eq!(
            err.to_string(),
            "Invalid peer identity: peer identity contains invalid character ' '"
        );
        assert!(err.is_client_error());
    }
}
