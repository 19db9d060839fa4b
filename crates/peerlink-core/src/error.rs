// ============================================
// File: crates/peerlink-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Error type for the arithmetic, key, signature and wire-protocol code in
//! `peerlink-core`.
//!
//! ## Error Categories
//! 1. **Arithmetic / key errors**: non-invertible values, bad prime pools,
//!    key material too small for a value
//! 2. **Authentication errors**: signature did not verify
//! 3. **Protocol errors**: malformed lines, unknown tags, oversized lines
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include private exponents or session secrets in error messages
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use peerlink_common::error::CommonError;
use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for arithmetic, cryptographic and protocol operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Arithmetic / Key Errors
    // ========================================

    /// `value` has no inverse modulo `modulus`.
    #[error("{value} is not invertible modulo {modulus}")]
    NotInvertible {
        /// Value whose inverse was requested
        value: u64,
        /// Modulus
        modulus: u64,
    },

    /// Failed to generate a key pair.
    #[error("Key generation failed: {context}")]
    KeyGeneration {
        /// Why generation failed
        context: String,
    },

    /// Key material cannot carry the requested value.
    #[error("Key material error: {reason}")]
    KeyMaterial {
        /// What did not fit
        reason: String,
    },

    // ========================================
    // Authentication Errors
    // ========================================

    /// Signature verification failed.
    #[error("Signature verification failed")]
    SignatureVerification,

    // ========================================
    // Protocol Errors
    // ========================================

    /// Unknown envelope or command tag.
    #[error("Unknown message tag: {0:?}")]
    UnknownTag(String),

    /// Line is malformed.
    #[error("Malformed message: {reason}")]
    MalformedMessage {
        /// What's wrong with the message
        reason: String,
    },

    /// Line exceeds maximum allowed size.
    #[error("Line too long: max {max} bytes, got {actual}")]
    LineTooLong {
        /// Maximum allowed size
        max: usize,
        /// Actual size received
        actual: usize,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `KeyGeneration` error.
    pub fn key_generation(context: impl Into<String>) -> Self {
        Self::KeyGeneration {
            context: context.into(),
        }
    }

    /// Creates a `KeyMaterial` error.
    pub fn key_material(reason: impl Into<String>) -> Self {
        Self::KeyMaterial {
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedMessage` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` for arithmetic or key-material failures.
    #[must_use]
    pub const fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::NotInvertible { .. }
                | Self::KeyGeneration { .. }
                | Self::KeyMaterial { .. }
                | Self::SignatureVerification
        )
    }

    /// Returns `true` if the peer sent something unparsable.
    #[must_use]
    pub const fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTag(_)
                | Self::MalformedMessage { .. }
                | Self::LineTooLong { .. }
                | Self::Common(CommonError::InvalidPeerId(_))
        )
    }

    /// Returns `true` if this error might indicate tampering.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(self, Self::SignatureVerification)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use peerlink_common::types::PeerIdError;

    #[test]
    fn test_error_display() {
        let err = CoreError::NotInvertible { value: 4, modulus: 8 };
        assert_eq!(err.to_string(), "4 is not invertible modulo 8");

        let err = CoreError::LineTooLong { max: 4096, actual: 5000 };
        assert!(err.to_string().contains("4096"));
    }

    #[test]
    fn test_error_classification() {
        assert!(CoreError::SignatureVerification.is_crypto_error());
        assert!(CoreError::SignatureVerification.is_suspicious());
        assert!(!CoreError::SignatureVerification.is_protocol_error());

        let malformed = CoreError::malformed("missing exponent");
        assert!(malformed.is_protocol_error());
        assert!(!malformed.is_crypto_error());

        assert!(CoreError::UnknownTag("PING".into()).is_protocol_error());
        assert!(CoreError::key_material("signature exceeds modulus").is_crypto_error());
    }

    #[test]
    fn test_invalid_identity_is_protocol_error() {
        let err: CoreError = CommonError::from(PeerIdError::Empty).into();
        assert!(matches!(err, CoreError::Common(_)));
        assert!(err.is_protocol_error());
    }
}
