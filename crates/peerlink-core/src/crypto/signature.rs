// ============================================
// File: crates/peerlink-core/src/crypto/signature.rs
// ============================================
//! # Signature Engine
//!
//! `sign(m) = m^d mod n`, `verify(m, s) = (s^e mod n == m)`.
//!
//! Verification is a predicate. Callers turn `false` into an authentication
//! error of their own; [`verify_strict`] does that for core callers.
//!
//! ## Last Modified
//! v0.1.0 - Initial signature engine

use super::arith::mod_pow;
use super::keys::{KeyPair, PublicKey};
use crate::error::{CoreError, Result};

/// Signs `message` with the private exponent of `key_pair`.
///
/// # Errors
/// [`CoreError::KeyMaterial`] when `message` is not below the modulus.
pub fn sign(message: u64, key_pair: &KeyPair) -> Result<u64> {
    if message >= key_pair.modulus() {
        return Err(CoreError::key_material(format!(
            "message does not fit signing modulus {}",
            key_pair.modulus()
        )));
    }
    Ok(key_pair.apply_private(message))
}

/// Returns `true` when `signature` is a valid signature of `message`.
///
/// Only the canonical residue is accepted: `signature + k·n` is rejected
/// even though it reduces to the same value.
#[must_use]
pub fn verify(message: u64, signature: u64, public_key: &PublicKey) -> bool {
    message < public_key.modulus
        && signature < public_key.modulus
        && mod_pow(signature, public_key.exponent, public_key.modulus) == message
}

/// [`verify`], mapping a mismatch to [`CoreError::SignatureVerification`].
///
/// # Errors
/// [`CoreError::SignatureVerification`] when the signature does not match.
pub fn verify_strict(message: u64, signature: u64, public_key: &PublicKey) -> Result<()> {
    if verify(message, signature, public_key) {
        Ok(())
    } else {
        Err(CoreError::SignatureVerification)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT, TOY_PRIME_POOL};
    use proptest::prelude::*;

    #[test]
    fn test_sign_verify_known_key() {
        let pair = KeyPair::from_parts(3233, 17, 2753).unwrap();
        let signature = sign(65, &pair).unwrap();
        assert_eq!(signature, 588);
        assert!(verify(65, signature, &pair.public_key()));
        assert!(!verify(66, signature, &pair.public_key()));
    }

    #[test]
    fn test_mismatched_keys_reject() {
        // n = 11·13 = 143, φ = 120, e = 7, d = 103
        let signer = KeyPair::from_parts(143, 7, 103).unwrap();
        // n = 17·19 = 323, φ = 288, e = 5, d = 173
        let other = KeyPair::from_parts(323, 5, 173).unwrap();

        let message = 42;
        let signature = sign(message, &signer).unwrap();
        assert!(verify(message, signature, &signer.public_key()));
        assert!(!verify(message, signature, &other.public_key()));
        assert!(matches!(
            verify_strict(message, signature, &other.public_key()),
            Err(CoreError::SignatureVerification)
        ));
    }

    #[test]
    fn test_non_canonical_signature_rejected() {
        let pair = KeyPair::from_parts(3233, 17, 2753).unwrap();
        let signature = sign(65, &pair).unwrap();
        assert!(!verify(65, signature + 3233, &pair.public_key()));
        assert!(!verify(65, signature + 2 * 3233, &pair.public_key()));
        assert!(verify_strict(65, signature + 3233, &pair.public_key()).is_err());
    }

    #[test]
    fn test_sign_rejects_oversized_message() {
        let pair = KeyPair::from_parts(143, 7, 103).unwrap();
        assert!(sign(143, &pair).is_err());
        assert!(!verify(143, 0, &pair.public_key()));
    }

    proptest! {
        #[test]
        fn prop_sign_verify_round_trip(message in 0u64..(101 * 103)) {
            let pair = KeyPair::generate(DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT).unwrap();
            let signature = sign(message, &pair).unwrap();
            prop_assert!(verify(message, signature, &pair.public_key()));
        }

        #[test]
        fn prop_toy_pool_round_trip(message in 0u64..143) {
            let pair = KeyPair::generate(TOY_PRIME_POOL, 3).unwrap();
            let signature = sign(message, &pair).unwrap();
            prop_assert!(verify_strict(message, signature, &pair.public_key()).is_ok());
        }
    }
}
