// ============================================
// File: crates/peerlink-core/src/crypto/handshake.rs
// ============================================
//! # Handshake and Message Cryptography
//!
//! ## Creation Reason
//! Bundles the arithmetic needed by both handshake roles and by the
//! messaging path behind one trait, so node services can be tested
//! against a mock.
//!
//! ## Main Functionality
//! - `HandshakeCrypto`: Trait for handshake and message crypto
//! - `DefaultHandshakeCrypto`: Implementation over the peer's `KeyPair`
//! - `message_digest`: Character-code sum used as the signed value
//!
//! ## Handshake Flow
//! ```text
//! Initiator A                                   Responder B
//!   │ draw secret s                                 │
//!   │ sig = s^d_A mod n_A                           │
//!   │ HANDSHAKE / A / s^e_B, sig^e_B ─────────────► │
//!   │                         decrypt with d_B      │
//!   │                         verify sig with (n_A, e_A)
//!   │ ◄──────────────────────────────── HS_OK/FAIL  │
//!   │ key = s mod 26                 key = s mod 26 │
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The signature is computed modulo `n_A` but encrypted modulo `n_B`.
//!   When `sig >= n_B` it cannot survive, so `create_offer` redraws the
//!   secret instead of sending an offer that must fail
//! - Message digests are reduced modulo the signer's modulus on both ends
//!
//! ## Last Modified
//! v0.1.0 - Initial handshake crypto implementation

use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};

use super::cipher::SymmetricKey;
use super::keys::{KeyPair, PublicKey};
use super::signature::{sign, verify_strict};
use crate::error::{CoreError, Result};
use crate::protocol::messages::{HandshakeOffer, SealedMessage};

/// Default inclusive range for session secrets.
pub const DEFAULT_SECRET_RANGE: RangeInclusive<u64> = 2..=50;

/// Most secrets tried per offer. Ranges up to this size are tried
/// exhaustively, larger ones by independent random draws.
pub const MAX_SECRET_DRAWS: u64 = 1024;

/// Candidate secrets from `start..=upper` in random order.
fn secret_candidates(start: u64, upper: u64) -> Vec<u64> {
    if start > upper {
        return Vec::new();
    }
    let mut rng = rand::thread_rng();
    if upper - start < MAX_SECRET_DRAWS {
        let mut all: Vec<u64> = (start..=upper).collect();
        all.shuffle(&mut rng);
        all
    } else {
        (0..MAX_SECRET_DRAWS).map(|_| rng.gen_range(start..=upper)).collect()
    }
}

// ============================================
// Digest
// ============================================

/// Sum of the character codes of `ciphertext`, reduced modulo `modulus`.
#[must_use]
pub fn message_digest(ciphertext: &str, modulus: u64) -> u64 {
    let sum = ciphertext
        .chars()
        .fold(0u64, |acc, c| acc.wrapping_add(u64::from(u32::from(c))));
    if modulus == 0 {
        sum
    } else {
        sum % modulus
    }
}

// ============================================
// HandshakeCrypto Trait
// ============================================

/// Cryptographic operations needed by the handshake and messaging services.
pub trait HandshakeCrypto: Send + Sync {
    /// Returns this peer's public key.
    fn public_key(&self) -> PublicKey;

    /// Initiator: draws a secret, signs it and encrypts both under
    /// `counterpart`.
    ///
    /// # Errors
    /// [`CoreError::KeyMaterial`] when no secret of the range can be carried
    /// by the counterpart's modulus.
    fn create_offer(&self, counterpart: &PublicKey) -> Result<(u64, HandshakeOffer)>;

    /// Responder: decrypts an offer and verifies it against `sender`.
    ///
    /// # Errors
    /// [`CoreError::SignatureVerification`] when the signature does not match.
    fn accept_offer(&self, offer: &HandshakeOffer, sender: &PublicKey) -> Result<u64>;

    /// Encrypts `plaintext` under `key` and signs its digest.
    ///
    /// # Errors
    /// Signing errors from the key pair.
    fn seal_message(&self, plaintext: &str, key: &SymmetricKey) -> Result<SealedMessage>;

    /// Verifies `sealed` against `sender` and decrypts it under `key`.
    ///
    /// # Errors
    /// [`CoreError::SignatureVerification`] when the digest signature does
    /// not match; nothing is decrypted in that case.
    fn open_message(
        &self,
        sealed: &SealedMessage,
        key: &SymmetricKey,
        sender: &PublicKey,
    ) -> Result<String>;
}

// ============================================
// DefaultHandshakeCrypto
// ============================================

/// Handshake crypto over this peer's key pair.
///
/// # Example
/// ```
/// use peerlink_core::crypto::{DefaultHandshakeCrypto, HandshakeCrypto, KeyPair};
/// use peerlink_core::crypto::keys::{DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT};
///
/// let alice = DefaultHandshakeCrypto::new(
///     KeyPair::generate(DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT).unwrap(),
/// );
/// let bob = DefaultHandshakeCrypto::new(
///     KeyPair::generate(DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT).unwrap(),
/// );
///
/// let (secret, offer) = alice.create_offer(&bob.public_key()).unwrap();
/// assert_eq!(bob.accept_offer(&offer, &alice.public_key()).unwrap(), secret);
/// ```
#[derive(Debug)]
pub struct DefaultHandshakeCrypto {
    identity: KeyPair,
    secret_range: RangeInclusive<u64>,
}

impl DefaultHandshakeCrypto {
    /// Creates a handshake crypto instance with the default secret range.
    #[must_use]
    pub fn new(identity: KeyPair) -> Self {
        Self {
            identity,
            secret_range: DEFAULT_SECRET_RANGE,
        }
    }

    /// Sets the inclusive range session secrets are drawn from.
    #[must_use]
    pub fn with_secret_range(mut self, range: RangeInclusive<u64>) -> Self {
        self.secret_range = range;
        self
    }

    /// Returns the key pair.
    #[must_use]
    pub const fn identity(&self) -> &KeyPair {
        &self.identity
    }
}

impl HandshakeCrypto for DefaultHandshakeCrypto {
    fn public_key(&self) -> PublicKey {
        self.identity.public_key()
    }

    fn create_offer(&self, counterpart: &PublicKey) -> Result<(u64, HandshakeOffer)> {
        // Both moduli bound the secret; an empty clamped range falls through
        let start = *self.secret_range.start();
        let upper = (*self.secret_range.end())
            .min(counterpart.modulus.saturating_sub(1))
            .min(self.identity.modulus().saturating_sub(1));

        for secret in secret_candidates(start, upper) {
            let signature = sign(secret, &self.identity)?;
            if signature >= counterpart.modulus {
                trace!(modulus = counterpart.modulus, "Signature too large, redrawing secret");
                continue;
            }
            let offer = HandshakeOffer {
                encrypted_secret: counterpart.encrypt(secret)?,
                encrypted_signature: counterpart.encrypt(signature)?,
            };
            debug!(counterpart_key = %counterpart, "Handshake offer created");
            return Ok((secret, offer));
        }

        Err(CoreError::key_material(format!(
            "no session secret in {:?} fits counterpart modulus {}",
            self.secret_range, counterpart.modulus
        )))
    }

    fn accept_offer(&self, offer: &HandshakeOffer, sender: &PublicKey) -> Result<u64> {
        let secret = self.identity.decrypt(offer.encrypted_secret);
        let signature = self.identity.decrypt(offer.encrypted_signature);
        verify_strict(secret, signature, sender)?;
        debug!(sender_key = %sender, "Handshake offer verified");
        Ok(secret)
    }

    fn seal_message(&self, plaintext: &str, key: &SymmetricKey) -> Result<SealedMessage> {
        let ciphertext = key.encrypt(plaintext);
        let digest = message_digest(&ciphertext, self.identity.modulus());
        let signature = sign(digest, &self.identity)?;
        Ok(SealedMessage {
            ciphertext,
            signature,
        })
    }

    fn open_message(
        &self,
        sealed: &SealedMessage,
        key: &SymmetricKey,
        sender: &PublicKey,
    ) -> Result<String> {
        let digest = message_digest(&sealed.ciphertext, sender.modulus);
        verify_strict(digest, sealed.signature, sender)?;
        Ok(key.decrypt(&sealed.ciphertext))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT};

    fn peer() -> DefaultHandshakeCrypto {
        DefaultHandshakeCrypto::new(
            KeyPair::generate(DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT).unwrap(),
        )
    }

    #[test]
    fn test_digest() {
        assert_eq!(message_digest("AB", 1000), 65 + 66);
        assert_eq!(message_digest("AB", 100), 31);
        assert_eq!(message_digest("", 100), 0);
    }

    #[test]
    fn test_offer_round_trip() {
        for _ in 0..50 {
            let alice = peer();
            let bob = peer();
            let (secret, offer) = alice.create_offer(&bob.public_key()).unwrap();
            assert!(DEFAULT_SECRET_RANGE.contains(&secret));
            assert_eq!(bob.accept_offer(&offer, &alice.public_key()).unwrap(), secret);
        }
    }

    #[test]
    fn test_offer_rejected_for_wrong_sender_key() {
        let alice = KeyPair::from_parts(143, 7, 103).unwrap();
        let bob = DefaultHandshakeCrypto::new(KeyPair::from_parts(3233, 17, 2753).unwrap());
        let mallory = KeyPair::from_parts(323, 5, 173).unwrap();

        let alice = DefaultHandshakeCrypto::new(alice);
        let (_, offer) = alice.create_offer(&bob.public_key()).unwrap();
        assert!(bob.accept_offer(&offer, &alice.public_key()).is_ok());
        assert!(matches!(
            bob.accept_offer(&offer, &mallory.public_key()),
            Err(CoreError::SignatureVerification)
        ));
    }

    #[test]
    fn test_offer_fails_when_nothing_fits() {
        // Every allowed secret is above the counterpart modulus
        let alice = DefaultHandshakeCrypto::new(KeyPair::from_parts(3233, 17, 2753).unwrap())
            .with_secret_range(200..=300);
        let err = alice.create_offer(&PublicKey::new(143, 7)).unwrap_err();
        assert!(matches!(err, CoreError::KeyMaterial { .. }));
    }

    #[test]
    fn test_wide_secret_range_is_sampled() {
        // n close to 2^62 with the full u64 range allowed
        let pair = KeyPair::generate(&[2_147_483_647, 2_147_483_629], DEFAULT_PUBLIC_EXPONENT).unwrap();
        let alice = DefaultHandshakeCrypto::new(pair).with_secret_range(2..=u64::MAX);

        let (secret, offer) = alice.create_offer(&alice.public_key()).unwrap();
        assert!(secret >= 2 && secret < alice.identity().modulus());
        assert_eq!(alice.accept_offer(&offer, &alice.public_key()).unwrap(), secret);
    }

    #[test]
    fn test_candidates_cover_small_range() {
        let mut all = secret_candidates(2, 50);
        all.sort_unstable();
        assert_eq!(all, (2..=50).collect::<Vec<_>>());
        assert!(secret_candidates(10, 9).is_empty());
        assert_eq!(secret_candidates(0, u64::MAX).len() as u64, MAX_SECRET_DRAWS);
    }

    #[test]
    fn test_message_round_trip() {
        let alice = peer();
        let bob = peer();
        let key = SymmetricKey::from_secret(29);

        let sealed = alice.seal_message("HELLO", &key).unwrap();
        assert_eq!(sealed.ciphertext, "KHOOR");
        assert_eq!(bob.open_message(&sealed, &key, &alice.public_key()).unwrap(), "HELLO");
    }

    #[test]
    fn test_tampered_message_rejected() {
        let alice = DefaultHandshakeCrypto::new(KeyPair::from_parts(3233, 17, 2753).unwrap());
        let key = SymmetricKey::from_secret(3);
        let mut sealed = alice.seal_message("HELLO", &key).unwrap();
        sealed.signature = (sealed.signature + 1) % 3233;

        let err = alice.open_message(&sealed, &key, &alice.public_key()).unwrap_err();
        assert!(matches!(err, CoreError::SignatureVerification));
    }

    #[test]
    fn test_signature_shifted_by_modulus_rejected() {
        let alice = DefaultHandshakeCrypto::new(KeyPair::from_parts(3233, 17, 2753).unwrap());
        let key = SymmetricKey::from_secret(3);
        let mut sealed = alice.seal_message("HELLO", &key).unwrap();
        sealed.signature += 3233;

        let err = alice.open_message(&sealed, &key, &alice.public_key()).unwrap_err();
        assert!(matches!(err, CoreError::SignatureVerification));
    }
}
