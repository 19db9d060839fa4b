// ============================================
// File: crates/peerlink-core/src/crypto/keys.rs
// ============================================
//! # Key Types
//!
//! ## Creation Reason
//! Every peer owns one RSA-style key pair for its whole process lifetime.
//! The public half is published to the directory; the private exponent
//! signs outbound values and decrypts inbound handshake offers.
//!
//! ## Main Functionality
//! - `PublicKey`: `(modulus, exponent)`, what the directory stores
//! - `KeyPair`: public half plus private exponent, zeroed on drop
//! - `KeyPair::generate`: draw two distinct primes from a pool and derive
//!   the exponents
//!
//! ## Key Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  KeyPair (process lifetime)                                │
//! │  ├─ Generated once at peer startup                         │
//! │  ├─ Public half registered with the directory              │
//! │  ├─ Private exponent signs secrets and message digests     │
//! │  └─ Private exponent decrypts handshake offers             │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Toy key sizes: a modulus is the product of two small pool primes
//! - `KeyPair` has no `Clone` and no `Serialize`; the private exponent
//!   never leaves the process and never appears in `Debug` output
//! - zeroize 1.3 has no `ZeroizeOnDrop` derive, hence the manual `Drop`
//!
//! ## Last Modified
//! v0.1.0 - Initial key types

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::arith::{gcd, is_prime, mod_inverse, mod_pow};
use crate::error::{CoreError, Result};

// ============================================
// Constants
// ============================================

/// Default prime pool.
pub const DEFAULT_PRIME_POOL: &[u64] = &[101, 103, 107, 109, 113, 127, 131, 137, 139];

/// Small prime pool. Moduli drawn from it are small enough that most
/// values collide, which makes mismatched-key behaviour easy to observe.
pub const TOY_PRIME_POOL: &[u64] = &[11, 13, 17, 19, 23, 29, 31];

/// First public exponent candidate; stepped by 2 until coprime with φ.
pub const DEFAULT_PUBLIC_EXPONENT: u64 = 17;

// ============================================
// PublicKey
// ============================================

/// Public half of a key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    /// `n = p·q`
    pub modulus: u64,
    /// `e`, coprime with φ(n)
    pub exponent: u64,
}

impl PublicKey {
    /// Creates a public key from its parts.
    #[must_use]
    pub const fn new(modulus: u64, exponent: u64) -> Self {
        Self { modulus, exponent }
    }

    /// Encrypts `value` under this key.
    ///
    /// # Errors
    /// [`CoreError::KeyMaterial`] when `value` is not below the modulus and
    /// would not survive the round trip.
    pub fn encrypt(&self, value: u64) -> Result<u64> {
        if value >= self.modulus {
            return Err(CoreError::key_material(format!(
                "value does not fit modulus {}",
                self.modulus
            )));
        }
        Ok(mod_pow(value, self.exponent, self.modulus))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.modulus, self.exponent)
    }
}

// ============================================
// KeyPair
// ============================================

/// RSA-style key pair.
///
/// # Example
/// ```
/// use peerlink_core::crypto::keys::{KeyPair, DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT};
///
/// let pair = KeyPair::generate(DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT).unwrap();
/// let public = pair.public_key();
/// let cipher = public.encrypt(42).unwrap();
/// assert_eq!(pair.decrypt(cipher), 42);
/// ```
pub struct KeyPair {
    public: PublicKey,
    private_exponent: u64,
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.private_exponent.zeroize();
    }
}

impl KeyPair {
    /// Generates a key pair from two distinct primes of `pool`.
    ///
    /// `initial_exponent` must be odd and at least 3; it is increased by 2
    /// until it is coprime with φ(n).
    ///
    /// # Errors
    /// [`CoreError::KeyGeneration`] when the pool holds fewer than two
    /// distinct primes, contains a non-prime, or the exponent is invalid.
    pub fn generate(pool: &[u64], initial_exponent: u64) -> Result<Self> {
        Self::generate_with_rng(pool, initial_exponent, &mut rand::thread_rng())
    }

    /// [`KeyPair::generate`] with a caller-supplied RNG.
    ///
    /// # Errors
    /// Same as [`KeyPair::generate`].
    pub fn generate_with_rng<R: Rng + ?Sized>(
        pool: &[u64],
        initial_exponent: u64,
        rng: &mut R,
    ) -> Result<Self> {
        validate_pool(pool)?;
        if initial_exponent < 3 || initial_exponent % 2 == 0 {
            return Err(CoreError::key_generation(format!(
                "public exponent must be odd and >= 3, got {initial_exponent}"
            )));
        }

        let mut primes: Vec<u64> = pool.to_vec();
        primes.sort_unstable();
        primes.dedup();

        let mut chosen = primes.choose_multiple(rng, 2).copied();
        let (p, q) = match (chosen.next(), chosen.next()) {
            (Some(p), Some(q)) => (p, q),
            _ => return Err(CoreError::key_generation("prime pool exhausted")),
        };

        let modulus = p
            .checked_mul(q)
            .ok_or_else(|| CoreError::key_generation("modulus overflows u64"))?;
        let phi = (p - 1) * (q - 1);

        let mut exponent = initial_exponent;
        while gcd(exponent, phi) != 1 {
            exponent += 2;
        }
        let private_exponent = mod_inverse(exponent, phi)?;

        Ok(Self {
            public: PublicKey::new(modulus, exponent),
            private_exponent,
        })
    }

    /// Rebuilds a key pair from known parts.
    ///
    /// # Errors
    /// [`CoreError::KeyMaterial`] when the exponents do not invert each
    /// other modulo `modulus`.
    pub fn from_parts(modulus: u64, public_exponent: u64, private_exponent: u64) -> Result<Self> {
        if modulus < 6 || public_exponent == 0 || private_exponent == 0 {
            return Err(CoreError::key_material("degenerate key parts"));
        }
        let sample = 2 % modulus;
        let round_trip = mod_pow(mod_pow(sample, public_exponent, modulus), private_exponent, modulus);
        if round_trip != sample {
            return Err(CoreError::key_material("exponents are not inverse"));
        }
        Ok(Self {
            public: PublicKey::new(modulus, public_exponent),
            private_exponent,
        })
    }

    /// Returns the public half.
    #[must_use]
    pub const fn public_key(&self) -> PublicKey {
        self.public
    }

    /// Returns the modulus.
    #[must_use]
    pub const fn modulus(&self) -> u64 {
        self.public.modulus
    }

    /// Decrypts a value encrypted under [`KeyPair::public_key`].
    #[must_use]
    pub fn decrypt(&self, cipher: u64) -> u64 {
        mod_pow(cipher, self.private_exponent, self.public.modulus)
    }

    /// Raw private exponent operation, used by the signature engine.
    pub(crate) fn apply_private(&self, value: u64) -> u64 {
        mod_pow(value, self.private_exponent, self.public.modulus)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private_exponent", &"[REDACTED]")
            .finish()
    }
}

/// Checks a prime pool: at least two distinct entries, all prime.
///
/// # Errors
/// [`CoreError::KeyGeneration`] describing the first problem found.
pub fn validate_pool(pool: &[u64]) -> Result<()> {
    if let Some(bad) = pool.iter().find(|&&p| !is_prime(p)) {
        return Err(CoreError::key_generation(format!("{bad} is not prime")));
    }
    let mut distinct = pool.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 2 {
        return Err(CoreError::key_generation(
            "prime pool needs at least two distinct primes",
        ));
    }
    Ok(())
}

/// Smallest modulus `pool` can produce.
#[must_use]
pub fn min_modulus(pool: &[u64]) -> Option<u64> {
    let mut distinct = pool.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    match distinct.as_slice() {
        [a, b, ..] => a.checked_mul(*b),
        _ => None,
    }
}

// ============================================
// Tests
// ============================================
