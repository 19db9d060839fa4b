// ============================================
// File: crates/peerlink-core/src/crypto/arith.rs
// ============================================
//! # Number-Theoretic Primitives
//!
//! ## Main Functionality
//! - `gcd`: Greatest common divisor
//! - `is_prime`: Trial division for key-pool validation
//! - `extended_euclid`: Iterative extended Euclidean algorithm
//! - `mod_inverse`: Multiplicative inverse modulo `m`
//! - `mod_pow`: Square-and-multiply modular exponentiation
//!
//! ## ⚠️ Important Note for Next Developer
//! - Products are widened to `u128` before reduction, Bézout coefficients
//!   to `i128`; both are required once moduli approach `u64::MAX`
//!
//! ## Last Modified
//! v0.1.0 - Initial arithmetic

use crate::error::{CoreError, Result};

/// Greatest common divisor.
#[must_use]
pub const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Trial-division primality test. Only meant for small key-pool primes.
#[must_use]
pub const fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Extended Euclid: returns `(gcd(a, b), s mod b)` where `s·a + t·b = gcd`.
///
/// The coefficient is reduced into `[0, b)`. When `b == 0` the coefficient
/// is returned unreduced as `1`.
///
/// # Example
/// ```
/// use peerlink_core::crypto::arith::extended_euclid;
///
/// assert_eq!(extended_euclid(3, 26), (1, 9));
/// assert_eq!(extended_euclid(4, 8).0, 4);
/// ```
#[must_use]
pub fn extended_euclid(a: u64, b: u64) -> (u64, u64) {
    let (mut r1, mut r2) = (i128::from(a), i128::from(b));
    let (mut s1, mut s2) = (1_i128, 0_i128);

    while r2 != 0 {
        let q = r1 / r2;
        (r1, r2) = (r2, r1 - q * r2);
        (s1, s2) = (s2, s1 - q * s2);
    }

    let coefficient = if b == 0 {
        s1
    } else {
        s1.rem_euclid(i128::from(b))
    };

    // r1 <= max(a, b) and coefficient < b, both fit in u64
    (r1 as u64, coefficient as u64)
}

/// Multiplicative inverse of `a` modulo `m`.
///
/// # Errors
/// [`CoreError::NotInvertible`] when `m < 2` or `gcd(a, m) != 1`.
pub fn mod_inverse(a: u64, m: u64) -> Result<u64> {
    if m < 2 {
        return Err(CoreError::NotInvertible { value: a, modulus: m });
    }
    match extended_euclid(a % m, m) {
        (1, inverse) => Ok(inverse),
        _ => Err(CoreError::NotInvertible { value: a, modulus: m }),
    }
}

/// `base^exponent mod modulus`.
///
/// A modulus of 1 yields 0. Callers never pass a zero modulus; it is treated
/// as 1.
#[must_use]
pub fn mod_pow(base: u64, mut exponent: u64, modulus: u64) -> u64 {
    if modulus <= 1 {
        return 0;
    }
    let m = u128::from(modulus);
    let mut result: u128 = 1;
    let mut base = u128::from(base) % m;

    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result * base % m;
        }
        base = base * base % m;
        exponent >>= 1;
    }

    // result < modulus
    result as u64
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(17, 5), 1);
        assert_eq!(gcd(0, 7), 7);
        assert_eq!(gcd(7, 0), 7);
    }

    #[test]
    fn test_is_prime() {
        let primes: Vec<u64> = (0..40).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37]);
        assert!(is_prime(139));
        assert!(!is_prime(121));
    }

    #[test]
    fn test_extended_euclid_known_values() {
        assert_eq!(extended_euclid(3, 26), (1, 9));
        assert_eq!(extended_euclid(17, 3120), (1, 2753));
        assert_eq!(extended_euclid(240, 46).0, 2);
    }

    #[test]
    fn test_mod_inverse() {
        assert_eq!(mod_inverse(3, 26).unwrap(), 9);
        assert_eq!(mod_inverse(17, 3120).unwrap(), 2753);
        assert_eq!(mod_inverse(29, 26).unwrap(), 9);
    }

    #[test]
    fn test_mod_inverse_not_invertible() {
        let err = mod_inverse(4, 8).unwrap_err();
        assert!(matches!(err, CoreError::NotInvertible { value: 4, modulus: 8 }));
        assert!(mod_inverse(0, 26).is_err());
        assert!(mod_inverse(5, 1).is_err());
    }

    #[test]
    fn test_mod_pow() {
        assert_eq!(mod_pow(4, 13, 497), 445);
        assert_eq!(mod_pow(2, 10, 1000), 24);
        assert_eq!(mod_pow(7, 0, 13), 1);
        assert_eq!(mod_pow(7, 5, 1), 0);
    }

    #[test]
    fn test_mod_pow_wide_modulus() {
        let m = u64::MAX - 58; // largest 64-bit prime
        assert_eq!(mod_pow(m - 1, 2, m), 1);
        // Fermat
        assert_eq!(mod_pow(3, m - 1, m), 1);
    }

    proptest! {
        #[test]
        fn prop_inverse_multiplies_to_one(a in 1u64..10_000, m in 2u64..10_000) {
            match mod_inverse(a, m) {
                Ok(inv) => prop_assert_eq!(u128::from(a) * u128::from(inv) % u128::from(m), 1),
                Err(_) => prop_assert_ne!(gcd(a, m), 1),
            }
        }

        #[test]
        fn prop_mod_pow_matches_naive(base in 0u64..1000, exp in 0u64..20, m in 2u64..1000) {
            let mut naive = 1u64 % m;
            for _ in 0..exp {
                naive = naive * (base % m) % m;
            }
            prop_assert_eq!(mod_pow(base, exp, m), naive);
        }
    }
}
