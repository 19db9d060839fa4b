// ============================================
// File: crates/peerlink-core/src/crypto/cipher.rs
// ============================================
//! # Symmetric Shift Cipher
//!
//! ## Creation Reason
//! Application messages are encrypted with the session secret reduced into
//! a 26-letter key space.
//!
//! ## Main Functionality
//! - `SymmetricKey`: shift amount in `[0, 26)`, derived from a session secret
//! - `shift_encrypt` / `shift_decrypt`: letter rotation, case preserved,
//!   everything else passes through untouched
//!
//! ## Last Modified
//! v0.1.0 - Initial cipher

use std::fmt;

use zeroize::Zeroize;

/// Size of the cipher alphabet.
pub const ALPHABET_SIZE: i64 = 26;

// ============================================
// SymmetricKey
// ============================================

/// Shift amount derived from a session secret.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey(u8);

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl SymmetricKey {
    /// Reduces a session secret into the key space.
    #[must_use]
    pub fn from_secret(secret: u64) -> Self {
        // secret % 26 < 26
        Self((secret % ALPHABET_SIZE.unsigned_abs()) as u8)
    }

    /// Returns the shift amount.
    #[must_use]
    pub const fn shift(&self) -> i64 {
        self.0 as i64
    }

    /// Encrypts `plaintext` with this key.
    #[must_use]
    pub fn encrypt(&self, plaintext: &str) -> String {
        shift_encrypt(plaintext, self.shift())
    }

    /// Decrypts `ciphertext` with this key.
    #[must_use]
    pub fn decrypt(&self, ciphertext: &str) -> String {
        shift_decrypt(ciphertext, self.shift())
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

// ============================================
// Shift Operations
// ============================================

fn shift_char(c: char, shift: u8) -> char {
    let base = match c {
        'a'..='z' => b'a',
        'A'..='Z' => b'A',
        _ => return c,
    };
    // c is ASCII here
    let offset = (c as u8 - base + shift) % 26;
    char::from(base + offset)
}

/// Shifts every ASCII letter of `text` forward by `key` positions.
///
/// # Example
/// ```
/// use peerlink_core::crypto::cipher::shift_encrypt;
///
/// assert_eq!(shift_encrypt("Hello, World!", 3), "Khoor, Zruog!");
/// assert_eq!(shift_encrypt("abc", -1), "zab");
/// ```
#[must_use]
pub fn shift_encrypt(text: &str, key: i64) -> String {
    // rem_euclid lands in [0, 26)
    let shift = key.rem_euclid(ALPHABET_SIZE) as u8;
    text.chars().map(|c| shift_char(c, shift)).collect()
}

/// Inverse of [`shift_encrypt`].
#[must_use]
pub fn shift_decrypt(text: &str, key: i64) -> String {
    // -key overflows for i64::MIN; its residue is what matters
    shift_encrypt(text, ALPHABET_SIZE - key.rem_euclid(ALPHABET_SIZE))
}

// ============================================
// Tests
// ============================================
