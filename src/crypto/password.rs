//! Encryption under a password-derived key.
//!
//! Each call derives the key with [`derive_key`], runs the matching
//! [`super::aead`] operation and drops the key before returning. Length
//! preconditions are checked before the (expensive) derivation.

use super::aead::{self, Detached, Plaintext};
use super::kdf::{PasswordConfig, derive_key};
use super::Nonce;
use crate::error::Result;

pub fn encrypt_with_password(
    message: &[u8],
    password: &str,
    nonce: &Nonce,
    config: &PasswordConfig,
) -> Result<Vec<u8>> {
    let key = derive_key(password, nonce, config)?;
    aead::encrypt(message, &key, nonce)
}

pub fn decrypt_with_password(
    ciphertext: &[u8],
    password: &str,
    nonce: &Nonce,
    config: &PasswordConfig,
) -> Result<Option<Plaintext>> {
    aead::check_combined_len(ciphertext)?;
    let key = derive_key(password, nonce, config)?;
    aead::decrypt(ciphertext, &key, nonce)
}

pub fn encrypt_detached_with_password(
    message: &[u8],
    password: &str,
    nonce: &Nonce,
    config: &PasswordConfig,
) -> Result<Detached> {
    let key = derive_key(password, nonce, config)?;
    aead::encrypt_detached(message, &key, nonce)
}

pub fn decrypt_detached_with_password(
    ciphertext: &[u8],
    mac: &[u8],
    password: &str,
    nonce: &Nonce,
    config: &PasswordConfig,
) -> Result<Option<Plaintext>> {
    aead::check_mac_len(mac)?;
    let key = derive_key(password, nonce, config)?;
    aead::decrypt_detached(ciphertext, mac, &key, nonce)
}
