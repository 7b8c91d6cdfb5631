//! Secret-key authenticated encryption.
//!
//! Keys and nonces live in zeroizing buffers, encryption is XChaCha20-Poly1305
//! in combined or detached form, and password keys come from Argon2 salted with
//! the message nonce.

pub mod aead;
pub mod buffer;
pub mod kdf;
pub mod key;
pub mod nonce;
pub mod password;
pub mod preset;

pub use aead::{Detached, Plaintext, decrypt, decrypt_detached, encrypt, encrypt_detached};
pub use buffer::SecureBuffer;
pub use kdf::{Algorithm, PasswordConfig, derive_key};
pub use key::Key;
pub use nonce::Nonce;
pub use password::{
    decrypt_detached_with_password, decrypt_with_password, encrypt_detached_with_password,
    encrypt_with_password,
};
pub use preset::SecurityLevel;

use chacha20poly1305::XChaCha20Poly1305;
use chacha20poly1305::aead::generic_array::typenum::Unsigned;
use chacha20poly1305::aead::{AeadCore, KeySizeUser};

/// Length of a key (32 bytes for XChaCha20-Poly1305).
pub const KEY_LEN: usize = <<XChaCha20Poly1305 as KeySizeUser>::KeySize as Unsigned>::USIZE;
/// Length of a nonce (24 bytes for XChaCha20-Poly1305).
pub const NONCE_LEN: usize = <<XChaCha20Poly1305 as AeadCore>::NonceSize as Unsigned>::USIZE;
/// Length of the Poly1305 authentication tag (16 bytes).
pub const MAC_LEN: usize = <<XChaCha20Poly1305 as AeadCore>::TagSize as Unsigned>::USIZE;
/// Length of the Argon2 salt taken from the nonce prefix (16 bytes).
pub const SALT_LEN: usize = argon2::RECOMMENDED_SALT_LEN;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_lengths() {
        assert_eq!(KEY_LEN, 32);
        assert_eq!(NONCE_LEN, 24);
        assert_eq!(MAC_LEN, 16);
        assert!(SALT_LEN <= NONCE_LEN);
    }
}
