//! Authenticated secret-key encryption with raw and password-derived keys.
//!
//! The [`crypto`] module is the engine: [`Key`] and [`Nonce`] handles that
//! zero themselves, combined and detached XChaCha20-Poly1305, and Argon2 key
//! derivation salted with the message nonce. The crate root adds a small
//! sealed-file envelope on top so a message can be stored and reopened with
//! just the key or password.
//!
//! ```no_run
//! use sealbox::{Key, Nonce, crypto};
//!
//! # fn main() -> sealbox::Result<()> {
//! let key = Key::random()?;
//! let nonce = Nonce::random()?;
//! let ciphertext = crypto::encrypt(b"hello", &key, &nonce)?;
//! let plaintext = crypto::decrypt(&ciphertext, &key, &nonce)?;
//! assert_eq!(plaintext.as_deref().map(Vec::as_slice), Some(&b"hello"[..]));
//! # Ok(())
//! # }
//! ```

pub mod crypto;
mod error;
mod format;
mod storage;

pub use crate::crypto::{Algorithm, Key, Nonce, PasswordConfig, Plaintext, SecurityLevel};
pub use crate::error::{Error, Result};
pub use crate::storage::Storage;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::format::SealedFile;

/// Highest Argon2 cost a sealed file may carry.
///
/// The header limits are attacker-controlled; anything above this preset is
/// refused before a key is derived.
pub const MAX_SECURITY_LEVEL: SecurityLevel = SecurityLevel::Sensitive;

/// What to open a sealed file with.
#[derive(Clone, Copy)]
pub enum Secret<'a> {
    Key(&'a Key),
    Password(&'a str),
}

impl fmt::Debug for Secret<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Secret::Password(_) => f.debug_tuple("Password").field(&"[REDACTED]").finish(),
        }
    }
}

/// Header fields of a sealed file, for display.
#[derive(Debug, Clone, Serialize)]
pub struct SealedInfo {
    pub version: u8,
    /// `None` for files sealed with a raw key.
    pub kdf: Option<PasswordConfig>,
    pub nonce: [u8; crypto::NONCE_LEN],
    pub ciphertext_len: usize,
}

/// Seal `plaintext` under `key` with a fresh random nonce.
pub fn seal_with_key(plaintext: &[u8], key: &Key) -> Result<Vec<u8>> {
    let nonce = Nonce::random()?;
    let ciphertext = crypto::encrypt(plaintext, key, &nonce)?;
    format::serialize(&SealedFile::new(None, *nonce.bytes(), ciphertext))
}

/// Seal `plaintext` under a key derived from `password` and a fresh random
/// nonce. The KDF parameters are stored in the header.
///
/// # Errors
///
/// [`Error::InvalidLimit`] if `config` costs more than
/// [`MAX_SECURITY_LEVEL`], since [`open`] would refuse the result.
pub fn seal_with_password(
    plaintext: &[u8],
    password: &str,
    config: &PasswordConfig,
) -> Result<Vec<u8>> {
    config.check_ceiling(MAX_SECURITY_LEVEL)?;
    let nonce = Nonce::random()?;
    let ciphertext = crypto::encrypt_with_password(plaintext, password, &nonce, config)?;
    format::serialize(&SealedFile::new(Some(*config), *nonce.bytes(), ciphertext))
}

/// Open a sealed file.
///
/// Returns `Ok(None)` if the contents do not authenticate, which covers a
/// wrong key or password as well as tampering.
///
/// # Errors
///
/// [`Error::Malformed`] if `data` is not a sealed file,
/// [`Error::InvalidLimit`] if its KDF cost exceeds [`MAX_SECURITY_LEVEL`], and
/// [`Error::InvalidInput`] if `secret` is a key for a password-sealed file or
/// vice versa.
pub fn open(data: &[u8], secret: Secret<'_>) -> Result<Option<Plaintext>> {
    let file = format::parse(data)?;
    let nonce = Nonce::from_bytes(file.nonce())?;

    let opened = match (file.kdf(), secret) {
        (None, Secret::Key(key)) => crypto::decrypt(file.ciphertext(), key, &nonce)?,
        (Some(config), Secret::Password(password)) => {
            config.check_ceiling(MAX_SECURITY_LEVEL)?;
            crypto::decrypt_with_password(file.ciphertext(), password, &nonce, config)?
        }
        (None, Secret::Password(_)) => {
            return Err(Error::InvalidInput(
                "file was sealed with a key, not a password".into(),
            ));
        }
        (Some(_), Secret::Key(_)) => {
            return Err(Error::InvalidInput(
                "file was sealed with a password, not a key".into(),
            ));
        }
    };

    debug!(authenticated = opened.is_some(), "opened sealed file");
    Ok(opened)
}

/// Read the header of a sealed file without decrypting it.
pub fn inspect(data: &[u8]) -> Result<SealedInfo> {
    let file = format::parse(data)?;
    Ok(SealedInfo {
        version: file.version(),
        kdf: file.kdf().copied(),
        nonce: *file.nonce(),
        ciphertext_len: file.ciphertext().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> PasswordConfig {
        PasswordConfig::new(Algorithm::Argon2id13, 1, 64 * 1024).unwrap()
    }

    #[test]
    fn key_sealed_roundtrip() {
        let key = Key::random().unwrap();
        let sealed = seal_with_key(b"secret data", &key).unwrap();

        let plaintext = open(&sealed, Secret::Key(&key)).unwrap().unwrap();
        assert_eq!(plaintext.as_slice(), b"secret data");
    }

    #[test]
    fn password_sealed_roundtrip() {
        let sealed = seal_with_password(b"secret data", "pw", &cheap()).unwrap();

        let plaintext = open(&sealed, Secret::Password("pw")).unwrap().unwrap();
        assert_eq!(plaintext.as_slice(), b"secret data");
    }

    #[test]
    fn wrong_password_is_none() {
        let sealed = seal_with_password(b"secret data", "correct", &cheap()).unwrap();
        assert!(open(&sealed, Secret::Password("wrong")).unwrap().is_none());
    }

    #[test]
    fn wrong_key_is_none() {
        let sealed = seal_with_key(b"secret data", &Key::random().unwrap()).unwrap();
        let other = Key::random().unwrap();
        assert!(open(&sealed, Secret::Key(&other)).unwrap().is_none());
    }

    #[test]
    fn tampered_body_is_none() {
        let key = Key::random().unwrap();
        let mut sealed = seal_with_key(b"secret data", &key).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x80;
        assert!(open(&sealed, Secret::Key(&key)).unwrap().is_none());
    }

    #[test]
    fn secret_kind_mismatch_is_an_error() {
        let key = Key::random().unwrap();
        let key_sealed = seal_with_key(b"x", &key).unwrap();
        assert!(matches!(
            open(&key_sealed, Secret::Password("pw")),
            Err(Error::InvalidInput(_))
        ));

        let pw_sealed = seal_with_password(b"x", "pw", &cheap()).unwrap();
        assert!(matches!(
            open(&pw_sealed, Secret::Key(&key)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn each_seal_uses_a_fresh_nonce() {
        let key = Key::random().unwrap();
        let a = inspect(&seal_with_key(b"same", &key).unwrap()).unwrap();
        let b = inspect(&seal_with_key(b"same", &key).unwrap()).unwrap();
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn inspect_reports_header() {
        let sealed = seal_with_password(b"12345", "pw", &cheap()).unwrap();
        let info = inspect(&sealed).unwrap();

        assert_eq!(info.version, format::CURRENT_VERSION);
        assert_eq!(info.kdf, Some(cheap()));
        assert_eq!(info.ciphertext_len, 5 + crypto::MAC_LEN);
    }

    #[test]
    fn oversized_kdf_cost_is_refused_before_deriving() {
        let mut sealed = seal_with_password(b"x", "pw", &cheap()).unwrap();

        // MAGIC | VERSION | KDF_ID, then OPS_LIMIT and MEM_LIMIT
        let huge_mem = Algorithm::Argon2id13.mem_limit_max();
        sealed[14..22].copy_from_slice(&huge_mem.to_le_bytes());
        assert_eq!(inspect(&sealed).unwrap().kdf.unwrap().mem_limit(), huge_mem);

        assert!(matches!(
            open(&sealed, Secret::Password("pw")),
            Err(Error::InvalidLimit { what: "mem limit", .. })
        ));

        sealed[14..22].copy_from_slice(&(64u64 * 1024).to_le_bytes());
        sealed[6..14].copy_from_slice(&u64::from(u32::MAX).to_le_bytes());
        assert!(matches!(
            open(&sealed, Secret::Password("pw")),
            Err(Error::InvalidLimit { what: "ops limit", .. })
        ));
    }

    #[test]
    fn sealing_above_the_ceiling_fails() {
        let config = PasswordConfig::new(Algorithm::Argon2id13, 5, 64 * 1024).unwrap();
        assert!(matches!(
            seal_with_password(b"x", "pw", &config),
            Err(Error::InvalidLimit { what: "ops limit", .. })
        ));
    }

    #[test]
    fn secret_debug_hides_password() {
        let printed = format!("{:?}", Secret::Password("hunter2"));
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains("hunter2"));

        let key = Key::from_bytes(&[0x5a; Key::LEN]).unwrap();
        let printed = format!("{:?}", Secret::Key(&key));
        assert!(printed.contains("REDACTED"));
        assert!(!printed.contains("90"));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            open(b"not a sealed file at all", Secret::Password("pw")),
            Err(Error::Malformed(_))
        ));
    }
}
