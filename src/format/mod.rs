//! Sealed-file envelope.
//!
//! Frames the nonce, the password KDF parameters (if any) and the combined
//! ciphertext so a file can be opened later with only the key or password.

use crate::crypto::{NONCE_LEN, PasswordConfig};
use crate::error::{Error, Result};

pub mod v1;

/// Magic bytes identifying a sealbox file ("SLBX").
pub const MAGIC: &[u8; 4] = b"SLBX";
/// Length of magic bytes.
pub const MAGIC_LEN: usize = 4;
/// Length of version field.
pub const VER_LEN: usize = 1;
/// Latest format version
pub const CURRENT_VERSION: u8 = v1::VERSION_V1;

/// A parsed sealed file.
///
/// `kdf` is `None` when the file was sealed with a raw key.
#[derive(Debug)]
pub(crate) struct SealedFile {
    version: u8,
    kdf: Option<PasswordConfig>,
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

impl SealedFile {
    pub fn new(kdf: Option<PasswordConfig>, nonce: [u8; NONCE_LEN], ciphertext: Vec<u8>) -> Self {
        Self {
            version: CURRENT_VERSION,
            kdf,
            nonce,
            ciphertext,
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn kdf(&self) -> Option<&PasswordConfig> {
        self.kdf.as_ref()
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

/// Parses a sealed file, dispatching on its version byte.
pub(crate) fn parse(data: &[u8]) -> Result<SealedFile> {
    if data.len() < MAGIC_LEN + VER_LEN {
        return Err(Error::Malformed("file too short".into()));
    }

    if &data[..MAGIC_LEN] != MAGIC {
        return Err(Error::Malformed("invalid magic".into()));
    }

    match data[MAGIC_LEN] {
        v1::VERSION_V1 => v1::parse(data),
        version => Err(Error::Malformed(format!("unsupported version {version}"))),
    }
}

pub(crate) fn serialize(file: &SealedFile) -> Result<Vec<u8>> {
    match file.version() {
        v1::VERSION_V1 => v1::serialize(file),
        version => Err(Error::Malformed(format!("unsupported version {version}"))),
    }
}
