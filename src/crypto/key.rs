use zeroize::Zeroizing;

use super::KEY_LEN;
use super::buffer::SecureBuffer;
use crate::error::Result;

/// A symmetric encryption key. Zeroed on release or drop.
#[derive(Debug, PartialEq, Eq)]
pub struct Key(SecureBuffer<KEY_LEN>);

impl Key {
    /// Length of a key in bytes.
    pub const LEN: usize = KEY_LEN;

    /// Generate a random key.
    pub fn random() -> Result<Self> {
        Ok(Self(SecureBuffer::random()?))
    }

    /// Import a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidLength`] unless `bytes` is exactly
    /// [`Key::LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self(SecureBuffer::from_slice_as("key", bytes)?))
    }

    pub fn bytes(&self) -> Zeroizing<[u8; KEY_LEN]> {
        self.0.bytes()
    }

    pub fn release(self) {
        self.0.release();
    }

    pub(crate) fn from_buffer(buffer: SecureBuffer<KEY_LEN>) -> Self {
        Self(buffer)
    }

    pub(crate) fn expose(&self) -> &[u8; KEY_LEN] {
        self.0.expose()
    }
}
