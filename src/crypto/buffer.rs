//! Fixed-length heap buffers for key and nonce material.

use std::fmt;

use getrandom::fill;
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};

/// An owned `N`-byte secret, zeroed when released or dropped.
///
/// The bytes are boxed so moving the handle never copies the secret. Callers
/// only ever get copies of the contents (see [`SecureBuffer::bytes`]), and
/// equality is evaluated in constant time.
pub struct SecureBuffer<const N: usize> {
    bytes: Box<[u8; N]>,
}

impl<const N: usize> SecureBuffer<N> {
    /// Length of the buffer in bytes.
    pub const LEN: usize = N;

    /// Allocates a zero-filled buffer.
    pub fn allocate() -> Self {
        Self {
            bytes: Box::new([0u8; N]),
        }
    }

    /// Copies `bytes` into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLength`] unless `bytes.len() == N`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_slice_as("buffer", bytes)
    }

    pub(crate) fn from_slice_as(what: &'static str, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != N {
            return Err(Error::InvalidLength {
                what,
                expected: N,
                actual: bytes.len(),
            });
        }
        let mut buf = Self::allocate();
        buf.bytes.copy_from_slice(bytes);
        Ok(buf)
    }

    /// Fills a new buffer from the OS random generator.
    pub fn random() -> Result<Self> {
        let mut buf = Self::allocate();
        fill(buf.bytes.as_mut_slice()).map_err(|e| Error::backend("OS random generator", e))?;
        Ok(buf)
    }

    /// Returns a copy of the contents that is zeroed when dropped.
    pub fn bytes(&self) -> Zeroizing<[u8; N]> {
        Zeroizing::new(*self.bytes)
    }

    /// Zeroes the contents and frees the buffer.
    pub fn release(mut self) {
        self.bytes.zeroize();
    }

    pub(crate) fn expose(&self) -> &[u8; N] {
        &self.bytes
    }

    pub(crate) fn expose_mut(&mut self) -> &mut [u8; N] {
        &mut self.bytes
    }
}

impl<const N: usize> Drop for SecureBuffer<N> {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl<const N: usize> ConstantTimeEq for SecureBuffer<N> {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.bytes.as_slice().ct_eq(other.bytes.as_slice())
    }
}

impl<const N: usize> PartialEq for SecureBuffer<N> {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl<const N: usize> Eq for SecureBuffer<N> {}

impl<const N: usize> fmt::Debug for SecureBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureBuffer")
            .field("len", &N)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
