use zeroize::Zeroizing;

use super::NONCE_LEN;
use super::buffer::SecureBuffer;
use crate::error::Result;

/// A per-message nonce. Must never repeat under the same key.
#[derive(Debug, PartialEq, Eq)]
pub struct Nonce(SecureBuffer<NONCE_LEN>);

impl Nonce {
    /// Length of a nonce in bytes.
    pub const LEN: usize = NONCE_LEN;

    /// Generate a random nonce.
    pub fn random() -> Result<Self> {
        Ok(Self(SecureBuffer::random()?))
    }

    /// Import a nonce from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidLength`] unless `bytes` is exactly
    /// [`Nonce::LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self(SecureBuffer::from_slice_as("nonce", bytes)?))
    }

    /// Returns the next nonce in sequence, leaving `self` untouched.
    ///
    /// The bytes are treated as an unsigned little-endian integer and
    /// incremented modulo `2^(8 * LEN)`. Advancing one sequence from several
    /// threads needs external serialization, otherwise two messages can end up
    /// under the same nonce.
    pub fn increment(&self) -> Nonce {
        let mut next = SecureBuffer::allocate();
        let bytes = next.expose_mut();
        bytes.copy_from_slice(self.0.expose());

        // Touches every byte regardless of where the carry stops.
        let mut carry: u16 = 1;
        for byte in bytes.iter_mut() {
            carry += u16::from(*byte);
            *byte = carry as u8;
            carry >>= 8;
        }

        Nonce(next)
    }

    pub fn bytes(&self) -> Zeroizing<[u8; NONCE_LEN]> {
        self.0.bytes()
    }

    pub fn release(self) {
        self.0.release();
    }

    pub(crate) fn expose(&self) -> &[u8; NONCE_LEN] {
        self.0.expose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn nonce_with(prefix: &[u8]) -> Nonce {
        let mut bytes = [0u8; NONCE_LEN];
        bytes[..prefix.len()].copy_from_slice(prefix);
        Nonce::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn increment_adds_one_little_endian() {
        let next = nonce_with(&[0]).increment();
        assert_eq!(*next.bytes(), *nonce_with(&[1]).bytes());
    }

    #[test]
    fn increment_carries() {
        let next = nonce_with(&[0xff, 0xff, 0x01]).increment();
        assert_eq!(*next.bytes(), *nonce_with(&[0x00, 0x00, 0x02]).bytes());
    }

    #[test]
    fn increment_carries_into_the_last_byte() {
        let mut bytes = [0xffu8; NONCE_LEN];
        bytes[NONCE_LEN - 1] = 0x10;
        let next = Nonce::from_bytes(&bytes).unwrap().increment();

        let mut expected = [0u8; NONCE_LEN];
        expected[NONCE_LEN - 1] = 0x11;
        assert_eq!(*next.bytes(), expected);
    }

    #[test]
    fn increment_wraps_to_zero() {
        let max = Nonce::from_bytes(&[0xff; NONCE_LEN]).unwrap();
        assert_eq!(*max.increment().bytes(), [0u8; NONCE_LEN]);
    }

    #[test]
    fn increment_leaves_source_untouched() {
        let source = nonce_with(&[5]);
        let _ = source.increment();
        assert_eq!(*source.bytes(), *nonce_with(&[5]).bytes());
    }

    #[test]
    fn from_bytes_wrong_length_fails() {
        assert!(Nonce::from_bytes(&[0u8; NONCE_LEN - 1]).is_err());
        assert!(Nonce::from_bytes(&[0u8; NONCE_LEN + 1]).is_err());
    }

    proptest! {
        #[test]
        fn increment_is_deterministic(bytes in proptest::array::uniform24(any::<u8>())) {
            let nonce = Nonce::from_bytes(&bytes).unwrap();
            prop_assert_eq!(nonce.increment(), nonce.increment());
        }

        #[test]
        fn increment_matches_integer_addition(low in any::<u128>(), high in any::<u64>()) {
            let mut bytes = [0u8; NONCE_LEN];
            bytes[..16].copy_from_slice(&low.to_le_bytes());
            bytes[16..].copy_from_slice(&high.to_le_bytes());

            let next = Nonce::from_bytes(&bytes).unwrap().increment();
            let next = next.bytes();

            let (expected_low, carry) = low.overflowing_add(1);
            let expected_high = if carry { high.wrapping_add(1) } else { high };
            prop_assert_eq!(&next[..16], &expected_low.to_le_bytes()[..]);
            prop_assert_eq!(&next[16..], &expected_high.to_le_bytes()[..]);
        }
    }
}
