use chacha20poly1305::{
    Tag, XChaCha20Poly1305, XNonce,
    aead::{Aead, AeadInPlace, KeyInit},
};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::{Key, MAC_LEN, Nonce};
use crate::error::{Error, Result};

/// Decrypted message bytes, zeroed on drop.
pub type Plaintext = Zeroizing<Vec<u8>>;

/// Ciphertext and authentication tag kept apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detached {
    ciphertext: Vec<u8>,
    mac: [u8; MAC_LEN],
}

impl Detached {
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn mac(&self) -> &[u8; MAC_LEN] {
        &self.mac
    }

    pub fn into_parts(self) -> (Vec<u8>, [u8; MAC_LEN]) {
        (self.ciphertext, self.mac)
    }
}

fn cipher(key: &Key) -> XChaCha20Poly1305 {
    XChaCha20Poly1305::new(key.expose().into())
}

/// Encrypt `message`, returning `ciphertext || tag`.
///
/// The output is always `message.len() + MAC_LEN` bytes; an empty message
/// produces a bare tag.
pub fn encrypt(message: &[u8], key: &Key, nonce: &Nonce) -> Result<Vec<u8>> {
    let ciphertext = cipher(key)
        .encrypt(XNonce::from_slice(nonce.expose()), message)
        .map_err(|e| Error::backend("encryption", e))?;

    trace!(len = message.len(), "encrypted message");
    Ok(ciphertext)
}

/// Decrypt and verify the output of [`encrypt`].
///
/// Returns `Ok(None)` when the ciphertext does not authenticate under this
/// key and nonce. No reason is given.
///
/// # Errors
///
/// [`Error::InvalidInput`] if `ciphertext` is shorter than the tag.
pub fn decrypt(ciphertext: &[u8], key: &Key, nonce: &Nonce) -> Result<Option<Plaintext>> {
    check_combined_len(ciphertext)?;

    match cipher(key).decrypt(XNonce::from_slice(nonce.expose()), ciphertext) {
        Ok(plaintext) => {
            trace!(len = plaintext.len(), "decrypted message");
            Ok(Some(Zeroizing::new(plaintext)))
        }
        Err(_) => {
            debug!("authentication failed");
            Ok(None)
        }
    }
}

/// Encrypt `message`, returning the ciphertext and tag separately.
pub fn encrypt_detached(message: &[u8], key: &Key, nonce: &Nonce) -> Result<Detached> {
    let mut ciphertext = message.to_vec();
    let tag = cipher(key)
        .encrypt_in_place_detached(XNonce::from_slice(nonce.expose()), b"", &mut ciphertext)
        .map_err(|e| Error::backend("detached encryption", e))?;

    let mut mac = [0u8; MAC_LEN];
    mac.copy_from_slice(&tag);

    trace!(len = message.len(), "encrypted detached message");
    Ok(Detached { ciphertext, mac })
}

/// Decrypt and verify the output of [`encrypt_detached`].
///
/// # Errors
///
/// [`Error::InvalidLength`] if `mac` is not exactly `MAC_LEN` bytes.
pub fn decrypt_detached(
    ciphertext: &[u8],
    mac: &[u8],
    key: &Key,
    nonce: &Nonce,
) -> Result<Option<Plaintext>> {
    check_mac_len(mac)?;

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    let verified = cipher(key).decrypt_in_place_detached(
        XNonce::from_slice(nonce.expose()),
        b"",
        buffer.as_mut_slice(),
        Tag::from_slice(mac),
    );

    match verified {
        Ok(()) => {
            trace!(len = buffer.len(), "decrypted detached message");
            Ok(Some(buffer))
        }
        Err(_) => {
            debug!("authentication failed");
            Ok(None)
        }
    }
}

pub(crate) fn check_combined_len(ciphertext: &[u8]) -> Result<()> {
    if ciphertext.len() < MAC_LEN {
        return Err(Error::InvalidInput(format!(
            "ciphertext is {} bytes, shorter than the {MAC_LEN}-byte tag",
            ciphertext.len()
        )));
    }
    Ok(())
}

pub(crate) fn check_mac_len(mac: &[u8]) -> Result<()> {
    if mac.len() != MAC_LEN {
        return Err(Error::InvalidLength {
            what: "mac",
            expected: MAC_LEN,
            actual: mac.len(),
        });
    }
    Ok(())
}
