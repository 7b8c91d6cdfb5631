//! Sealed file format v1.
//!
//! ```text
//! MAGIC (4) | VERSION (1) | KDF_ID (1) | OPS_LIMIT (8) | MEM_LIMIT (8) | NONCE (24) | CIPHERTEXT (>= 16)
//! ```
//!
//! Integers are little-endian. `KDF_ID` 0 marks a raw-key file (both limits
//! zero); any other value is an [`Algorithm`] id.

use super::{MAGIC, MAGIC_LEN, SealedFile, VER_LEN};
use crate::crypto::{Algorithm, MAC_LEN, NONCE_LEN, PasswordConfig};
use crate::error::{Error, Result};

/// Current file format version.
pub const VERSION_V1: u8 = 1;

const RAW_KEY_ID: u8 = 0;
const KDF_LEN: usize = 1;
const OPS_LEN: usize = 8;
const MEM_LEN: usize = 8;

pub(crate) const HEADER_LEN: usize = MAGIC_LEN + VER_LEN + KDF_LEN + OPS_LEN + MEM_LEN + NONCE_LEN;

pub(crate) fn parse(data: &[u8]) -> Result<SealedFile> {
    if data.len() < HEADER_LEN + MAC_LEN {
        return Err(Error::Malformed("file too short for v1".into()));
    }

    let mut offset = MAGIC_LEN + VER_LEN;

    let kdf_id = data[offset];
    offset += KDF_LEN;

    let ops_limit = read_u64(&data[offset..offset + OPS_LEN])?;
    offset += OPS_LEN;

    let mem_limit = read_u64(&data[offset..offset + MEM_LEN])?;
    offset += MEM_LEN;

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&data[offset..offset + NONCE_LEN]);
    offset += NONCE_LEN;

    let kdf = match kdf_id {
        RAW_KEY_ID if ops_limit == 0 && mem_limit == 0 => None,
        RAW_KEY_ID => return Err(Error::Malformed("raw-key file carries KDF limits".into())),
        id => {
            let algorithm = Algorithm::from_id(id)
                .ok_or_else(|| Error::Malformed(format!("unknown KDF id {id}")))?;
            Some(PasswordConfig::new(algorithm, ops_limit, mem_limit)?)
        }
    };

    Ok(SealedFile::new(kdf, nonce, data[offset..].to_vec()))
}

pub(crate) fn serialize(file: &SealedFile) -> Result<Vec<u8>> {
    if file.version() != VERSION_V1 {
        return Err(Error::Malformed("wrong version for v1 serializer".into()));
    }

    let mut buf = Vec::with_capacity(HEADER_LEN + file.ciphertext().len());

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION_V1);

    match file.kdf() {
        Some(kdf) => {
            buf.push(kdf.algorithm().id());
            buf.extend_from_slice(&kdf.ops_limit().to_le_bytes());
            buf.extend_from_slice(&kdf.mem_limit().to_le_bytes());
        }
        None => {
            buf.push(RAW_KEY_ID);
            buf.extend_from_slice(&[0u8; OPS_LEN + MEM_LEN]);
        }
    }

    buf.extend_from_slice(file.nonce());
    buf.extend_from_slice(file.ciphertext());

    Ok(buf)
}

fn read_u64(bytes: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = bytes
        .try_into()
        .map_err(|_| Error::Malformed("truncated integer field".into()))?;
    Ok(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SecurityLevel;

    #[test]
    fn password_header_roundtrip() {
        let kdf = PasswordConfig::preset(SecurityLevel::Interactive, Algorithm::Argon2i13);
        let file = SealedFile::new(Some(kdf), [2u8; NONCE_LEN], vec![7u8; 20]);

        let bytes = serialize(&file).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN + 20);

        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.version(), VERSION_V1);
        assert_eq!(parsed.kdf(), Some(&kdf));
        assert_eq!(parsed.nonce(), file.nonce());
        assert_eq!(parsed.ciphertext(), file.ciphertext());
    }

    #[test]
    fn raw_key_header_roundtrip() {
        let file = SealedFile::new(None, [5u8; NONCE_LEN], vec![1u8; MAC_LEN]);
        let parsed = parse(&serialize(&file).unwrap()).unwrap();
        assert!(parsed.kdf().is_none());
        assert_eq!(parsed.ciphertext().len(), MAC_LEN);
    }

    #[test]
    fn ciphertext_shorter_than_tag_fails() {
        let file = SealedFile::new(None, [0u8; NONCE_LEN], vec![0u8; MAC_LEN - 1]);
        let bytes = serialize(&file).unwrap();
        assert!(matches!(parse(&bytes), Err(Error::Malformed(_))));
    }

    #[test]
    fn unknown_kdf_id_fails() {
        let file = SealedFile::new(None, [0u8; NONCE_LEN], vec![0u8; MAC_LEN]);
        let mut bytes = serialize(&file).unwrap();
        bytes[MAGIC_LEN + VER_LEN] = 42;
        match parse(&bytes) {
            Err(Error::Malformed(msg)) => assert!(msg.contains("42")),
            other => panic!("expected Malformed, got: {other:?}"),
        }
    }

    #[test]
    fn raw_key_with_limits_fails() {
        let file = SealedFile::new(None, [0u8; NONCE_LEN], vec![0u8; MAC_LEN]);
        let mut bytes = serialize(&file).unwrap();
        bytes[MAGIC_LEN + VER_LEN + KDF_LEN] = 1;
        assert!(matches!(parse(&bytes), Err(Error::Malformed(_))));
    }

    #[test]
    fn out_of_range_limits_fail() {
        let kdf = PasswordConfig::preset(SecurityLevel::Interactive, Algorithm::Argon2id13);
        let file = SealedFile::new(Some(kdf), [0u8; NONCE_LEN], vec![0u8; MAC_LEN]);
        let mut bytes = serialize(&file).unwrap();

        let ops = MAGIC_LEN + VER_LEN + KDF_LEN;
        bytes[ops..ops + OPS_LEN].copy_from_slice(&0u64.to_le_bytes());

        assert!(matches!(parse(&bytes), Err(Error::InvalidLimit { .. })));
    }
}
