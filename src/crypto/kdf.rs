use std::fmt;
use std::str::FromStr;

use argon2::{Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::buffer::SecureBuffer;
use super::preset::SecurityLevel;
use super::{KEY_LEN, Key, NONCE_LEN, Nonce, SALT_LEN};
use crate::error::{Error, Result};

/// Password hashing algorithm. Ids match libsodium's `crypto_pwhash_ALG_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Argon2i, version 1.3.
    Argon2i13,
    /// Argon2id, version 1.3.
    #[default]
    Argon2id13,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Argon2i13, Algorithm::Argon2id13];

    /// The algorithm new callers should use.
    pub fn recommended() -> Self {
        Algorithm::Argon2id13
    }

    pub fn id(self) -> u8 {
        match self {
            Algorithm::Argon2i13 => 1,
            Algorithm::Argon2id13 => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Algorithm::ALL.into_iter().find(|alg| alg.id() == id)
    }

    pub fn ops_limit_min(self) -> u64 {
        match self {
            // Argon2i needs at least three passes to resist tradeoff attacks
            Algorithm::Argon2i13 => 3,
            Algorithm::Argon2id13 => u64::from(Params::MIN_T_COST),
        }
    }

    pub fn ops_limit_max(self) -> u64 {
        u64::from(Params::MAX_T_COST)
    }

    /// Smallest memory limit in bytes.
    pub fn mem_limit_min(self) -> u64 {
        u64::from(Params::MIN_M_COST) * 1024
    }

    /// Largest memory limit in bytes.
    pub fn mem_limit_max(self) -> u64 {
        u64::from(Params::MAX_M_COST) * 1024
    }

    /// Salt length the algorithm consumes from the nonce prefix.
    pub fn salt_len(self) -> usize {
        SALT_LEN
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Argon2i13 => "argon2i13",
            Algorithm::Argon2id13 => "argon2id13",
        }
    }

    fn backend(self) -> argon2::Algorithm {
        match self {
            Algorithm::Argon2i13 => argon2::Algorithm::Argon2i,
            Algorithm::Argon2id13 => argon2::Algorithm::Argon2id,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|alg| alg.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "unknown algorithm '{s}' (expected argon2id13 or argon2i13)"
                ))
            })
    }
}

/// Algorithm and cost for deriving a key from a password.
///
/// Memory is given in bytes, as libsodium does, and must be a whole number of
/// KiB since Argon2 counts it in 1 KiB blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordConfig {
    algorithm: Algorithm,
    ops_limit: u64,
    mem_limit: u64,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::preset(SecurityLevel::default(), Algorithm::recommended())
    }
}

impl PasswordConfig {
    pub fn preset(level: SecurityLevel, algorithm: Algorithm) -> Self {
        let (ops_limit, mem_limit) = level.limits(algorithm);
        Self {
            algorithm,
            ops_limit,
            mem_limit,
        }
    }

    /// Custom cost, checked against the algorithm's bounds.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLimit`] if either limit is out of bounds, and
    /// [`Error::InvalidInput`] if `mem_limit` is not a multiple of 1024.
    pub fn new(algorithm: Algorithm, ops_limit: u64, mem_limit: u64) -> Result<Self> {
        let config = Self {
            algorithm,
            ops_limit,
            mem_limit,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn ops_limit(&self) -> u64 {
        self.ops_limit
    }

    pub fn mem_limit(&self) -> u64 {
        self.mem_limit
    }

    pub fn validate(&self) -> Result<()> {
        let alg = self.algorithm;
        check_range("ops limit", self.ops_limit, alg.ops_limit_min(), alg.ops_limit_max())?;
        check_range("mem limit", self.mem_limit, alg.mem_limit_min(), alg.mem_limit_max())?;
        if self.mem_limit % 1024 != 0 {
            return Err(Error::InvalidInput(format!(
                "mem limit {} is not a whole number of KiB",
                self.mem_limit
            )));
        }
        Ok(())
    }

    /// Fails unless the cost is at most `level`'s preset for the algorithm.
    ///
    /// Limits read from a file header are only bounded by Argon2 itself, which
    /// allows terabytes of memory; callers cap them with this before deriving.
    pub fn check_ceiling(&self, level: SecurityLevel) -> Result<()> {
        let alg = self.algorithm;
        let (max_ops, max_mem) = level.limits(alg);
        check_range("ops limit", self.ops_limit, alg.ops_limit_min(), max_ops)?;
        check_range("mem limit", self.mem_limit, alg.mem_limit_min(), max_mem)?;
        Ok(())
    }

    fn params(&self) -> Result<Params> {
        self.validate()?;

        let t_cost = u32::try_from(self.ops_limit).map_err(|e| Error::backend("argon2 params", e))?;
        let m_cost =
            u32::try_from(self.mem_limit / 1024).map_err(|e| Error::backend("argon2 params", e))?;

        Params::new(m_cost, t_cost, 1, Some(KEY_LEN)).map_err(|e| Error::backend("argon2 params", e))
    }
}

fn check_range(what: &'static str, value: u64, min: u64, max: u64) -> Result<()> {
    if !(min..=max).contains(&value) {
        return Err(Error::InvalidLimit {
            what,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Derive a key from `password`, salted with the first `salt_len` bytes of
/// `nonce`.
///
/// The same password, nonce and config always give the same key, so the
/// receiver re-derives it from the transmitted nonce. A nonce reused across
/// messages therefore also reuses the derived key.
pub fn derive_key(password: &str, nonce: &Nonce, config: &PasswordConfig) -> Result<Key> {
    let salt = salt_prefix(nonce.expose(), config.algorithm().salt_len())?;
    let params = config.params()?;
    let argon2 = Argon2::new(config.algorithm().backend(), Version::V0x13, params);

    let mut key = SecureBuffer::<KEY_LEN>::allocate();
    argon2
        .hash_password_into(password.as_bytes(), salt, key.expose_mut())
        .map_err(|e| Error::backend("password hashing", e))?;

    debug!(
        algorithm = %config.algorithm(),
        ops_limit = config.ops_limit(),
        mem_limit = config.mem_limit(),
        "derived key from password"
    );
    Ok(Key::from_buffer(key))
}

fn salt_prefix(nonce: &[u8; NONCE_LEN], salt_len: usize) -> Result<&[u8]> {
    if salt_len > NONCE_LEN {
        return Err(Error::SaltTooLong {
            salt_len,
            nonce_len: NONCE_LEN,
        });
    }
    Ok(&nonce[..salt_len])
}
