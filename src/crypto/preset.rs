//! Named Argon2 cost presets.
//!
//! The numbers match libsodium's `crypto_pwhash_*_INTERACTIVE`, `_MODERATE`
//! and `_SENSITIVE` constants for each algorithm, so keys derived here agree
//! with keys derived by libsodium for the same password and salt.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::kdf::Algorithm;
use crate::error::Error;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityLevel {
    /// Fast enough for online logins.
    Interactive,
    #[default]
    Moderate,
    /// For long-lived secrets where seconds of CPU are acceptable.
    Sensitive,
}

impl SecurityLevel {
    pub const ALL: [SecurityLevel; 3] = [
        SecurityLevel::Interactive,
        SecurityLevel::Moderate,
        SecurityLevel::Sensitive,
    ];

    /// `(ops_limit, mem_limit)` for `algorithm`, memory in bytes.
    pub fn limits(self, algorithm: Algorithm) -> (u64, u64) {
        match (algorithm, self) {
            (Algorithm::Argon2id13, SecurityLevel::Interactive) => (2, 64 * MIB),
            (Algorithm::Argon2id13, SecurityLevel::Moderate) => (3, 256 * MIB),
            (Algorithm::Argon2id13, SecurityLevel::Sensitive) => (4, 1024 * MIB),
            (Algorithm::Argon2i13, SecurityLevel::Interactive) => (4, 32 * MIB),
            (Algorithm::Argon2i13, SecurityLevel::Moderate) => (6, 128 * MIB),
            (Algorithm::Argon2i13, SecurityLevel::Sensitive) => (8, 512 * MIB),
        }
    }

    pub fn ops_limit(self, algorithm: Algorithm) -> u64 {
        self.limits(algorithm).0
    }

    pub fn mem_limit(self, algorithm: Algorithm) -> u64 {
        self.limits(algorithm).1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SecurityLevel::Interactive => "interactive",
            SecurityLevel::Moderate => "moderate",
            SecurityLevel::Sensitive => "sensitive",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SecurityLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "unknown security level '{s}' (expected interactive, moderate or sensitive)"
                ))
            })
    }
}
