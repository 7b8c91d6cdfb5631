use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures surfaced by sealbox.
///
/// A message that fails authentication is not represented here: decryption
/// reports it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{what} must be {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{what} must be between {min} and {max}, got {value}")]
    InvalidLimit {
        what: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("salt length {salt_len} exceeds nonce length {nonce_len}")]
    SaltTooLong { salt_len: usize, nonce_len: usize },

    #[error("{operation} failed: {reason}")]
    Backend {
        operation: &'static str,
        reason: String,
    },

    #[error("malformed sealed file: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn backend(operation: &'static str, reason: impl ToString) -> Self {
        Error::Backend {
            operation,
            reason: reason.to_string(),
        }
    }
}
