//! SHA-224 digest value type.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224};

/// Length of a SHA-224 digest in bytes.
pub const SUM224_LEN: usize = 28;

/// Errors from parsing a hex-encoded digest.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParseSumError {
    /// The input contained non-hex characters or an odd number of digits.
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The input decoded to something other than 28 bytes.
    #[error("hex string not 224-bit")]
    WrongLength,
}

/// A SHA-224 checksum as a fixed 28-byte value.
///
/// Equality is bytewise. The hex representation is always 56 lowercase
/// characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Sum224([u8; SUM224_LEN]);

impl Sum224 {
    /// Compute the SHA-224 digest of `data`.
    pub fn from_data(data: &[u8]) -> Self {
        let digest: [u8; SUM224_LEN] = Sha224::digest(data).into();
        Self(digest)
    }

    /// Parse a digest from its 56-character hex representation.
    pub fn from_hex(s: &str) -> Result<Self, ParseSumError> {
        let raw = hex::decode(s)?;
        if raw.len() != SUM224_LEN {
            return Err(ParseSumError::WrongLength);
        }
        let mut out = [0u8; SUM224_LEN];
        out.copy_from_slice(&raw);
        Ok(Self(out))
    }

    /// Return the raw 28-byte representation.
    pub fn as_bytes(&self) -> &[u8; SUM224_LEN] {
        &self.0
    }

    /// Bytewise comparison against a raw digest slice.
    pub fn eq_bytes(&self, other: &[u8]) -> bool {
        self.0[..] == *other
    }
}

impl From<[u8; SUM224_LEN]> for Sum224 {
    fn from(bytes: [u8; SUM224_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Sum224 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Sum224 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Sum224 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sum224({self})")
    }
}
