//! SHA-1 digest newtype for release archive verification.
//!
//! Validates that the value is a 40-character hexadecimal string. Uppercase
//! input is folded to lowercase so that digests compare by plain value
//! equality everywhere else.

use sha1::{Digest, Sha1};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

/// Expected length of a hex-encoded SHA-1 digest.
const DIGEST_HEX_LEN: usize = 40;

/// Read size used when hashing files.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Error raised for a malformed digest string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid SHA-1 digest: {reason}")]
pub struct DigestError {
    reason: String,
}

/// A validated, lowercase hex-encoded SHA-1 digest.
///
/// # Examples
///
/// ```
/// use release_image_publisher::catalog::Sha1Digest;
///
/// let digest = Sha1Digest::try_from("DA39A3EE5E6B4B0D3255BFEF95601890AFD80709")?;
/// assert_eq!(digest.as_str(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
/// # Ok::<(), release_image_publisher::catalog::sha1_digest::DigestError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha1Digest(String);

impl Sha1Digest {
    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compute the digest of `bytes`.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(bytes);
        Self::from_hasher(hasher)
    }

    /// Compute the digest of the file at `path`, reading it in 64 KiB chunks.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while opening or reading the file.
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Sha1::new();
        let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if let Some(chunk) = buffer.get(..bytes_read) {
                hasher.update(chunk);
            }
        }
        Ok(Self::from_hasher(hasher))
    }

    fn from_hasher(hasher: Sha1) -> Self {
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl TryFrom<&str> for Sha1Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> Result<Self, DigestError> {
        validate_sha1(value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Sha1Digest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, DigestError> {
        Self::try_from(value.as_str())
    }
}

impl AsRef<str> for Sha1Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha1Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate that `value` is a well-formed hex-encoded SHA-1 digest.
fn validate_sha1(value: &str) -> Result<(), DigestError> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(DigestError {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(DigestError {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    Ok(())
}
