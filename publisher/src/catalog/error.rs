//! Error types for the release catalog.

use super::sha1_digest::DigestError;
use thiserror::Error;

/// Errors arising from an unusable catalog body.
#[derive(Debug, Error)]
pub enum CatalogParseError {
    /// The body is not a JSON array of release objects, or a required field
    /// is absent.
    #[error("malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by a single catalog entry that cannot be published.
///
/// These never reject the whole catalog; the entry is reported as failed and
/// the remaining entries are processed.
#[derive(Debug, Error)]
pub enum ReleaseEntryError {
    /// The version cannot be used as an image tag or file name.
    #[error("unusable version \"{version}\": {reason}")]
    InvalidVersion {
        /// The rejected version string.
        version: String,
        /// Description of the violated constraint.
        reason: String,
    },

    /// The catalog digest is not a SHA-1 hex string.
    #[error("version {version} has an invalid digest: {source}")]
    InvalidDigest {
        /// The version whose digest was rejected.
        version: String,
        /// Why the digest was rejected.
        source: DigestError,
    },
}
