//! Error types for the release image publisher.
//!
//! This module defines the semantic error variants raised while fetching the
//! release catalog, downloading and verifying archives, preparing build
//! contexts, building images and resetting the rebuild override. Only catalog
//! errors abort a run; the orchestrator scopes every other variant to the
//! version being processed.

use crate::catalog::error::CatalogParseError;
use crate::catalog::sha1_digest::Sha1Digest;
use crate::context::AssetKind;
use crate::extraction::ExtractionError;
use crate::http::HttpError;
use thiserror::Error;

/// Errors that can occur while publishing release images.
#[derive(Debug, Error)]
pub enum PublisherError {
    /// An HTTP request failed or returned a non-success status.
    #[error("network error: {0}")]
    Network(#[from] HttpError),

    /// The release catalog body could not be understood.
    #[error("invalid release catalog: {0}")]
    Parse(#[from] CatalogParseError),

    /// The downloaded archive never matched its expected digest.
    #[error(
        "integrity check failed for version {version} after {attempts} attempt(s): \
         expected {expected}, got {actual}"
    )]
    Integrity {
        /// Version whose archive failed verification.
        version: String,
        /// Number of download attempts consumed.
        attempts: u32,
        /// Digest recorded in the catalog.
        expected: Sha1Digest,
        /// Digest of the last downloaded file.
        actual: Sha1Digest,
    },

    /// Neither a version-specific nor a fallback build asset exists.
    #[error("no {kind} found for version {version}; looked for {candidates}")]
    MissingAsset {
        /// The kind of asset that was looked up.
        kind: AssetKind,
        /// Version the asset was requested for.
        version: String,
        /// Comma-separated list of the paths that were tried.
        candidates: String,
    },

    /// Credentials needed to reset the rebuild override are missing.
    #[error("cannot reset the rebuild file: {reason}")]
    Credential {
        /// Which credential is missing.
        reason: &'static str,
    },

    /// A git operation used to reset the rebuild override failed.
    #[error("git {operation} failed: {message}")]
    Git {
        /// The git operation that failed (rm, commit, push).
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// An external command exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit status as reported by the platform.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// An external command did not finish in time and was killed.
    #[error("`{command}` timed out after {seconds} seconds")]
    CommandTimedOut {
        /// The command line that was run.
        command: String,
        /// The timeout that was exceeded.
        seconds: u64,
    },

    /// Extracting a release archive failed.
    #[error("archive extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// The resolved configuration is unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`PublisherError`].
pub type Result<T> = std::result::Result<T, PublisherError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(fill: char) -> Sha1Digest {
        Sha1Digest::try_from(fill.to_string().repeat(40).as_str()).expect("valid digest")
    }

    #[test]
    fn integrity_error_names_version_and_digests() {
        let err = PublisherError::Integrity {
            version: "6.3.1".to_owned(),
            attempts: 3,
            expected: digest('a'),
            actual: digest('b'),
        };
        let msg = err.to_string();
        assert!(msg.contains("6.3.1"));
        assert!(msg.contains("3 attempt"));
        assert!(msg.contains(&"a".repeat(40)));
        assert!(msg.contains(&"b".repeat(40)));
    }

    #[test]
    fn missing_asset_lists_candidates() {
        let err = PublisherError::MissingAsset {
            kind: AssetKind::Dockerfile,
            version: "6.3.1".to_owned(),
            candidates: "assets/docker/6.3.1.Dockerfile, assets/docker/all.Dockerfile".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Dockerfile"));
        assert!(msg.contains("all.Dockerfile"));
    }

    #[test]
    fn git_error_includes_operation_and_message() {
        let err = PublisherError::Git {
            operation: "push",
            message: "rejected".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("push"));
        assert!(msg.contains("rejected"));
    }
}
