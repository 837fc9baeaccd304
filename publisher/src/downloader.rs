//! Verified release archive downloads.
//!
//! An archive is cached at `{download_dir}/{version}.zip`. A cached file that
//! already matches the expected SHA-1 digest is reused without touching the
//! network; otherwise the archive is downloaded and re-verified, up to
//! [`MAX_ATTEMPTS`] times.

use crate::catalog::Sha1Digest;
use crate::error::{PublisherError, Result};
use crate::http::{HttpError, HttpTransport};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::fs;
use std::io;

/// Number of download attempts made before giving up on a version.
pub const MAX_ATTEMPTS: u32 = 3;

/// Cache location of the archive for `version`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use release_image_publisher::downloader::artifact_path;
///
/// let path = artifact_path(Utf8Path::new("downloads"), "6.3.1");
/// assert_eq!(path, "downloads/6.3.1.zip");
/// ```
#[must_use]
pub fn artifact_path(download_dir: &Utf8Path, version: &str) -> Utf8PathBuf {
    download_dir.join(format!("{version}.zip"))
}

/// Produces a locally cached archive whose digest has been verified.
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactFetcher {
    /// Ensure the archive for `version` exists in `destination_dir` and
    /// matches `expected`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::Integrity`] when every attempt produced a
    /// mismatching file, [`PublisherError::Network`] when the last attempt
    /// failed to download, and [`PublisherError::Io`] on local file errors.
    fn fetch(
        &self,
        destination_dir: &Utf8Path,
        version: &str,
        uri: &str,
        expected: &Sha1Digest,
    ) -> Result<Utf8PathBuf>;
}

/// [`ArtifactFetcher`] that downloads over HTTP and verifies SHA-1 digests.
pub struct VerifiedDownloader<'a> {
    transport: &'a dyn HttpTransport,
}

impl<'a> VerifiedDownloader<'a> {
    /// Create a downloader using `transport`.
    #[must_use]
    pub fn new(transport: &'a dyn HttpTransport) -> Self {
        Self { transport }
    }

    fn attempt(
        &self,
        uri: &str,
        path: &Utf8Path,
        expected: &Sha1Digest,
    ) -> std::result::Result<(), AttemptFailure> {
        let bytes = self
            .transport
            .download_to_file(uri, path.as_std_path())
            .map_err(AttemptFailure::Http)?;
        debug!("Downloaded {bytes} bytes to {path}");

        let actual = Sha1Digest::of_file(path.as_std_path()).map_err(AttemptFailure::Io)?;
        if &actual == expected {
            Ok(())
        } else {
            Err(AttemptFailure::Mismatch { actual })
        }
    }
}

/// Why a single download attempt did not yield a verified file.
#[derive(Debug)]
enum AttemptFailure {
    Http(HttpError),
    Io(io::Error),
    Mismatch { actual: Sha1Digest },
}

impl AttemptFailure {
    fn into_error(self, version: &str, expected: &Sha1Digest) -> PublisherError {
        match self {
            Self::Http(e) => PublisherError::Network(e),
            Self::Io(e) => PublisherError::Io(e),
            Self::Mismatch { actual } => PublisherError::Integrity {
                version: version.to_owned(),
                attempts: MAX_ATTEMPTS,
                expected: expected.clone(),
                actual,
            },
        }
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "could not hash download: {e}"),
            Self::Mismatch { actual } => write!(f, "digest mismatch (got {actual})"),
        }
    }
}

impl ArtifactFetcher for VerifiedDownloader<'_> {
    fn fetch(
        &self,
        destination_dir: &Utf8Path,
        version: &str,
        uri: &str,
        expected: &Sha1Digest,
    ) -> Result<Utf8PathBuf> {
        fs::create_dir_all(destination_dir)?;
        let path = artifact_path(destination_dir, version);

        if path.exists() {
            match Sha1Digest::of_file(path.as_std_path()) {
                Ok(cached) if &cached == expected => {
                    info!("Using cached archive {path} for version {version}");
                    return Ok(path);
                }
                Ok(_) => {
                    debug!("Cached archive {path} does not match the expected digest; downloading");
                }
                Err(e) => warn!("Cannot read cached archive {path}: {e}; downloading"),
            }
        }

        let mut attempt = 1;
        loop {
            debug!("Downloading version {version} from {uri} (attempt {attempt}/{MAX_ATTEMPTS})");
            match self.attempt(uri, &path, expected) {
                Ok(()) => {
                    info!("Downloaded and verified version {version}");
                    return Ok(path);
                }
                Err(failure) if attempt < MAX_ATTEMPTS => {
                    warn!(
                        "Download attempt {attempt}/{MAX_ATTEMPTS} for version {version} failed: {failure}"
                    );
                    attempt += 1;
                }
                Err(failure) => {
                    warn!(
                        "Download attempt {attempt}/{MAX_ATTEMPTS} for version {version} failed: {failure}"
                    );
                    return Err(failure.into_error(version, expected));
                }
            }
        }
    }
}
