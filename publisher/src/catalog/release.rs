//! Release descriptor and catalog types.

use super::error::ReleaseEntryError;
use super::sha1_digest::Sha1Digest;
use serde::Deserialize;

/// Longest version accepted; matches the container tag length limit.
const MAX_VERSION_LEN: usize = 128;

/// One upstream release: version, archive location and expected digest.
///
/// On the wire the download location is `uri` and the digest is `sha1`;
/// any additional fields are ignored. The version and digest are kept as
/// published and checked per entry, so one bad entry does not make the rest
/// of the catalog unusable.
///
/// # Examples
///
/// ```
/// use release_image_publisher::catalog::{ReleaseDescriptor, Sha1Digest};
///
/// let digest = Sha1Digest::of_bytes(b"archive");
/// let release = ReleaseDescriptor::new(
///     "6.3.1",
///     "https://releases.example.test/6.3.1.zip",
///     digest.as_str(),
/// );
/// assert_eq!(release.version(), "6.3.1");
/// assert_eq!(release.expected_hash().ok(), Some(digest));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseDescriptor {
    version: String,
    #[serde(rename = "uri")]
    download_uri: String,
    sha1: String,
}

impl ReleaseDescriptor {
    /// Create a release descriptor.
    #[must_use]
    pub fn new(
        version: impl Into<String>,
        download_uri: impl Into<String>,
        sha1: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            download_uri: download_uri.into(),
            sha1: sha1.into(),
        }
    }

    /// The release version, also used as the image tag.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Where the release archive can be downloaded from.
    #[must_use]
    pub fn download_uri(&self) -> &str {
        &self.download_uri
    }

    /// The digest exactly as listed in the catalog.
    #[must_use]
    pub fn sha1(&self) -> &str {
        &self.sha1
    }

    /// Check that the version is a valid container tag, which also keeps it
    /// safe to use as a file name.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseEntryError::InvalidVersion`] naming the violated
    /// constraint.
    pub fn validate_version(&self) -> Result<(), ReleaseEntryError> {
        let version = self.version.as_str();
        let invalid = |reason: String| ReleaseEntryError::InvalidVersion {
            version: version.to_owned(),
            reason,
        };

        let Some(first) = version.chars().next() else {
            return Err(invalid("version is empty".to_owned()));
        };
        if version.len() > MAX_VERSION_LEN {
            return Err(invalid(format!(
                "longer than {MAX_VERSION_LEN} characters"
            )));
        }
        if first == '.' || first == '-' {
            return Err(invalid(format!("must not start with '{first}'")));
        }
        if let Some(bad) = version
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(invalid(format!("contains '{bad}'")));
        }
        Ok(())
    }

    /// The digest the downloaded archive must match.
    ///
    /// # Errors
    ///
    /// Returns [`ReleaseEntryError::InvalidDigest`] when the catalog value is
    /// not a SHA-1 hex string.
    pub fn expected_hash(&self) -> Result<Sha1Digest, ReleaseEntryError> {
        Sha1Digest::try_from(self.sha1.as_str()).map_err(|source| {
            ReleaseEntryError::InvalidDigest {
                version: self.version.clone(),
                source,
            }
        })
    }
}

/// Ordered list of releases as published upstream.
///
/// Order is significant: the first entry is the latest release.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    releases: Vec<ReleaseDescriptor>,
}

impl Catalog {
    /// Wrap a list of releases in upstream order.
    #[must_use]
    pub fn new(releases: Vec<ReleaseDescriptor>) -> Self {
        Self { releases }
    }

    /// The latest release, if the catalog is not empty.
    #[must_use]
    pub fn latest(&self) -> Option<&ReleaseDescriptor> {
        self.releases.first()
    }

    /// Iterate over the releases in upstream order.
    pub fn iter(&self) -> std::slice::Iter<'_, ReleaseDescriptor> {
        self.releases.iter()
    }

    /// Number of releases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Whether the catalog lists no releases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ReleaseDescriptor;
    type IntoIter = std::slice::Iter<'a, ReleaseDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.releases.iter()
    }
}
