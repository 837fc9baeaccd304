//! Build context preparation.
//!
//! A build context is the directory handed to the image builder. For each
//! version it holds the extracted release under `{extract_dir_name}/`, plus a
//! `Dockerfile` and a `php.ini` chosen from the assets directory. Assets are
//! looked up per version first and fall back to a shared `all` variant.

use crate::error::{PublisherError, Result};
use crate::extraction::ArchiveExtractor;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::io;

/// Name of the fallback asset used when no version-specific one exists.
const FALLBACK_ASSET: &str = "all";

/// Default directory holding Dockerfiles and PHP configuration.
pub const DEFAULT_ASSETS_DIR: &str = "assets";

/// Default build context directory.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Default directory name the release is extracted into.
pub const DEFAULT_EXTRACT_DIR_NAME: &str = "shopware";

/// A file copied into every build context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// The image recipe, copied to `Dockerfile`.
    Dockerfile,
    /// PHP runtime configuration, copied to `php.ini`.
    PhpConfiguration,
}

impl AssetKind {
    fn subdirectory(self) -> &'static str {
        match self {
            Self::Dockerfile => "docker",
            Self::PhpConfiguration => "php",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Dockerfile => "Dockerfile",
            Self::PhpConfiguration => "ini",
        }
    }

    /// File name of the asset inside the build context.
    #[must_use]
    pub fn context_file_name(self) -> &'static str {
        match self {
            Self::Dockerfile => "Dockerfile",
            Self::PhpConfiguration => "php.ini",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dockerfile => write!(f, "Dockerfile"),
            Self::PhpConfiguration => write!(f, "PHP configuration file"),
        }
    }
}

/// Resolves version-specific build assets with a shared fallback.
///
/// # Examples
///
/// ```no_run
/// use release_image_publisher::context::{AssetCatalog, AssetKind};
///
/// let assets = AssetCatalog::new("assets");
/// // assets/docker/6.3.1.Dockerfile, or assets/docker/all.Dockerfile
/// let dockerfile = assets.resolve(AssetKind::Dockerfile, "6.3.1")?;
/// # Ok::<(), release_image_publisher::error::PublisherError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    assets_dir: Utf8PathBuf,
}

impl AssetCatalog {
    /// Create a catalog rooted at `assets_dir`.
    #[must_use]
    pub fn new(assets_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
        }
    }

    fn candidate(&self, kind: AssetKind, name: &str) -> Utf8PathBuf {
        self.assets_dir
            .join(kind.subdirectory())
            .join(format!("{name}.{}", kind.extension()))
    }

    /// Path of the asset to use for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::MissingAsset`] when neither the
    /// version-specific nor the fallback file exists.
    pub fn resolve(&self, kind: AssetKind, version: &str) -> Result<Utf8PathBuf> {
        let candidates = [
            self.candidate(kind, version),
            self.candidate(kind, FALLBACK_ASSET),
        ];
        if let Some(found) = candidates.iter().find(|path| path.is_file()) {
            debug!("Using {found} as {kind} for version {version}");
            return Ok(found.clone());
        }
        Err(PublisherError::MissingAsset {
            kind,
            version: version.to_owned(),
            candidates: candidates
                .iter()
                .map(Utf8PathBuf::as_path)
                .map(Utf8Path::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Prepares the directory an image is built from.
#[cfg_attr(test, mockall::automock)]
pub trait BuildContext {
    /// Populate the build context for `version` from `archive` and return
    /// the context directory.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction fails, an asset is missing, or the
    /// context directory cannot be written.
    fn prepare(&self, version: &str, archive: &Utf8Path) -> Result<Utf8PathBuf>;
}

/// Filesystem-backed [`BuildContext`].
pub struct BuildContextPreparer<'a> {
    extractor: &'a dyn ArchiveExtractor,
    assets: AssetCatalog,
    build_dir: Utf8PathBuf,
    extract_dir_name: String,
}

impl<'a> BuildContextPreparer<'a> {
    /// Create a preparer writing into `build_dir`.
    #[must_use]
    pub fn new(
        extractor: &'a dyn ArchiveExtractor,
        assets: AssetCatalog,
        build_dir: impl Into<Utf8PathBuf>,
        extract_dir_name: impl Into<String>,
    ) -> Self {
        Self {
            extractor,
            assets,
            build_dir: build_dir.into(),
            extract_dir_name: extract_dir_name.into(),
        }
    }

    fn copy_asset(&self, kind: AssetKind, version: &str) -> Result<()> {
        let source = self.assets.resolve(kind, version)?;
        let dest = self.build_dir.join(kind.context_file_name());
        fs::copy(&source, &dest)?;
        Ok(())
    }
}

impl BuildContext for BuildContextPreparer<'_> {
    fn prepare(&self, version: &str, archive: &Utf8Path) -> Result<Utf8PathBuf> {
        // Resolve assets before touching the build directory so a missing
        // asset leaves the previous context intact.
        self.assets.resolve(AssetKind::Dockerfile, version)?;
        self.assets.resolve(AssetKind::PhpConfiguration, version)?;

        let extract_dir = self.build_dir.join(&self.extract_dir_name);
        match fs::remove_dir_all(&extract_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&extract_dir)?;

        info!("Extracting version {version} into {extract_dir}");
        let files = self
            .extractor
            .extract(archive.as_std_path(), extract_dir.as_std_path())?;
        debug!("Extracted {files} file(s) for version {version}");

        self.copy_asset(AssetKind::Dockerfile, version)?;
        self.copy_asset(AssetKind::PhpConfiguration, version)?;
        Ok(self.build_dir.clone())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
