//! Container image construction and registry push.
//!
//! Images are addressed as `{namespace}/{repository}:{tag}`. The default
//! builder shells out to `docker` through a [`CommandExecutor`], so tests can
//! script the tool's behaviour with a stub.

use crate::error::Result;
use crate::process::{CommandExecutor, ensure_success};
use camino::Utf8Path;
use log::{debug, info};
use std::fmt;

/// Floating tag applied to the newest release.
pub const LATEST_TAG: &str = "latest";

/// Default registry namespace.
pub const DEFAULT_NAMESPACE: &str = "yfricke";

/// Default repository within the namespace.
pub const DEFAULT_REPOSITORY: &str = "shopware";

/// Registry coordinates of the published image.
///
/// # Examples
///
/// ```
/// use release_image_publisher::image::ImageName;
///
/// let image = ImageName::new("acme", "shop");
/// assert_eq!(image.reference("6.3.1"), "acme/shop:6.3.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageName {
    namespace: String,
    repository: String,
}

impl ImageName {
    /// Create an image name from its registry coordinates.
    #[must_use]
    pub fn new(namespace: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            repository: repository.into(),
        }
    }

    /// The registry namespace (user or organisation).
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The repository within the namespace.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Full image reference for `tag`.
    #[must_use]
    pub fn reference(&self, tag: &str) -> String {
        format!("{self}:{tag}")
    }
}

impl Default for ImageName {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, DEFAULT_REPOSITORY)
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.repository)
    }
}

/// Builds and pushes images for a prepared build context.
#[cfg_attr(test, mockall::automock)]
pub trait ImageBuilder {
    /// Build the image tagged `tag` from `context_dir`, which must contain
    /// a `Dockerfile`.
    ///
    /// # Errors
    ///
    /// Returns an error if the build tool cannot be run or fails.
    fn build(&self, tag: &str, context_dir: &Utf8Path) -> Result<()>;

    /// Push the image tagged `tag` to the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the push tool cannot be run or fails.
    fn push(&self, tag: &str) -> Result<()>;
}

/// [`ImageBuilder`] that drives the `docker` CLI.
pub struct DockerImageBuilder<'a> {
    executor: &'a dyn CommandExecutor,
    image: ImageName,
}

impl<'a> DockerImageBuilder<'a> {
    /// Create a builder publishing to `image`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, image: ImageName) -> Self {
        Self { executor, image }
    }
}

impl ImageBuilder for DockerImageBuilder<'_> {
    fn build(&self, tag: &str, context_dir: &Utf8Path) -> Result<()> {
        let reference = self.image.reference(tag);
        let dockerfile = context_dir.join("Dockerfile");
        let args = [
            "build",
            "-t",
            reference.as_str(),
            "--file",
            dockerfile.as_str(),
            context_dir.as_str(),
        ];

        debug!("Building image {reference} from {context_dir}");
        let output = self.executor.run("docker", &args)?;
        ensure_success("docker", &args, &output)?;
        info!("Built image {reference}");
        Ok(())
    }

    fn push(&self, tag: &str) -> Result<()> {
        let reference = self.image.reference(tag);
        let args = ["push", reference.as_str()];

        debug!("Pushing image {reference}");
        let output = self.executor.run("docker", &args)?;
        ensure_success("docker", &args, &output)?;
        info!("Pushed image {reference}");
        Ok(())
    }
}
