//! Release publishing pipeline.
//!
//! For every catalog entry, in upstream order, the orchestrator decides
//! whether the version needs publishing, obtains a verified archive,
//! prepares the build context, then builds and pushes the image. The first
//! catalog entry is additionally published as `latest`. Only a failure to
//! fetch the catalog aborts the run; every other failure is logged and
//! scoped to its version.

use camino::{Utf8Path, Utf8PathBuf};
use log::{error, info, warn};
use std::fmt;

use crate::catalog::{CatalogSource, ReleaseDescriptor};
use crate::context::BuildContext;
use crate::downloader::ArtifactFetcher;
use crate::error::Result;
use crate::gate::PublishCheck;
use crate::image::{ImageBuilder, LATEST_TAG};
use crate::rebuild::RebuildOverride;
use crate::summary::{RunSummary, VersionOutcome};

/// The external capabilities the pipeline drives.
pub struct Collaborators<'a> {
    /// Source of the release catalog.
    pub catalog: &'a dyn CatalogSource,
    /// Registry existence check.
    pub gate: &'a dyn PublishCheck,
    /// Verified archive download.
    pub downloader: &'a dyn ArtifactFetcher,
    /// Build context preparation (extraction and assets).
    pub build_context: &'a dyn BuildContext,
    /// Image build and push.
    pub images: &'a dyn ImageBuilder,
}

/// Whether a version will be processed, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Already published and not forced.
    Skip,
    /// Not yet published.
    Publish,
    /// Forced by the rebuild override; the registry was not consulted.
    ForcedRebuild,
    /// The catalog entry has an unusable version or digest.
    Reject,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip (already published)",
            Self::Publish => "publish",
            Self::ForcedRebuild => "publish (forced rebuild)",
            Self::Reject => "reject (invalid catalog entry)",
        })
    }
}

/// One row of a dry-run plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRelease {
    /// The release version.
    pub version: String,
    /// What a real run would do with it.
    pub decision: Decision,
    /// Whether the version would also be tagged `latest`.
    pub latest: bool,
}

/// Drives the publishing pipeline over one catalog.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8PathBuf;
/// use release_image_publisher::orchestrator::{Collaborators, Orchestrator};
/// # fn demo(
/// #     collaborators: Collaborators<'_>,
/// #     rebuild: &mut dyn release_image_publisher::rebuild::RebuildOverride,
/// # ) -> release_image_publisher::error::Result<()> {
/// let mut orchestrator = Orchestrator::new(collaborators, Utf8PathBuf::from("downloads"), rebuild);
/// let summary = orchestrator.run()?;
/// println!("{}", summary.summary_line());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<'a> {
    collaborators: Collaborators<'a>,
    download_dir: Utf8PathBuf,
    rebuild: &'a mut dyn RebuildOverride,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator caching archives in `download_dir`.
    #[must_use]
    pub fn new(
        collaborators: Collaborators<'a>,
        download_dir: Utf8PathBuf,
        rebuild: &'a mut dyn RebuildOverride,
    ) -> Self {
        Self {
            collaborators,
            download_dir,
            rebuild,
        }
    }

    /// Run the pipeline over the whole catalog, then reset the rebuild
    /// override.
    ///
    /// # Errors
    ///
    /// Returns an error only when the catalog cannot be fetched or parsed.
    /// Per-version failures are recorded in the returned [`RunSummary`].
    pub fn run(&mut self) -> Result<RunSummary> {
        let catalog = self.collaborators.catalog.fetch()?;
        self.rebuild.load();

        let mut outcomes = Vec::with_capacity(catalog.len());
        for (index, release) in catalog.iter().enumerate() {
            let outcome = self.process(release, index == 0);
            info!("Version {}: {outcome}", release.version());
            outcomes.push((release.version().to_owned(), outcome));
        }

        let finalize = match self.rebuild.finalize() {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("Could not reset the rebuild file: {e}");
                None
            }
        };

        let summary = RunSummary::new(outcomes, finalize);
        info!("Finished: {}", summary.summary_line());
        Ok(summary)
    }

    /// Compute what [`run`](Self::run) would do without downloading,
    /// building or pushing anything, and without resetting the override.
    ///
    /// # Errors
    ///
    /// Returns an error when the catalog cannot be fetched or parsed.
    pub fn plan(&mut self) -> Result<Vec<PlannedRelease>> {
        let catalog = self.collaborators.catalog.fetch()?;
        self.rebuild.load();

        Ok(catalog
            .iter()
            .enumerate()
            .map(|(index, release)| PlannedRelease {
                version: release.version().to_owned(),
                decision: self.plan_decision(release),
                latest: index == 0,
            })
            .collect())
    }

    fn plan_decision(&self, release: &ReleaseDescriptor) -> Decision {
        if release.validate_version().is_err() {
            return Decision::Reject;
        }
        match self.decide(release.version()) {
            Decision::Skip => Decision::Skip,
            _ if release.expected_hash().is_err() => Decision::Reject,
            decision => decision,
        }
    }

    fn decide(&self, version: &str) -> Decision {
        if self.rebuild.needs_rebuild(version) {
            Decision::ForcedRebuild
        } else if self.collaborators.gate.exists(version) {
            Decision::Skip
        } else {
            Decision::Publish
        }
    }

    fn process(&self, release: &ReleaseDescriptor, is_latest: bool) -> VersionOutcome {
        let version = release.version();
        info!("Processing version {version}");
        if let Err(e) = release.validate_version() {
            error!("Rejecting catalog entry: {e}");
            return VersionOutcome::DownloadFailed;
        }

        match self.decide(version) {
            Decision::Skip => {
                info!("Version {version} is already published");
                return VersionOutcome::Skipped;
            }
            Decision::ForcedRebuild => info!("Version {version} is forced to rebuild"),
            Decision::Publish | Decision::Reject => {}
        }

        let expected = match release.expected_hash() {
            Ok(expected) => expected,
            Err(e) => {
                error!("Cannot verify an archive for version {version}: {e}");
                return VersionOutcome::DownloadFailed;
            }
        };
        let archive = match self.collaborators.downloader.fetch(
            &self.download_dir,
            version,
            release.download_uri(),
            &expected,
        ) {
            Ok(archive) => archive,
            Err(e) => {
                error!("Could not obtain a verified archive for version {version}: {e}");
                return VersionOutcome::DownloadFailed;
            }
        };

        let context = match self.build_and_push(version, &archive) {
            Ok(context) => context,
            Err(e) => {
                error!("Could not publish version {version}: {e}");
                return VersionOutcome::BuildFailed;
            }
        };

        if !is_latest {
            return VersionOutcome::Published;
        }
        match self.build_and_push_tag(LATEST_TAG, &context) {
            Ok(()) => VersionOutcome::PublishedAsLatest,
            Err(e) => {
                warn!("Published version {version} but could not update the {LATEST_TAG} tag: {e}");
                VersionOutcome::Published
            }
        }
    }

    fn build_and_push(&self, version: &str, archive: &Utf8Path) -> Result<Utf8PathBuf> {
        let context = self.collaborators.build_context.prepare(version, archive)?;
        self.build_and_push_tag(version, &context)?;
        Ok(context)
    }

    fn build_and_push_tag(&self, tag: &str, context: &Utf8Path) -> Result<()> {
        info!("Building image tag {tag}");
        self.collaborators.images.build(tag, context)?;
        info!("Pushing image tag {tag}");
        self.collaborators.images.push(tag)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
