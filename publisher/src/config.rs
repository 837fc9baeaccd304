//! Resolved publisher configuration.
//!
//! [`PublisherConfig`] is built once from the parsed [`Cli`] and validated
//! before any collaborator is constructed.

use crate::cli::Cli;
use crate::error::{PublisherError, Result};
use crate::image::ImageName;
use crate::rebuild::{FinalizeSettings, GitIdentity, PushCredentials};
use camino::Utf8PathBuf;
use std::time::Duration;

/// Everything a run needs, resolved from arguments and environment.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Release catalog endpoint.
    pub catalog_url: String,
    /// Registry coordinates images are pushed to.
    pub image: ImageName,
    /// Tag lookup URL template.
    pub tag_url_template: String,
    /// Archive cache directory.
    pub download_dir: Utf8PathBuf,
    /// Build context directory.
    pub build_dir: Utf8PathBuf,
    /// Build asset directory.
    pub assets_dir: Utf8PathBuf,
    /// Extraction directory name inside the build context.
    pub extract_dir_name: String,
    /// Rebuild override location and reset settings.
    pub finalize: FinalizeSettings,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
    /// Only report what would be done.
    pub dry_run: bool,
}

impl PublisherConfig {
    /// Resolve and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::InvalidConfig`] when a value cannot work:
    /// an empty registry coordinate, a tag template without `{version}`, a
    /// zero timeout, or an extraction directory name that is not a single
    /// path component.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        require_non_empty("catalog URL", &cli.catalog_url)?;
        require_non_empty("registry namespace", &cli.registry_namespace)?;
        require_non_empty("registry repository", &cli.registry_repository)?;
        require_non_empty("push branch", &cli.push_branch)?;

        if !cli.tag_url_template.contains("{version}") {
            return Err(invalid(format!(
                "tag URL template `{}` has no {{version}} placeholder",
                cli.tag_url_template
            )));
        }
        if cli.http_timeout_secs == 0 {
            return Err(invalid("HTTP timeout must be at least one second".to_owned()));
        }
        let name = cli.extract_dir_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(invalid(format!(
                "extract directory name `{name}` must be a single path component"
            )));
        }

        Ok(Self {
            catalog_url: cli.catalog_url.clone(),
            image: ImageName::new(&cli.registry_namespace, &cli.registry_repository),
            tag_url_template: cli.tag_url_template.clone(),
            download_dir: cli.download_dir.clone(),
            build_dir: cli.build_dir.clone(),
            assets_dir: cli.assets_dir.clone(),
            extract_dir_name: cli.extract_dir_name.clone(),
            finalize: FinalizeSettings {
                repo_dir: cli.repo_dir.clone(),
                rebuild_file: cli.rebuild_file.clone(),
                credentials: PushCredentials::new(
                    cli.github_token.clone(),
                    cli.github_repository.clone(),
                ),
                identity: GitIdentity::default(),
                branch: cli.push_branch.clone(),
            },
            http_timeout: Duration::from_secs(cli.http_timeout_secs),
            dry_run: cli.dry_run,
        })
    }
}

fn invalid(reason: String) -> PublisherError {
    PublisherError::InvalidConfig { reason }
}

fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{what} must not be empty")));
    }
    Ok(())
}
