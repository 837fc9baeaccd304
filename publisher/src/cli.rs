//! CLI argument definitions for the release image publisher.
//!
//! Every option can also be supplied through an environment variable so the
//! publisher can be configured entirely from a CI job definition. Arguments
//! are resolved once into a [`PublisherConfig`](crate::config::PublisherConfig)
//! at start-up; nothing else reads the environment.

use crate::catalog::fetcher::DEFAULT_CATALOG_URL;
use crate::context::{DEFAULT_ASSETS_DIR, DEFAULT_BUILD_DIR, DEFAULT_EXTRACT_DIR_NAME};
use crate::gate::DEFAULT_TAG_URL_TEMPLATE;
use crate::image::{DEFAULT_NAMESPACE, DEFAULT_REPOSITORY};
use crate::rebuild::{DEFAULT_PUSH_BRANCH, DEFAULT_REBUILD_FILE};
use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

/// Build and publish container images for upstream releases.
#[derive(Parser, Debug, Clone)]
#[command(name = "release-image-publisher")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build and publish container images for upstream releases.\n\n",
    "The publisher fetches the release catalog, skips every version whose ",
    "image tag already exists in the registry, and downloads, verifies, ",
    "builds and pushes the rest. The newest release is also tagged `latest`.\n\n",
    "A version named on the first line of the rebuild file is rebuilt even ",
    "if it is already published. After the run the file is removed and the ",
    "removal is committed and pushed using GH_TOKEN and GH_REPOSITORY.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Publish every missing version:\n",
    "    $ release-image-publisher\n\n",
    "  Publish to another registry namespace:\n",
    "    $ release-image-publisher --registry-namespace acme\n\n",
    "  Show what would be published without downloading anything:\n",
    "    $ release-image-publisher --dry-run\n",
))]
pub struct Cli {
    /// Release catalog endpoint.
    #[arg(long, env = "SHOPWARE_RELEASES_URL", value_name = "URL", default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Registry namespace images are pushed to.
    #[arg(long, env = "DOCKER_USERNAME", value_name = "NAME", default_value = DEFAULT_NAMESPACE)]
    pub registry_namespace: String,

    /// Repository within the registry namespace.
    #[arg(long, env = "DOCKER_REPOSITORY", value_name = "NAME", default_value = DEFAULT_REPOSITORY)]
    pub registry_repository: String,

    /// Tag lookup URL; `{namespace}`, `{repository}` and `{version}` are
    /// substituted.
    #[arg(long, env = "REGISTRY_TAG_URL", value_name = "TEMPLATE", default_value = DEFAULT_TAG_URL_TEMPLATE)]
    pub tag_url_template: String,

    /// Directory release archives are cached in.
    #[arg(long, value_name = "DIR", default_value = "downloads")]
    pub download_dir: Utf8PathBuf,

    /// Build context directory.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_BUILD_DIR)]
    pub build_dir: Utf8PathBuf,

    /// Directory holding `docker/*.Dockerfile` and `php/*.ini` assets.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_ASSETS_DIR)]
    pub assets_dir: Utf8PathBuf,

    /// Name of the directory inside the build context the release is
    /// extracted into.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_EXTRACT_DIR_NAME)]
    pub extract_dir_name: String,

    /// Git working copy holding the rebuild file.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub repo_dir: Utf8PathBuf,

    /// Rebuild file, relative to the repository directory.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_REBUILD_FILE)]
    pub rebuild_file: Utf8PathBuf,

    /// Branch the rebuild file reset is pushed to.
    #[arg(long, env = "GH_BRANCH", value_name = "BRANCH", default_value = DEFAULT_PUSH_BRANCH)]
    pub push_branch: String,

    /// Timeout for each HTTP request, including the body transfer.
    #[arg(long, value_name = "SECONDS", default_value_t = 900)]
    pub http_timeout_secs: u64,

    /// Token used to push the rebuild file reset.
    #[arg(long, env = "GH_TOKEN", hide = true, hide_env_values = true)]
    pub github_token: Option<String>,

    /// `owner/name` of the repository the rebuild file reset is pushed to.
    #[arg(long, env = "GH_REPOSITORY", value_name = "OWNER/NAME")]
    pub github_repository: Option<String>,

    /// Show which versions would be published and exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only log warnings and errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Log level selected by `-v`/`-q`.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Warn;
        }
        match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
