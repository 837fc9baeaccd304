//! Forced-rebuild override.
//!
//! A small file in the repository names a version that must be rebuilt even
//! though the registry already has it. After a run the file is removed and
//! the removal is committed and pushed, so the override fires exactly once.

use crate::error::{PublisherError, Result};
use crate::process::CommandExecutor;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;

/// Default name of the override file, relative to the repository directory.
pub const DEFAULT_REBUILD_FILE: &str = ".rebuild";

/// Default branch the reset commit is pushed to.
pub const DEFAULT_PUSH_BRANCH: &str = "master";

/// Commit message recording the reset. `[skip ci]` keeps the push from
/// triggering another run.
pub const RESET_COMMIT_MESSAGE: &str = "Processed rebuild file [skip ci]";

/// Credentials used to push the reset commit.
///
/// The token is redacted from the `Debug` output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PushCredentials {
    token: Option<String>,
    repository: Option<String>,
}

impl PushCredentials {
    /// Create credentials; either part may be absent.
    #[must_use]
    pub fn new(token: Option<String>, repository: Option<String>) -> Self {
        Self { token, repository }
    }

    /// The token and `owner/name` repository, when both are present and
    /// non-blank.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::Credential`] naming the missing part.
    pub fn require(&self) -> Result<(&str, &str)> {
        let token = non_blank(self.token.as_deref()).ok_or(PublisherError::Credential {
            reason: "no GitHub token configured",
        })?;
        let repository = non_blank(self.repository.as_deref()).ok_or(PublisherError::Credential {
            reason: "no GitHub repository configured",
        })?;
        Ok((token, repository))
    }
}

impl fmt::Debug for PushCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushCredentials")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("repository", &self.repository)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Committer identity for the reset commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    /// Value for `user.name`.
    pub name: String,
    /// Value for `user.email`.
    pub email: String,
}

impl Default for GitIdentity {
    fn default() -> Self {
        Self {
            name: "CI".to_owned(),
            email: "ci@localhost".to_owned(),
        }
    }
}

/// Where the override lives and how its reset is published.
#[derive(Debug, Clone)]
pub struct FinalizeSettings {
    /// Working copy the override file belongs to.
    pub repo_dir: Utf8PathBuf,
    /// Override file name, relative to `repo_dir`.
    pub rebuild_file: Utf8PathBuf,
    /// Credentials for the push.
    pub credentials: PushCredentials,
    /// Committer identity.
    pub identity: GitIdentity,
    /// Remote branch to push to.
    pub branch: String,
}

impl FinalizeSettings {
    /// Full path of the override file.
    #[must_use]
    pub fn rebuild_path(&self) -> Utf8PathBuf {
        self.repo_dir.join(&self.rebuild_file)
    }
}

/// What `finalize` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// No version was forced; nothing was touched.
    NothingToReset,
    /// The override file was removed, committed and pushed.
    Reset,
}

/// Access to the forced-rebuild override.
#[cfg_attr(test, mockall::automock)]
pub trait RebuildOverride {
    /// Read the override file. A missing or unreadable file means no
    /// version is forced.
    fn load(&mut self);

    /// Whether `version` must be rebuilt regardless of the registry.
    fn needs_rebuild(&self, version: &str) -> bool;

    /// Clear the override once the run has processed it.
    ///
    /// # Errors
    ///
    /// Returns [`PublisherError::Credential`] without touching anything when
    /// push credentials are missing, [`PublisherError::Io`] if the file
    /// cannot be removed, and [`PublisherError::Git`] if a git step fails.
    fn finalize(&mut self) -> Result<FinalizeOutcome>;
}

/// [`RebuildOverride`] backed by a file in a git working copy.
pub struct RebuildTracker<'a> {
    executor: &'a dyn CommandExecutor,
    settings: FinalizeSettings,
    forced: BTreeSet<String>,
}

impl<'a> RebuildTracker<'a> {
    /// Create a tracker with an empty state; call [`RebuildOverride::load`]
    /// before querying it.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, settings: FinalizeSettings) -> Self {
        Self {
            executor,
            settings,
            forced: BTreeSet::new(),
        }
    }

    /// Versions currently forced.
    #[must_use]
    pub fn forced_versions(&self) -> &BTreeSet<String> {
        &self.forced
    }

    fn git(&self, operation: &'static str, args: &[&str], secret: Option<&str>) -> Result<()> {
        let repo = self.settings.repo_dir.as_str();
        let mut full_args = vec!["-C", repo];
        full_args.extend_from_slice(args);

        let redact = |text: String| match secret {
            Some(secret) => text.replace(secret, "***"),
            None => text,
        };

        let output = self
            .executor
            .run("git", &full_args)
            .map_err(|e| PublisherError::Git {
                operation,
                message: redact(e.to_string()),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(PublisherError::Git {
                operation,
                message: redact(format!("{}: {stderr}", output.status)),
            });
        }
        Ok(())
    }
}

impl RebuildOverride for RebuildTracker<'_> {
    fn load(&mut self) {
        let path = self.settings.rebuild_path();
        match read_forced_version(&path) {
            Ok(Some(version)) => {
                info!("Version {version} is marked for a forced rebuild");
                self.forced.insert(version);
            }
            Ok(None) => debug!("No forced rebuild requested in {path}"),
            Err(e) => warn!("Could not read rebuild file {path}: {e}"),
        }
    }

    fn needs_rebuild(&self, version: &str) -> bool {
        self.forced.contains(version)
    }

    fn finalize(&mut self) -> Result<FinalizeOutcome> {
        if self.forced.is_empty() {
            return Ok(FinalizeOutcome::NothingToReset);
        }
        let (token, repository) = self.settings.credentials.require()?;

        let path = self.settings.rebuild_path();
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let rebuild_file = self.settings.rebuild_file.as_str();
        self.git(
            "rm",
            &["rm", "--cached", "--ignore-unmatch", rebuild_file],
            None,
        )?;

        let name = format!("user.name={}", self.settings.identity.name);
        let email = format!("user.email={}", self.settings.identity.email);
        self.git(
            "commit",
            &["-c", &name, "-c", &email, "commit", "-m", RESET_COMMIT_MESSAGE],
            None,
        )?;

        let remote = format!("https://{token}@github.com/{repository}.git");
        let refspec = format!("HEAD:{}", self.settings.branch);
        self.git("push", &["push", "--quiet", &remote, &refspec], Some(token))?;

        info!(
            "Reset rebuild file and pushed to {repository} ({})",
            self.settings.branch
        );
        self.forced.clear();
        Ok(FinalizeOutcome::Reset)
    }
}

/// First line of the override file, trimmed; `None` when the file is
/// missing or the line is blank.
fn read_forced_version(path: &Utf8Path) -> io::Result<Option<String>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let first = contents.lines().next().unwrap_or_default().trim();
    Ok((!first.is_empty()).then(|| first.to_owned()))
}

#[cfg(test)]
#[path = "rebuild_tests.rs"]
mod tests;
