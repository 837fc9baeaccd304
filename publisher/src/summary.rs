//! Per-version outcomes and the run summary.

use crate::rebuild::FinalizeOutcome;
use std::fmt;

/// Terminal state of one catalog entry within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionOutcome {
    /// Already published and not forced.
    Skipped,
    /// No verified archive could be obtained.
    DownloadFailed,
    /// Extraction, build or push failed.
    BuildFailed,
    /// Built and pushed under its own tag.
    Published,
    /// Built and pushed under its own tag and as `latest`.
    PublishedAsLatest,
}

impl VersionOutcome {
    /// Whether an image was pushed for this version.
    #[must_use]
    pub fn is_published(self) -> bool {
        matches!(self, Self::Published | Self::PublishedAsLatest)
    }

    /// Whether processing this version failed.
    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::DownloadFailed | Self::BuildFailed)
    }
}

impl fmt::Display for VersionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Skipped => "skipped",
            Self::DownloadFailed => "download failed",
            Self::BuildFailed => "build failed",
            Self::Published => "published",
            Self::PublishedAsLatest => "published as latest",
        };
        f.write_str(label)
    }
}

/// Result of one run, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    outcomes: Vec<(String, VersionOutcome)>,
    finalize: Option<FinalizeOutcome>,
}

impl RunSummary {
    /// Create a summary from per-version outcomes and the finalize result.
    /// `finalize` is `None` when resetting the override failed.
    #[must_use]
    pub fn new(outcomes: Vec<(String, VersionOutcome)>, finalize: Option<FinalizeOutcome>) -> Self {
        Self { outcomes, finalize }
    }

    /// Outcomes in catalog order.
    #[must_use]
    pub fn outcomes(&self) -> &[(String, VersionOutcome)] {
        &self.outcomes
    }

    /// Outcome recorded for `version`.
    #[must_use]
    pub fn outcome_of(&self, version: &str) -> Option<VersionOutcome> {
        self.outcomes
            .iter()
            .find(|(v, _)| v == version)
            .map(|(_, outcome)| *outcome)
    }

    /// What happened to the rebuild override.
    #[must_use]
    pub fn finalize(&self) -> Option<FinalizeOutcome> {
        self.finalize
    }

    fn count(&self, predicate: impl Fn(VersionOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(*o)).count()
    }

    /// One-line description suitable for the closing log entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use release_image_publisher::summary::{RunSummary, VersionOutcome};
    ///
    /// let summary = RunSummary::new(
    ///     vec![
    ///         ("6.3.1".to_owned(), VersionOutcome::PublishedAsLatest),
    ///         ("6.3.0".to_owned(), VersionOutcome::Skipped),
    ///     ],
    ///     None,
    /// );
    /// assert_eq!(
    ///     summary.summary_line(),
    ///     "2 version(s): 1 published, 1 skipped, 0 failed"
    /// );
    /// ```
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "{} version(s): {} published, {} skipped, {} failed",
            self.outcomes.len(),
            self.count(VersionOutcome::is_published),
            self.count(|o| o == VersionOutcome::Skipped),
            self.count(VersionOutcome::is_failure),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_lookup_by_version() {
        let summary = RunSummary::new(
            vec![
                ("6.3.1".to_owned(), VersionOutcome::Published),
                ("6.3.0".to_owned(), VersionOutcome::DownloadFailed),
            ],
            Some(FinalizeOutcome::NothingToReset),
        );
        assert_eq!(summary.outcome_of("6.3.0"), Some(VersionOutcome::DownloadFailed));
        assert_eq!(summary.outcome_of("5.0.0"), None);
    }

    #[test]
    fn summary_line_counts_failures() {
        let summary = RunSummary::new(
            vec![
                ("a".to_owned(), VersionOutcome::BuildFailed),
                ("b".to_owned(), VersionOutcome::DownloadFailed),
                ("c".to_owned(), VersionOutcome::Published),
            ],
            None,
        );
        assert_eq!(
            summary.summary_line(),
            "3 version(s): 1 published, 0 skipped, 2 failed"
        );
    }
}
