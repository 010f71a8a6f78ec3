//! Per-artifact classification and per-category aggregation.

#![allow(missing_docs)]

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::manifest::{ArtifactSpec, CategorySpec};
use crate::verifier::probe::{FileState, FsProbe};

/// Outcome of checking one (category, subject) artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Present { bytes: u64 },
    Empty,
    Missing,
    AccessDenied { reason: String },
}

impl CheckStatus {
    #[must_use]
    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Stable upper-case tag used in reports and logs.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Present { .. } => "PRESENT",
            Self::Empty => "EMPTY",
            Self::Missing => "MISSING",
            Self::AccessDenied { .. } => "ACCESS_DENIED",
        }
    }

    #[must_use]
    pub const fn glyph(&self) -> &'static str {
        match self {
            Self::Present { .. } => "✓",
            Self::Empty => "∅",
            Self::Missing => "✗",
            Self::AccessDenied { .. } => "!",
        }
    }

    #[must_use]
    pub const fn bytes(&self) -> Option<u64> {
        match self {
            Self::Present { bytes } => Some(*bytes),
            _ => None,
        }
    }

    /// Map a probe answer onto the reporting taxonomy.
    #[must_use]
    pub fn from_state(state: FileState) -> (Self, Option<String>) {
        match state {
            FileState::File { len: 0 } => (Self::Empty, Some("file is zero bytes".to_string())),
            FileState::File { len } => (Self::Present { bytes: len }, None),
            FileState::NotFound => (Self::Missing, None),
            FileState::NotAFile => (Self::Missing, Some("not a regular file".to_string())),
            FileState::Unreadable(reason) => (Self::AccessDenied { reason }, None),
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Result for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub subject: String,
    pub file: PathBuf,
    #[serde(flatten)]
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Count of results per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub present: usize,
    pub empty: usize,
    pub missing: usize,
    pub access_denied: usize,
}

impl Tally {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.present + self.empty + self.missing + self.access_denied
    }

    #[must_use]
    pub const fn failing(&self) -> usize {
        self.empty + self.missing + self.access_denied
    }

    fn record(&mut self, status: &CheckStatus) {
        match status {
            CheckStatus::Present { .. } => self.present += 1,
            CheckStatus::Empty => self.empty += 1,
            CheckStatus::Missing => self.missing += 1,
            CheckStatus::AccessDenied { .. } => self.access_denied += 1,
        }
    }

    fn absorb(&mut self, other: Self) {
        self.present += other.present;
        self.empty += other.empty;
        self.missing += other.missing;
        self.access_denied += other.access_denied;
    }
}

/// Aggregate for one category. `passed` iff every result is PRESENT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryResult {
    pub name: String,
    pub passed: bool,
    pub tally: Tally,
    pub results: Vec<CheckResult>,
}

impl CategoryResult {
    /// Build from per-artifact results; `passed` and `tally` are derived.
    #[must_use]
    pub fn from_results(name: impl Into<String>, results: Vec<CheckResult>) -> Self {
        let mut tally = Tally::default();
        for result in &results {
            tally.record(&result.status);
        }
        Self {
            name: name.into(),
            passed: tally.failing() == 0,
            tally,
            results,
        }
    }

    /// One-line summary, e.g. `DCCM: FAIL (3/4 present, 1 missing)`.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let verdict = if self.passed { "PASS" } else { "FAIL" };
        let mut problems = Vec::new();
        if self.tally.empty > 0 {
            problems.push(format!("{} empty", self.tally.empty));
        }
        if self.tally.missing > 0 {
            problems.push(format!("{} missing", self.tally.missing));
        }
        if self.tally.access_denied > 0 {
            problems.push(format!("{} access denied", self.tally.access_denied));
        }
        let counts = format!("{}/{} present", self.tally.present, self.tally.total());
        if problems.is_empty() {
            format!("{}: {verdict} ({counts})", self.name)
        } else {
            format!("{}: {verdict} ({counts}, {})", self.name, problems.join(", "))
        }
    }
}

/// Sum tallies across categories.
#[must_use]
pub fn combined_tally(categories: &[CategoryResult]) -> Tally {
    let mut tally = Tally::default();
    for category in categories {
        tally.absorb(category.tally);
    }
    tally
}

/// Check one artifact relative to `root`.
pub fn check_artifact(probe: &dyn FsProbe, root: &Path, artifact: &ArtifactSpec) -> CheckResult {
    let (status, detail) = CheckStatus::from_state(probe.stat(&root.join(&artifact.file)));
    CheckResult {
        subject: artifact.subject.clone(),
        file: artifact.file.clone(),
        status,
        detail,
    }
}

/// Check every artifact of a category, in manifest order.
///
/// Every artifact is probed even after the first failure so the report is
/// complete.
pub fn check_category(probe: &dyn FsProbe, root: &Path, category: &CategorySpec) -> CategoryResult {
    let results = category
        .artifacts
        .iter()
        .map(|artifact| check_artifact(probe, root, artifact))
        .collect();
    CategoryResult::from_results(category.name.clone(), results)
}
