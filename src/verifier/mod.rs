//! Artifact verifier: checks that every file a downstream analysis step needs
//! exists and is non-empty, and points out known filename mismatches.
//!
//! The verifier is read-only. It never creates, moves or deletes files;
//! remediation is only ever suggested.

pub mod check;
pub mod mismatch;
pub mod probe;
pub mod report;

use std::path::{Path, PathBuf};

use crate::core::errors::Result;
use crate::manifest::{CategorySpec, Manifest};

use self::check::CategoryResult;
use self::mismatch::RemediationHint;
use self::probe::{FsProbe, LocalFs};
use self::report::VerificationReport;

/// Verifier bound to one manifest and one working directory.
pub struct ArtifactVerifier<P: FsProbe = LocalFs> {
    probe: P,
    root: PathBuf,
    manifest: Manifest,
}

impl ArtifactVerifier<LocalFs> {
    /// Verifier over the local filesystem rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, manifest: Manifest) -> Self {
        Self::with_probe(LocalFs, root, manifest)
    }
}

impl<P: FsProbe> ArtifactVerifier<P> {
    /// Verifier using a custom probe (remote filesystems, tests).
    #[must_use]
    pub fn with_probe(probe: P, root: impl Into<PathBuf>, manifest: Manifest) -> Self {
        Self {
            probe,
            root: root.into(),
            manifest,
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Check one category's artifacts.
    pub fn check_category(&self, category: &CategorySpec) -> CategoryResult {
        check::check_category(&self.probe, &self.root, category)
    }

    /// Check a category by name (case-insensitive).
    pub fn check_named(&self, name: &str) -> Result<CategoryResult> {
        let selected = self.manifest.select(&[name])?;
        Ok(self.check_category(selected[0]))
    }

    /// Evaluate every configured mismatch rule.
    pub fn detect_known_mismatches(&self) -> Vec<RemediationHint> {
        mismatch::detect_known_mismatches(&self.probe, &self.root, &self.manifest)
    }

    /// Full run over the selected categories (all when `selection` is empty).
    ///
    /// Mismatch detection always covers the whole manifest; hints are
    /// independent of which categories were selected.
    pub fn verify<S: AsRef<str>>(&self, selection: &[S]) -> Result<VerificationReport> {
        let categories = self
            .manifest
            .select(selection)?
            .into_iter()
            .map(|category| self.check_category(category))
            .collect();
        let hints = self.detect_known_mismatches();

        Ok(VerificationReport::new(
            self.manifest.name.clone(),
            self.manifest.fingerprint()?,
            self.root.clone(),
            self.manifest.next_step.clone(),
            categories,
            hints,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Preset;
    use crate::verifier::check::CheckStatus;
    use crate::verifier::probe::fake::FakeFs;

    const ROOT: &str = "/runs/md";

    fn all_trajectory_files() -> FakeFs {
        let manifest = Preset::Trajectory.manifest();
        manifest
            .categories
            .iter()
            .flat_map(|c| c.artifacts.iter())
            .fold(FakeFs::default(), |fs, a| {
                fs.file(Path::new(ROOT).join(&a.file), 1024)
            })
    }

    #[test]
    fn all_twelve_present_is_ready_without_hints() {
        let verifier =
            ArtifactVerifier::with_probe(all_trajectory_files(), ROOT, Preset::Trajectory.manifest());
        let none: [&str; 0] = [];
        let report = verifier.verify(&none).unwrap();

        assert!(report.ready);
        assert_eq!(report.categories.len(), 3);
        assert!(report.categories.iter().all(|c| c.passed));
        assert_eq!(report.tally.present, 12);
        assert!(report.hints.is_empty());
    }

    #[test]
    fn denied_subject_does_not_stop_other_checks() {
        let fs = all_trajectory_files().denied(Path::new(ROOT).join("control_covar.xpm"));
        let verifier = ArtifactVerifier::with_probe(fs, ROOT, Preset::Trajectory.manifest());
        let none: [&str; 0] = [];
        let report = verifier.verify(&none).unwrap();

        let dccm = report.category("DCCM").unwrap();
        assert!(!dccm.passed);
        assert!(matches!(
            dccm.results[0].status,
            CheckStatus::AccessDenied { .. }
        ));
        assert_eq!(dccm.tally.present, 3);
        assert!(report.category("PCA").unwrap().passed);
        assert!(report.category("FEL").unwrap().passed);
    }

    #[test]
    fn selection_limits_categories_not_hints() {
        let fs = FakeFs::default().file(Path::new(ROOT).join("hedrageinin_covar.xpm"), 10);
        let verifier = ArtifactVerifier::with_probe(fs, ROOT, Preset::Trajectory.manifest());
        let report = verifier.verify(&["PCA"]).unwrap();

        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.hints.len(), 1);
    }

    #[test]
    fn check_named_rejects_unknown_category() {
        let verifier =
            ArtifactVerifier::with_probe(FakeFs::default(), ROOT, Preset::Trajectory.manifest());
        assert!(verifier.check_named("fel").is_ok());
        assert_eq!(verifier.check_named("RMSF").unwrap_err().code(), "MDAV-1103");
    }
}
