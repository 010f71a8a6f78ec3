//! Verification report: the point-in-time snapshot produced by one run.

#![allow(missing_docs)]

use std::path::PathBuf;

use serde::Serialize;

use crate::verifier::check::{CategoryResult, Tally, combined_tally};
use crate::verifier::mismatch::RemediationHint;

/// Everything a run found. Rebuilt from scratch on every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub manifest: String,
    pub fingerprint: String,
    pub working_dir: PathBuf,
    /// RFC 3339 UTC timestamp of the run.
    pub generated_at: String,
    pub next_step: String,
    pub categories: Vec<CategoryResult>,
    pub hints: Vec<RemediationHint>,
    pub tally: Tally,
    /// True iff every checked category passed.
    pub ready: bool,
}

impl VerificationReport {
    #[must_use]
    pub fn new(
        manifest: impl Into<String>,
        fingerprint: impl Into<String>,
        working_dir: PathBuf,
        next_step: impl Into<String>,
        categories: Vec<CategoryResult>,
        hints: Vec<RemediationHint>,
    ) -> Self {
        let tally = combined_tally(&categories);
        let ready = categories.iter().all(|c| c.passed);
        Self {
            manifest: manifest.into(),
            fingerprint: fingerprint.into(),
            working_dir,
            generated_at: chrono::Utc::now()
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            next_step: next_step.into(),
            categories,
            hints,
            tally,
            ready,
        }
    }

    /// Names of categories that did not pass, in report order.
    #[must_use]
    pub fn failed_categories(&self) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect()
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<&CategoryResult> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Go/no-go line naming the gated step.
    #[must_use]
    pub fn verdict_line(&self) -> String {
        if self.ready {
            format!(
                "READY: all {} categories passed; proceed with {}",
                self.categories.len(),
                self.next_step
            )
        } else {
            let failed = self.failed_categories();
            format!(
                "NOT READY: {} of {} categories failed ({}); fix before running {}",
                failed.len(),
                self.categories.len(),
                failed.join(", "),
                self.next_step
            )
        }
    }
}
