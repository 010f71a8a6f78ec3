//! Known filename mismatch detection.
//!
//! Rules are an explicit list of `(expected, alternate, action)` triples; there
//! is no fuzzy matching. A rule fires when the expected file is absent and the
//! alternate is present with data. When several rules target the same expected
//! file only the first one that fires is reported.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::manifest::{Manifest, MismatchRule, RemediationAction};
use crate::verifier::probe::{FileState, FsProbe};

/// Suggested, never executed, fix for a naming mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemediationHint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub action: RemediationAction,
    pub source: PathBuf,
    pub destination: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Shell command performing the fix, relative to the working directory.
    pub command: String,
}

impl RemediationHint {
    fn from_rule(rule: &MismatchRule, manifest: &Manifest) -> Self {
        let owner = manifest.owner_of(&rule.expected);
        Self {
            category: owner.map(|(category, _)| category.to_string()),
            subject: owner.map(|(_, subject)| subject.to_string()),
            action: rule.action,
            source: rule.alternate.clone(),
            destination: rule.expected.clone(),
            note: rule.note.clone(),
            command: shell_command(rule.action, &rule.alternate, &rule.expected),
        }
    }
}

/// Evaluate every mismatch rule against the filesystem under `root`.
pub fn detect_known_mismatches(
    probe: &dyn FsProbe,
    root: &Path,
    manifest: &Manifest,
) -> Vec<RemediationHint> {
    let mut resolved: HashSet<&Path> = HashSet::new();
    let mut hints = Vec::new();

    for rule in &manifest.mismatches {
        if resolved.contains(rule.expected.as_path()) {
            continue;
        }
        if rule_fires(probe, root, rule) {
            resolved.insert(rule.expected.as_path());
            hints.push(RemediationHint::from_rule(rule, manifest));
        }
    }

    hints
}

fn rule_fires(probe: &dyn FsProbe, root: &Path, rule: &MismatchRule) -> bool {
    if probe.stat(&root.join(&rule.expected)) != FileState::NotFound {
        return false;
    }
    matches!(
        probe.stat(&root.join(&rule.alternate)),
        FileState::File { len } if len > 0
    )
}

fn shell_command(action: RemediationAction, source: &Path, destination: &Path) -> String {
    format!(
        "{} {} {}",
        action.shell_verb(),
        shell_quote(&source.to_string_lossy()),
        shell_quote(&destination.to_string_lossy())
    )
}

fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}
