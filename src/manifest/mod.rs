//! Artifact manifest: category → subject → expected-filename records plus the
//! declarative list of known filename mismatches.
//!
//! A manifest is either one of the built-in [`Preset`]s or a TOML file:
//!
//! ```toml
//! name = "trajectory"
//! next_step = "generate_clean_plots"
//!
//! [[categories]]
//! name = "PCA"
//!
//! [[categories.artifacts]]
//! subject = "control"
//! file = "control_proj_pc1_pc2.xvg"
//!
//! [[mismatches]]
//! expected = "hedragenin_covar.xpm"
//! alternate = "hedrageinin_covar.xpm"
//! action = "rename"
//! ```

#![allow(missing_docs)]

pub mod presets;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::errors::{MdavError, Result};

pub use presets::Preset;

/// Corrective filesystem operation suggested by a mismatch rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationAction {
    Rename,
    Copy,
}

impl RemediationAction {
    /// Shell verb used when rendering the suggestion.
    #[must_use]
    pub const fn shell_verb(self) -> &'static str {
        match self {
            Self::Rename => "mv",
            Self::Copy => "cp",
        }
    }
}

impl fmt::Display for RemediationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename => f.write_str("rename"),
            Self::Copy => f.write_str("copy"),
        }
    }
}

/// One expected artifact: the file a subject must provide for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactSpec {
    pub subject: String,
    pub file: PathBuf,
}

/// A named analysis category and its artifacts, in report order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub artifacts: Vec<ArtifactSpec>,
}

impl CategorySpec {
    /// Whether `name` refers to this category (case-insensitive).
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Known naming mismatch: when `expected` is missing and `alternate` is
/// present, suggest `action` from `alternate` to `expected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MismatchRule {
    pub expected: PathBuf,
    pub alternate: PathBuf,
    pub action: RemediationAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Full verification manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub name: String,
    /// Pipeline step gated by this manifest, named in the final verdict.
    pub next_step: String,
    pub categories: Vec<CategorySpec>,
    #[serde(default)]
    pub mismatches: Vec<MismatchRule>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

impl Manifest {
    /// Build one of the built-in manifests.
    #[must_use]
    pub fn preset(preset: Preset) -> Self {
        preset.manifest()
    }

    /// Load and validate a manifest from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(MdavError::MissingManifest {
                    path: path.to_path_buf(),
                });
            }
            Err(err) => return Err(MdavError::io(path, err)),
        };
        Self::from_toml_str(&raw)
    }

    /// Parse and validate a manifest from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(raw).map_err(|err| MdavError::InvalidManifest {
            details: err.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Render as TOML in the same shape [`Manifest::from_toml_str`] accepts.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// SHA-256 of the canonical JSON encoding, hex-encoded.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&canonical);
        Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Total number of (category, subject) pairs.
    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.categories.iter().map(|c| c.artifacts.len()).sum()
    }

    /// Comma-separated category names, for diagnostics.
    #[must_use]
    pub fn category_names(&self) -> String {
        self.categories
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Look up a category by name (case-insensitive).
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&CategorySpec> {
        self.categories.iter().find(|c| c.matches_name(name))
    }

    /// Resolve requested category names, preserving manifest order.
    ///
    /// An empty request selects every category.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&CategorySpec>> {
        if names.is_empty() {
            return Ok(self.categories.iter().collect());
        }
        for name in names {
            if self.category(name.as_ref()).is_none() {
                return Err(MdavError::UnknownCategory {
                    name: name.as_ref().to_string(),
                    available: self.category_names(),
                });
            }
        }
        Ok(self
            .categories
            .iter()
            .filter(|c| names.iter().any(|n| c.matches_name(n.as_ref())))
            .collect())
    }

    /// Find the (category, subject) that declares `file`, if any.
    #[must_use]
    pub fn owner_of(&self, file: &Path) -> Option<(&str, &str)> {
        self.categories.iter().find_map(|category| {
            category
                .artifacts
                .iter()
                .find(|a| a.file == file)
                .map(|a| (category.name.as_str(), a.subject.as_str()))
        })
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(invalid("manifest name must not be empty"));
        }
        if self.next_step.trim().is_empty() {
            return Err(invalid("next_step must not be empty"));
        }
        if self.categories.is_empty() {
            return Err(invalid("manifest must declare at least one category"));
        }

        let mut seen_categories = HashSet::new();
        for category in &self.categories {
            let name = category.name.trim();
            if name.is_empty() {
                return Err(invalid("category name must not be empty"));
            }
            if name != category.name {
                return Err(invalid(format!(
                    "category name {:?} has surrounding whitespace",
                    category.name
                )));
            }
            if !seen_categories.insert(name.to_ascii_lowercase()) {
                return Err(invalid(format!("duplicate category {name:?}")));
            }
            if category.artifacts.is_empty() {
                return Err(invalid(format!("category {name} declares no artifacts")));
            }

            let mut seen_subjects = HashSet::new();
            for artifact in &category.artifacts {
                let subject = artifact.subject.trim();
                if subject.is_empty() {
                    return Err(invalid(format!("category {name} has an empty subject")));
                }
                if subject != artifact.subject {
                    return Err(invalid(format!(
                        "category {name}: subject {:?} has surrounding whitespace",
                        artifact.subject
                    )));
                }
                if !seen_subjects.insert(subject) {
                    return Err(invalid(format!(
                        "category {name} maps subject {subject:?} more than once"
                    )));
                }
                validate_relative(&artifact.file)
                    .map_err(|why| invalid(format!("{name}/{subject}: {why}")))?;
            }
        }

        for (index, rule) in self.mismatches.iter().enumerate() {
            validate_relative(&rule.expected)
                .map_err(|why| invalid(format!("mismatches[{index}].expected: {why}")))?;
            validate_relative(&rule.alternate)
                .map_err(|why| invalid(format!("mismatches[{index}].alternate: {why}")))?;
            if rule.expected == rule.alternate {
                return Err(invalid(format!(
                    "mismatches[{index}]: expected and alternate are the same file"
                )));
            }
        }

        Ok(())
    }
}

fn invalid(details: impl Into<String>) -> MdavError {
    MdavError::InvalidManifest {
        details: details.into(),
    }
}

/// Artifact filenames must stay inside the working directory.
fn validate_relative(path: &Path) -> std::result::Result<(), String> {
    if path.as_os_str().is_empty() {
        return Err("filename must not be empty".to_string());
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!("{} escapes the working directory", path.display()));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(format!("{} must be a relative path", path.display()));
            }
        }
    }
    Ok(())
}
