//! Built-in manifests for the paper's analysis pipeline.

#![allow(missing_docs)]

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ArtifactSpec, CategorySpec, Manifest, MismatchRule, RemediationAction};
use crate::core::errors::MdavError;

/// Simulated systems shared by every category: the control complex and the
/// three candidate analogue complexes.
pub const SUBJECTS: [&str; 4] = ["control", "hedragenin", "lupeol", "maslinic_acid"];

/// Known misspellings of the hedragenin subject seen in exported filenames.
const HEDRAGENIN_TYPOS: [&str; 2] = ["hedrageinin", "hedrageini"];

/// Selectable built-in manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// PCA projections, free-energy landscapes and DCCM covariance maps.
    #[default]
    Trajectory,
    /// DFT electrostatic-potential surfaces and frontier orbitals.
    Orbitals,
}

impl Preset {
    pub const ALL: [Self; 2] = [Self::Trajectory, Self::Orbitals];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Trajectory => "trajectory",
            Self::Orbitals => "orbitals",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Trajectory => "PCA projection, FEL probability and DCCM covariance outputs",
            Self::Orbitals => "ESP surface, HOMO and LUMO orbital renders",
        }
    }

    #[must_use]
    pub fn manifest(self) -> Manifest {
        match self {
            Self::Trajectory => trajectory(),
            Self::Orbitals => orbitals(),
        }
    }

    fn available() -> String {
        Self::ALL
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = MdavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| MdavError::UnknownPreset {
                name: s.to_string(),
                available: Self::available(),
            })
    }
}

fn category(name: &str, description: &str, file_for: impl Fn(&str) -> String) -> CategorySpec {
    CategorySpec {
        name: name.to_string(),
        description: Some(description.to_string()),
        artifacts: SUBJECTS
            .iter()
            .map(|subject| ArtifactSpec {
                subject: (*subject).to_string(),
                file: PathBuf::from(file_for(subject)),
            })
            .collect(),
    }
}

fn rule(expected: String, alternate: String, action: RemediationAction, note: &str) -> MismatchRule {
    MismatchRule {
        expected: PathBuf::from(expected),
        alternate: PathBuf::from(alternate),
        action,
        note: Some(note.to_string()),
    }
}

fn trajectory() -> Manifest {
    let categories = vec![
        category("PCA", "2D projection onto PC1/PC2", |s| {
            format!("{s}_proj_pc1_pc2.xvg")
        }),
        category("FEL", "free-energy landscape probability matrix", |s| {
            format!("{s}_prob.xpm")
        }),
        category("DCCM", "dynamic cross-correlation covariance matrix", |s| {
            format!("{s}_covar.xpm")
        }),
    ];

    let mut mismatches: Vec<MismatchRule> = SUBJECTS
        .iter()
        .map(|s| {
            rule(
                format!("{s}_proj_pc1_pc2.xvg"),
                format!("{s}_2d_projection.xvg"),
                RemediationAction::Copy,
                "projection exported under the combined-PCA script's name",
            )
        })
        .collect();
    for suffix in ["prob.xpm", "covar.xpm"] {
        mismatches.push(rule(
            format!("hedragenin_{suffix}"),
            format!("{}_{suffix}", HEDRAGENIN_TYPOS[0]),
            RemediationAction::Rename,
            "misspelled subject name",
        ));
    }

    Manifest {
        name: Preset::Trajectory.name().to_string(),
        next_step: "generate_clean_plots".to_string(),
        categories,
        mismatches,
    }
}

fn orbitals() -> Manifest {
    const KINDS: [(&str, &str, &str); 3] = [
        ("ESP", "ESP_Surface.png", "electrostatic potential surface"),
        ("HOMO", "HOMO_Orbital.png", "highest occupied molecular orbital"),
        ("LUMO", "LUMO_Orbital.png", "lowest unoccupied molecular orbital"),
    ];

    let categories = KINDS
        .iter()
        .map(|(name, suffix, description)| category(name, description, |s| format!("{s}_{suffix}")))
        .collect();

    let mut mismatches = Vec::new();
    for (_, suffix, _) in KINDS {
        for subject in SUBJECTS {
            let expected = format!("{subject}_{suffix}");
            mismatches.push(rule(
                expected.clone(),
                format!("{subject}{suffix}"),
                RemediationAction::Rename,
                "missing separator",
            ));
            mismatches.push(rule(
                expected,
                format!("{subject} {suffix}"),
                RemediationAction::Rename,
                "space instead of underscore",
            ));
        }
        for typo in HEDRAGENIN_TYPOS {
            for found in [
                format!("{typo}_{suffix}"),
                format!("{typo}{suffix}"),
                format!("{typo} {suffix}"),
            ] {
                mismatches.push(rule(
                    format!("hedragenin_{suffix}"),
                    found,
                    RemediationAction::Rename,
                    "misspelled subject name",
                ));
            }
        }
    }

    Manifest {
        name: Preset::Orbitals.name().to_string(),
        next_step: "create_figure_layout".to_string(),
        categories,
        mismatches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn trajectory_declares_twelve_artifacts_in_three_categories() {
        let manifest = Preset::Trajectory.manifest();
        assert_eq!(manifest.categories.len(), 3);
        assert_eq!(manifest.artifact_count(), 12);
        let names: Vec<&str> = manifest.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["PCA", "FEL", "DCCM"]);
    }

    #[test]
    fn trajectory_mismatch_targets_are_declared_artifacts() {
        let manifest = Preset::Trajectory.manifest();
        for rule in &manifest.mismatches {
            assert!(
                manifest.owner_of(&rule.expected).is_some(),
                "{} is not a declared artifact",
                rule.expected.display()
            );
        }
    }

    #[test]
    fn orbitals_covers_each_subject_per_kind() {
        let manifest = Preset::Orbitals.manifest();
        assert_eq!(manifest.artifact_count(), 12);
        let esp = manifest.category("esp").expect("ESP category");
        assert_eq!(
            esp.artifacts[1].file,
            PathBuf::from("hedragenin_ESP_Surface.png")
        );
    }

    #[test]
    fn orbitals_typo_rules_cover_every_separator() {
        let manifest = Preset::Orbitals.manifest();
        let expected = PathBuf::from("hedragenin_HOMO_Orbital.png");
        let alternates: Vec<&Path> = manifest
            .mismatches
            .iter()
            .filter(|r| r.expected == expected)
            .map(|r| r.alternate.as_path())
            .collect();
        for typo in HEDRAGENIN_TYPOS {
            for name in [
                format!("{typo}_HOMO_Orbital.png"),
                format!("{typo}HOMO_Orbital.png"),
                format!("{typo} HOMO_Orbital.png"),
            ] {
                assert!(alternates.contains(&Path::new(&name)), "no rule for {name}");
            }
        }
    }

    #[test]
    fn preset_parses_case_insensitively() {
        assert_eq!("Orbitals".parse::<Preset>().unwrap(), Preset::Orbitals);
        assert_eq!(" trajectory ".parse::<Preset>().unwrap(), Preset::Trajectory);
        let err = "docking".parse::<Preset>().unwrap_err();
        assert!(err.to_string().contains("trajectory, orbitals"), "{err}");
    }
}
