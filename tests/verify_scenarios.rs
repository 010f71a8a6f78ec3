//! Library-level verification scenarios against real scratch directories.

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use md_artifact_verifier::core::paths::resolve_working_dir;
use md_artifact_verifier::prelude::*;

fn trajectory(dir: &Path) -> ArtifactVerifier {
    ArtifactVerifier::new(dir, Manifest::preset(Preset::Trajectory))
}

fn verify_all(verifier: &ArtifactVerifier) -> VerificationReport {
    let all: [&str; 0] = [];
    verifier.verify(&all).expect("verification report")
}

#[test]
fn all_outputs_present_passes_every_category() {
    let dir = tempfile::tempdir().unwrap();
    common::write_trajectory_outputs(dir.path());

    let report = verify_all(&trajectory(dir.path()));

    assert!(report.ready);
    assert_eq!(report.categories.len(), 3);
    assert!(report.categories.iter().all(|c| c.passed));
    assert_eq!(report.tally.present, 12);
    assert_eq!(report.tally.failing(), 0);
    assert!(report.hints.is_empty());
    assert!(report.verdict_line().contains("proceed with generate_clean_plots"));
}

#[test]
fn misspelled_dccm_output_fails_with_rename_hint() {
    let dir = tempfile::tempdir().unwrap();
    common::write_trajectory_outputs(dir.path());
    fs::rename(
        dir.path().join("hedragenin_covar.xpm"),
        dir.path().join("hedrageinin_covar.xpm"),
    )
    .unwrap();

    let report = verify_all(&trajectory(dir.path()));

    assert!(!report.ready);
    assert_eq!(report.failed_categories(), vec!["DCCM"]);
    let dccm = report.category("DCCM").unwrap();
    let hedragenin = dccm
        .results
        .iter()
        .find(|r| r.subject == "hedragenin")
        .unwrap();
    assert_eq!(hedragenin.status, CheckStatus::Missing);

    assert_eq!(report.hints.len(), 1);
    let hint = &report.hints[0];
    assert_eq!(hint.action, RemediationAction::Rename);
    assert_eq!(hint.source, PathBuf::from("hedrageinin_covar.xpm"));
    assert_eq!(hint.destination, PathBuf::from("hedragenin_covar.xpm"));
    assert_eq!(hint.category.as_deref(), Some("DCCM"));
}

#[test]
fn alternate_projection_name_suggests_copy() {
    let dir = tempfile::tempdir().unwrap();
    common::write_trajectory_outputs(dir.path());
    fs::rename(
        dir.path().join("maslinic_acid_proj_pc1_pc2.xvg"),
        dir.path().join("maslinic_acid_2d_projection.xvg"),
    )
    .unwrap();

    let report = verify_all(&trajectory(dir.path()));

    assert_eq!(report.failed_categories(), vec!["PCA"]);
    assert_eq!(report.hints.len(), 1);
    assert_eq!(report.hints[0].action, RemediationAction::Copy);
    assert_eq!(
        report.hints[0].command,
        "cp 'maslinic_acid_2d_projection.xvg' 'maslinic_acid_proj_pc1_pc2.xvg'"
    );
    // Suggestions only: nothing on disk changes.
    assert!(!dir.path().join("maslinic_acid_proj_pc1_pc2.xvg").exists());
}

#[test]
fn zero_byte_pca_output_is_empty_not_present() {
    let dir = tempfile::tempdir().unwrap();
    common::write_trajectory_outputs(dir.path());
    fs::write(dir.path().join("lupeol_proj_pc1_pc2.xvg"), b"").unwrap();

    let report = verify_all(&trajectory(dir.path()));

    let pca = report.category("PCA").unwrap();
    assert!(!pca.passed);
    assert_eq!(pca.tally.empty, 1);
    assert_eq!(pca.tally.present, 3);
    let lupeol = pca.results.iter().find(|r| r.subject == "lupeol").unwrap();
    assert_eq!(lupeol.status, CheckStatus::Empty);
    assert!(report.category("FEL").unwrap().passed);
    assert!(report.category("DCCM").unwrap().passed);
}

#[test]
fn directory_and_dangling_symlink_are_missing() {
    let dir = tempfile::tempdir().unwrap();
    common::write_trajectory_outputs(dir.path());
    fs::remove_file(dir.path().join("control_prob.xpm")).unwrap();
    fs::create_dir(dir.path().join("control_prob.xpm")).unwrap();

    #[cfg(unix)]
    {
        fs::remove_file(dir.path().join("lupeol_prob.xpm")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("does-not-exist.xpm"),
            dir.path().join("lupeol_prob.xpm"),
        )
        .unwrap();
    }

    let report = verify_all(&trajectory(dir.path()));
    let fel = report.category("FEL").unwrap();
    let control = fel.results.iter().find(|r| r.subject == "control").unwrap();
    assert_eq!(control.status, CheckStatus::Missing);
    assert_eq!(control.detail.as_deref(), Some("not a regular file"));

    #[cfg(unix)]
    {
        let lupeol = fel.results.iter().find(|r| r.subject == "lupeol").unwrap();
        assert_eq!(lupeol.status, CheckStatus::Missing);
    }
}

#[test]
fn file_in_place_of_parent_directory_is_missing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("runs"), b"not a directory").unwrap();
    let manifest = Manifest::from_toml_str(
        r#"
name = "nested"
next_step = "generate_clean_plots"

[[categories]]
name = "FEL"

[[categories.artifacts]]
subject = "control"
file = "runs/control_prob.xpm"
"#,
    )
    .unwrap();

    let verifier = ArtifactVerifier::new(dir.path(), manifest);
    let result = verifier.check_named("FEL").unwrap();
    assert_eq!(result.results[0].status, CheckStatus::Missing);
}

#[cfg(unix)]
#[test]
fn unreadable_directory_reports_access_denied_and_continues() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("control_covar.xpm"), b"data").unwrap();
    fs::write(dir.path().join("lupeol_covar.xpm"), b"data").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits are not enforced for privileged users.
    if fs::metadata(locked.join("control_covar.xpm")).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        eprintln!("skipping: permissions not enforced for this user");
        return;
    }

    let manifest = Manifest::from_toml_str(
        r#"
name = "restricted"
next_step = "generate_clean_plots"

[[categories]]
name = "DCCM"

[[categories.artifacts]]
subject = "control"
file = "locked/control_covar.xpm"

[[categories.artifacts]]
subject = "lupeol"
file = "lupeol_covar.xpm"
"#,
    )
    .unwrap();
    let verifier = ArtifactVerifier::new(dir.path(), manifest);
    let report = verify_all(&verifier);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let dccm = report.category("DCCM").unwrap();
    assert!(!dccm.passed);
    assert!(matches!(
        dccm.results[0].status,
        CheckStatus::AccessDenied { .. }
    ));
    assert_eq!(dccm.results[1].status, CheckStatus::Present { bytes: 4 });
    assert_eq!(report.tally.access_denied, 1);
}

#[test]
fn absent_working_directory_reports_every_artifact_missing() {
    let dir = tempfile::tempdir().unwrap();
    let absent = resolve_working_dir(&dir.path().join("absent")).unwrap();

    let report = verify_all(&trajectory(&absent));

    assert!(!report.ready);
    assert_eq!(report.categories.len(), 3);
    assert_eq!(report.tally.missing, 12);
    assert!(report.hints.is_empty());
    assert!(!absent.exists());
}

#[test]
fn file_as_working_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    fs::write(&file, b"x").unwrap();
    assert_eq!(resolve_working_dir(&file).unwrap_err().code(), "MDAV-2001");
}

#[test]
fn orbital_preset_detects_space_separated_render() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("lupeol HOMO_Orbital.png"), b"\x89PNG").unwrap();

    let verifier = ArtifactVerifier::new(dir.path(), Manifest::preset(Preset::Orbitals));
    let report = verifier.verify(&["HOMO"]).unwrap();

    assert!(!report.ready);
    assert_eq!(report.categories.len(), 1);
    assert_eq!(report.hints.len(), 1);
    assert_eq!(
        report.hints[0].command,
        "mv 'lupeol HOMO_Orbital.png' 'lupeol_HOMO_Orbital.png'"
    );
}
