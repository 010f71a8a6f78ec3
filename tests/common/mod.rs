use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

impl CmdResult {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

const ENV_OVERRIDES: [&str; 7] = [
    "MDAV_WORKING_DIR",
    "MDAV_PRESET",
    "MDAV_MANIFEST",
    "MDAV_LOG_ENABLED",
    "MDAV_LOG_PATH",
    "MDAV_LOG_MAX_SIZE_BYTES",
    "MDAV_OUTPUT_FORMAT",
];

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_mdav") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "mdav.exe" } else { "mdav" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve mdav binary path for integration test"),
    }
}

/// Run mdav with JSON output (stdout is a pipe) and an isolated `HOME`.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with_env(case_name, args, &[])
}

/// Like [`run_cli_case`] with extra environment variables.
pub fn run_cli_case_with_env(case_name: &str, args: &[&str], envs: &[(&str, &str)]) -> CmdResult {
    let root = std::env::temp_dir().join("mdav-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let stem = format!("{}-{}", sanitize(case_name), now_millis());
    let log_path = root.join(format!("{stem}.log"));
    let home = root.join(format!("{stem}-home"));
    fs::create_dir_all(&home).expect("create isolated home");
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("HOME", &home)
        .env("RUST_BACKTRACE", "1");
    for key in ENV_OVERRIDES {
        command.env_remove(key);
    }
    for (key, value) in envs {
        command.env(key, value);
    }
    let output = command.output().expect("execute mdav command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("envs={envs:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Populate `dir` with every trajectory artifact, each holding some data.
pub fn write_trajectory_outputs(dir: &Path) {
    for subject in ["control", "hedragenin", "lupeol", "maslinic_acid"] {
        for name in [
            format!("{subject}_proj_pc1_pc2.xvg"),
            format!("{subject}_prob.xpm"),
            format!("{subject}_covar.xpm"),
        ] {
            fs::write(dir.join(name), b"# gromacs output\n0.0 1.0\n").expect("write artifact");
        }
    }
}

pub fn parse_json(stdout: &str) -> serde_json::Value {
    let line = stdout
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_else(|| panic!("no JSON on stdout: {stdout:?}"));
    serde_json::from_str(line).unwrap_or_else(|e| panic!("invalid JSON {line:?}: {e}"))
}
