//! Top-level CLI definition and dispatch.

use std::fmt::Write as _;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{ColoredString, Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use md_artifact_verifier::core::config::Config;
use md_artifact_verifier::core::errors::MdavError;
use md_artifact_verifier::core::paths::resolve_working_dir;
use md_artifact_verifier::logger::jsonl::{
    JsonlConfig, JsonlWriter, LogEntry, log_report, log_start,
};
use md_artifact_verifier::manifest::{Manifest, Preset};
use md_artifact_verifier::verifier::ArtifactVerifier;
use md_artifact_verifier::verifier::check::{CheckResult, CheckStatus};
use md_artifact_verifier::verifier::mismatch::RemediationHint;
use md_artifact_verifier::verifier::report::VerificationReport;

/// MD Artifact Verifier: confirms analysis outputs exist before plotting.
#[derive(Debug, Parser)]
#[command(
    name = "mdav",
    author,
    version,
    about = "MD Artifact Verifier - pre-flight check for trajectory-analysis outputs",
    long_about = None
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute; `verify` when omitted.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Check every expected artifact and print a readiness verdict.
    Verify(VerifyArgs),
    /// Only look for known filename mismatches and suggest fixes.
    Hints(TargetArgs),
    /// Inspect, validate or scaffold manifests.
    Manifest(ManifestArgs),
    /// View configuration state.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
    /// Show version and build metadata.
    Version,
}

#[derive(Debug, Clone, Args, Default)]
struct ManifestSourceArgs {
    /// Manifest file (TOML); overrides the preset.
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    manifest: Option<PathBuf>,
    /// Built-in manifest preset (trajectory, orbitals).
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,
}

#[derive(Debug, Clone, Args, Default)]
struct TargetArgs {
    /// Directory expected filenames are resolved against.
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,
    #[command(flatten)]
    source: ManifestSourceArgs,
}

#[derive(Debug, Clone, Args, Default)]
struct VerifyArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Only verify these categories (repeatable or comma-separated).
    #[arg(short = 'c', long = "category", value_name = "NAME", value_delimiter = ',')]
    categories: Vec<String>,
    /// Append a JSONL activity log of this run to PATH.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ManifestArgs {
    /// Manifest operation to run.
    #[command(subcommand)]
    command: ManifestCommand,
}

#[derive(Debug, Clone, Subcommand)]
enum ManifestCommand {
    /// Print the effective manifest as TOML.
    Show(ManifestSourceArgs),
    /// Validate a manifest file and exit.
    Validate(ValidateManifestArgs),
    /// Write a preset manifest to a new file for editing.
    Init(InitManifestArgs),
    /// List built-in presets.
    Presets,
}

#[derive(Debug, Clone, Args)]
struct ValidateManifestArgs {
    /// Manifest file to validate.
    #[arg(value_name = "PATH")]
    path: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct InitManifestArgs {
    /// Destination file.
    #[arg(value_name = "PATH")]
    path: PathBuf,
    /// Preset to start from.
    #[arg(long, value_name = "NAME")]
    preset: Option<String>,
    /// Overwrite an existing file.
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Verification ran and at least one category failed.
    #[error("{0}")]
    NotReady(String),
    /// Invalid user input (manifest, category, preset, flags).
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or serialization failure.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotReady(_) => 1,
            Self::User(_) => 2,
            Self::Runtime(_) | Self::Io(_) => 3,
            Self::Internal(_) | Self::Json(_) => 4,
        }
    }
}

impl From<MdavError> for CliError {
    fn from(value: MdavError) -> Self {
        if value.is_user_error() {
            Self::User(value.to_string())
        } else if matches!(value, MdavError::Serialization { .. }) {
            Self::Internal(value.to_string())
        } else {
            Self::Runtime(value.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        None => run_verify(cli, &VerifyArgs::default()),
        Some(Command::Verify(args)) => run_verify(cli, args),
        Some(Command::Hints(args)) => run_hints(cli, args),
        Some(Command::Manifest(args)) => run_manifest(cli, args),
        Some(Command::Config(args)) => run_config(cli, args),
        Some(Command::Completions(args)) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
        Some(Command::Version) => emit_version(cli),
    }
}

// ---------------------------------------------------------------------------
// Target resolution
// ---------------------------------------------------------------------------

/// Working directory plus manifest a run is checked against.
struct Target {
    root: PathBuf,
    manifest: Manifest,
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Ok(Config::load(cli.config.as_deref())?)
}

fn apply_source(config: &mut Config, source: &ManifestSourceArgs) -> Result<(), MdavError> {
    if let Some(name) = &source.preset {
        config.verifier.preset = name.parse::<Preset>()?;
        config.verifier.manifest_file = None;
    }
    if let Some(path) = &source.manifest {
        config.verifier.manifest_file = Some(path.clone());
    }
    Ok(())
}

fn resolve_target(mut config: Config, args: &TargetArgs) -> Result<Target, MdavError> {
    apply_source(&mut config, &args.source)?;
    if let Some(dir) = &args.dir {
        config.verifier.working_dir.clone_from(dir);
    }
    let manifest = config.manifest()?;
    let root = resolve_working_dir(&config.verifier.working_dir)?;
    Ok(Target { root, manifest })
}

fn open_activity_log(config: &Config, override_path: Option<&Path>) -> Option<JsonlWriter> {
    let mut settings = JsonlConfig::from(&config.logging);
    match override_path {
        Some(path) => settings.path = path.to_path_buf(),
        None if config.logging.enabled => {}
        None => return None,
    }
    Some(JsonlWriter::open(settings))
}

// ---------------------------------------------------------------------------
// verify / hints
// ---------------------------------------------------------------------------

fn run_verify(cli: &Cli, args: &VerifyArgs) -> Result<(), CliError> {
    let started = Instant::now();
    let config = load_config(cli)?;
    let mut log = open_activity_log(&config, args.log.as_deref());

    let outcome = resolve_target(config, &args.target).and_then(|target| {
        if let Some(writer) = log.as_mut() {
            log_start(writer, &target.manifest, &target.root);
        }
        ArtifactVerifier::new(target.root, target.manifest).verify(&args.categories)
    });
    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            if let Some(writer) = log.as_mut() {
                writer.write_entry(&LogEntry::failure(&err));
                writer.flush();
            }
            return Err(err.into());
        }
    };

    if let Some(writer) = log.as_mut() {
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        log_report(writer, &report, elapsed);
    }

    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                print!("{}", render_report(&report, cli.verbose));
            }
        }
        OutputMode::Json => {
            let mut payload = serde_json::to_value(&report)?;
            payload["command"] = json!("verify");
            write_json_line(&payload)?;
        }
    }

    if report.ready {
        Ok(())
    } else {
        Err(CliError::NotReady(report.verdict_line()))
    }
}

fn run_hints(cli: &Cli, args: &TargetArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let target = resolve_target(config, args)?;
    let verifier = ArtifactVerifier::new(target.root, target.manifest);
    let hints = verifier.detect_known_mismatches();

    match output_mode(cli) {
        OutputMode::Human => {
            if cli.quiet {
                return Ok(());
            }
            if hints.is_empty() {
                println!("No known filename mismatches in {}.", verifier.root().display());
            } else {
                print!("{}", render_hints(&hints, cli.verbose));
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "hints",
                "manifest": verifier.manifest().name,
                "working_dir": verifier.root().to_string_lossy(),
                "hints": serde_json::to_value(&hints)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn render_report(report: &VerificationReport, verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", "Artifact verification:".bold(), report.manifest);
    let _ = writeln!(out, "  Working dir: {}", report.working_dir.display());
    let _ = writeln!(out, "  Manifest:    sha256:{}", report.fingerprint);
    if verbose {
        let _ = writeln!(out, "  Generated:   {}", report.generated_at);
    }

    for category in &report.categories {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", format!("[{}]", category.name).bold());
        for result in &category.results {
            let _ = writeln!(out, "{}", render_result_line(result));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "Summary".bold());
    for category in &report.categories {
        let line = category.summary_line();
        let line = if category.passed { line.green() } else { line.red() };
        let _ = writeln!(out, "  {line}");
    }

    if !report.hints.is_empty() {
        let _ = writeln!(out);
        out.push_str(&render_hints(&report.hints, verbose));
    }

    let _ = writeln!(out);
    let verdict = report.verdict_line();
    let verdict = if report.ready {
        verdict.green().bold()
    } else {
        verdict.red().bold()
    };
    let _ = writeln!(out, "{verdict}");
    out
}

fn render_result_line(result: &CheckResult) -> String {
    let label = format!("{} {:<13}", result.status.glyph(), result.status.tag());
    let mut line = format!("  {} {}", paint_status(&result.status, &label), result.file.display());
    if let Some(bytes) = result.status.bytes() {
        let _ = write!(line, " ({bytes} bytes)");
    }
    if let Some(detail) = &result.detail {
        let _ = write!(line, " - {detail}");
    }
    if let CheckStatus::AccessDenied { reason } = &result.status {
        let _ = write!(line, " - {reason}");
    }
    line
}

fn paint_status(status: &CheckStatus, text: &str) -> ColoredString {
    match status {
        CheckStatus::Present { .. } => text.green(),
        CheckStatus::Empty => text.yellow(),
        CheckStatus::Missing => text.red(),
        CheckStatus::AccessDenied { .. } => text.magenta(),
    }
}

fn render_hints(hints: &[RemediationHint], verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Remediation hints (not applied)".bold());
    for hint in hints {
        let owner = match (&hint.category, &hint.subject) {
            (Some(category), Some(subject)) => format!("{category}/{subject}"),
            _ => hint.destination.display().to_string(),
        };
        let _ = writeln!(out, "  {owner}: {}", hint.command.cyan());
        if verbose {
            if let Some(note) = &hint.note {
                let _ = writeln!(out, "    {}", note.dimmed());
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// manifest
// ---------------------------------------------------------------------------

fn run_manifest(cli: &Cli, args: &ManifestArgs) -> Result<(), CliError> {
    match &args.command {
        ManifestCommand::Show(source) => {
            let mut config = load_config(cli)?;
            apply_source(&mut config, source)?;
            let manifest = config.manifest()?;

            match output_mode(cli) {
                OutputMode::Human => print!("{}", manifest.to_toml_string()?),
                OutputMode::Json => {
                    let payload = json!({
                        "command": "manifest show",
                        "fingerprint": manifest.fingerprint()?,
                        "manifest": serde_json::to_value(&manifest)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        ManifestCommand::Validate(validate) => match Manifest::load(&validate.path) {
            Ok(manifest) => {
                let fingerprint = manifest.fingerprint()?;
                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Manifest is valid.");
                        println!("  Name: {}", manifest.name);
                        println!("  Categories: {}", manifest.category_names());
                        println!("  Artifacts: {}", manifest.artifact_count());
                        println!("  Mismatch rules: {}", manifest.mismatches.len());
                        println!("  Fingerprint: sha256:{fingerprint}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "manifest validate",
                            "valid": true,
                            "path": validate.path.to_string_lossy(),
                            "name": manifest.name,
                            "categories": manifest.categories.len(),
                            "artifacts": manifest.artifact_count(),
                            "mismatches": manifest.mismatches.len(),
                            "fingerprint": fingerprint,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => eprintln!("Manifest is INVALID: {e}"),
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "manifest validate",
                            "valid": false,
                            "path": validate.path.to_string_lossy(),
                            "error_code": e.code(),
                            "error": e.to_string(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(e.into())
            }
        },
        ManifestCommand::Init(init) => run_manifest_init(cli, init),
        ManifestCommand::Presets => {
            match output_mode(cli) {
                OutputMode::Human => {
                    for preset in Preset::ALL {
                        let manifest = preset.manifest();
                        println!("{:<12} {}", preset.name().bold(), preset.description());
                        println!(
                            "{:<12} categories: {} ({} artifacts), next step: {}",
                            "",
                            manifest.category_names(),
                            manifest.artifact_count(),
                            manifest.next_step
                        );
                    }
                }
                OutputMode::Json => {
                    let presets: Vec<Value> = Preset::ALL
                        .iter()
                        .map(|preset| {
                            let manifest = preset.manifest();
                            json!({
                                "name": preset.name(),
                                "description": preset.description(),
                                "categories": manifest.categories.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                                "artifacts": manifest.artifact_count(),
                                "next_step": manifest.next_step,
                            })
                        })
                        .collect();
                    write_json_line(&json!({ "command": "manifest presets", "presets": presets }))?;
                }
            }
            Ok(())
        }
    }
}

fn run_manifest_init(cli: &Cli, args: &InitManifestArgs) -> Result<(), CliError> {
    let preset = match &args.preset {
        Some(name) => name.parse::<Preset>()?,
        None => Preset::default(),
    };
    if args.path.exists() && !args.force {
        return Err(CliError::User(format!(
            "refusing to overwrite {} (pass --force to replace it)",
            args.path.display()
        )));
    }

    let rendered = preset.manifest().to_toml_string()?;
    if let Some(parent) = args.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| MdavError::io(parent, source))?;
        }
    }
    fs::write(&args.path, rendered).map_err(|source| MdavError::io(&args.path, source))?;

    match output_mode(cli) {
        OutputMode::Human => {
            if !cli.quiet {
                println!("Wrote {preset} manifest to {}", args.path.display());
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "manifest init",
                "preset": preset.name(),
                "path": args.path.to_string_lossy(),
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config / version
// ---------------------------------------------------------------------------

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let rendered = toml::to_string_pretty(&config).map_err(MdavError::from)?;
                    println!("{rendered}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => {
            let checked = Config::load(cli.config.as_deref())
                .and_then(|config| config.manifest().map(|manifest| (config, manifest)));
            match checked {
                Ok((config, manifest)) => {
                    match output_mode(cli) {
                        OutputMode::Human => {
                            println!("Configuration is valid.");
                            println!("  Source: {}", config.paths.config_file.display());
                            println!("  Manifest: {}", manifest.name);
                        }
                        OutputMode::Json => {
                            let payload = json!({
                                "command": "config validate",
                                "valid": true,
                                "path": config.paths.config_file.to_string_lossy(),
                                "manifest": manifest.name,
                            });
                            write_json_line(&payload)?;
                        }
                    }
                    Ok(())
                }
                Err(e) => {
                    match output_mode(cli) {
                        OutputMode::Human => eprintln!("Configuration is INVALID: {e}"),
                        OutputMode::Json => {
                            let payload = json!({
                                "command": "config validate",
                                "valid": false,
                                "error_code": e.code(),
                                "error": e.to_string(),
                            });
                            write_json_line(&payload)?;
                        }
                    }
                    Err(e.into())
                }
            }
        }
    }
}

fn emit_version(cli: &Cli) -> Result<(), CliError> {
    let version = env!("CARGO_PKG_VERSION");
    let package = env!("CARGO_PKG_NAME");
    let target = option_env!("TARGET").unwrap_or("unknown");
    let profile = option_env!("PROFILE").unwrap_or("unknown");
    let git_sha = option_env!("GIT_SHA").unwrap_or("unknown");

    match output_mode(cli) {
        OutputMode::Human => {
            println!("mdav {version}");
            if cli.verbose {
                println!("package: {package}");
                println!("target: {target}");
                println!("profile: {profile}");
                println!("git_sha: {git_sha}");
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "binary": "mdav",
                "version": version,
                "package": package,
                "build": {
                    "target": target,
                    "profile": profile,
                    "git_sha": git_sha,
                }
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("MDAV_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
