//! JSONL activity log: one self-contained JSON object per line, appended for
//! every verification run so pipeline gates leave an audit trail.
//!
//! Lines are assembled in memory and written with a single `write_all` so a
//! concurrent `tail -f` never sees a partial line.
//!
//! Degradation chain:
//! 1. Configured log file
//! 2. stderr with `[MDAV-JSONL]` prefix
//! 3. Silent discard (a logging failure never changes the verdict)

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions, rename};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::LoggingConfig;
use crate::core::errors::{MdavError, Result};
use crate::manifest::Manifest;
use crate::verifier::check::CheckStatus;
use crate::verifier::report::VerificationReport;

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Event types emitted during a verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    VerifyStart,
    ArtifactChecked,
    CategoryComplete,
    RemediationSuggested,
    VerifyComplete,
    Error,
}

/// A single JSONL log entry; everything but `ts`, `event`, `severity` is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// PRESENT / EMPTY / MISSING / ACCESS_DENIED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            manifest: None,
            fingerprint: None,
            working_dir: None,
            category: None,
            subject: None,
            path: None,
            status: None,
            size: None,
            passed: None,
            command: None,
            ready: None,
            duration_ms: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    /// Entry describing an error that stopped a run before a report existed.
    pub fn failure(err: &MdavError) -> Self {
        let mut entry = Self::new(EventType::Error, Severity::Critical);
        entry.error_code = Some(err.code().to_string());
        entry.error_message = Some(err.to_string());
        entry
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Normal,
    Stderr,
    Discard,
}

/// Writer settings.
#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    /// Rotate once the file would exceed this size.
    pub max_size_bytes: u64,
    /// Rotated generations kept as `<path>.1` … `<path>.N`.
    pub max_rotated_files: u32,
}

impl From<&LoggingConfig> for JsonlConfig {
    fn from(value: &LoggingConfig) -> Self {
        Self {
            path: value.jsonl_path.clone(),
            max_size_bytes: value.max_size_bytes,
            max_rotated_files: value.max_rotated_files,
        }
    }
}

/// Append-only JSONL writer with size rotation and stderr fallback.
pub struct JsonlWriter {
    config: JsonlConfig,
    writer: Option<BufWriter<File>>,
    state: WriterState,
    bytes_written: u64,
}

impl JsonlWriter {
    /// Open the log file, degrading to stderr if it cannot be opened.
    pub fn open(config: JsonlConfig) -> Self {
        let mut w = Self {
            config,
            writer: None,
            state: WriterState::Discard,
            bytes_written: 0,
        };
        match open_append(&w.config.path) {
            Ok((file, size)) => {
                w.writer = Some(BufWriter::new(file));
                w.state = WriterState::Normal;
                w.bytes_written = size;
            }
            Err(err) => {
                let _ = writeln!(io::stderr(), "[MDAV-JSONL] {err}; logging to stderr");
                w.state = WriterState::Stderr;
            }
        }
        w
    }

    /// Write a single log entry as one JSONL line.
    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[MDAV-JSONL] serialize error: {e}");
                return;
            }
        };
        self.write_line(&line);
    }

    pub fn flush(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
    }

    /// Current degradation state.
    pub fn state(&self) -> &str {
        match self.state {
            WriterState::Normal => "normal",
            WriterState::Stderr => "stderr",
            WriterState::Discard => "discard",
        }
    }

    fn write_line(&mut self, line: &str) {
        if self.state == WriterState::Normal
            && self.bytes_written + line.len() as u64 > self.config.max_size_bytes
        {
            self.rotate();
        }

        match self.state {
            WriterState::Normal => {
                let ok = self
                    .writer
                    .as_mut()
                    .is_some_and(|w| w.write_all(line.as_bytes()).is_ok());
                if ok {
                    self.bytes_written += line.len() as u64;
                } else {
                    self.degrade();
                    self.write_line(line);
                }
            }
            WriterState::Stderr => {
                if write!(io::stderr(), "[MDAV-JSONL] {line}").is_err() {
                    self.degrade();
                }
            }
            WriterState::Discard => {}
        }
    }

    fn degrade(&mut self) {
        self.writer = None;
        self.state = match self.state {
            WriterState::Normal => {
                let _ = writeln!(io::stderr(), "[MDAV-JSONL] write failed, using stderr");
                WriterState::Stderr
            }
            WriterState::Stderr | WriterState::Discard => WriterState::Discard,
        };
    }

    fn rotate(&mut self) {
        if let Some(w) = self.writer.as_mut() {
            let _ = w.flush();
        }
        self.writer = None;

        let base = self.config.path.clone();
        // .N-1 → .N, …, .1 → .2, then current → .1; the oldest falls off.
        let _ = fs::remove_file(rotated_name(&base, self.config.max_rotated_files));
        for i in (1..self.config.max_rotated_files).rev() {
            let _ = rename(rotated_name(&base, i), rotated_name(&base, i + 1));
        }
        let _ = rename(&base, rotated_name(&base, 1));

        match open_append(&base) {
            Ok((file, _)) => {
                self.writer = Some(BufWriter::new(file));
                self.bytes_written = 0;
            }
            Err(_) => self.degrade(),
        }
    }
}

impl Drop for JsonlWriter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Emit `verify_start`; call before any artifact is checked.
pub fn log_start(writer: &mut JsonlWriter, manifest: &Manifest, working_dir: &Path) {
    let mut start = LogEntry::new(EventType::VerifyStart, Severity::Info);
    start.manifest = Some(manifest.name.clone());
    start.fingerprint = manifest.fingerprint().ok();
    start.working_dir = Some(working_dir.to_string_lossy().into_owned());
    writer.write_entry(&start);
}

/// Emit per-artifact, per-category, hint and completion events for a
/// finished run.
pub fn log_report(writer: &mut JsonlWriter, report: &VerificationReport, duration_ms: u64) {
    let working_dir = report.working_dir.to_string_lossy().into_owned();

    for category in &report.categories {
        for result in &category.results {
            let severity = if result.status.is_present() {
                Severity::Info
            } else {
                Severity::Warning
            };
            let mut entry = LogEntry::new(EventType::ArtifactChecked, severity);
            entry.category = Some(category.name.clone());
            entry.subject = Some(result.subject.clone());
            entry.path = Some(result.file.to_string_lossy().into_owned());
            entry.status = Some(result.status.tag().to_string());
            entry.size = result.status.bytes();
            entry.details = match &result.status {
                CheckStatus::AccessDenied { reason } => Some(reason.clone()),
                _ => result.detail.clone(),
            };
            writer.write_entry(&entry);
        }

        let severity = if category.passed {
            Severity::Info
        } else {
            Severity::Warning
        };
        let mut entry = LogEntry::new(EventType::CategoryComplete, severity);
        entry.category = Some(category.name.clone());
        entry.passed = Some(category.passed);
        entry.details = Some(category.summary_line());
        writer.write_entry(&entry);
    }

    for hint in &report.hints {
        let mut entry = LogEntry::new(EventType::RemediationSuggested, Severity::Info);
        entry.category.clone_from(&hint.category);
        entry.subject.clone_from(&hint.subject);
        entry.path = Some(hint.destination.to_string_lossy().into_owned());
        entry.command = Some(hint.command.clone());
        writer.write_entry(&entry);
    }

    let severity = if report.ready {
        Severity::Info
    } else {
        Severity::Critical
    };
    let mut done = LogEntry::new(EventType::VerifyComplete, severity);
    done.manifest = Some(report.manifest.clone());
    done.working_dir = Some(working_dir);
    done.ready = Some(report.ready);
    done.duration_ms = Some(duration_ms);
    done.details = Some(report.verdict_line());
    writer.write_entry(&done);
    writer.flush();
}

/// Open or create a file for appending. Returns `(File, current_size)`.
fn open_append(path: &Path) -> Result<(File, u64)> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| MdavError::io(parent, source))?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| MdavError::io(path, source))?;
    let size = file.metadata().map(|m| m.len()).unwrap_or(0);
    Ok((file, size))
}

/// `activity.jsonl` → `activity.jsonl.3`.
fn rotated_name(base: &Path, index: u32) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
