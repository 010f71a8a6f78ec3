//! Filesystem probe: the only place the verifier touches the disk.
//!
//! Probing is limited to `stat`: existence, file type and byte length.
//! Artifact contents are never opened.

#![allow(missing_docs)]

use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

/// What a single `stat` call revealed about a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    /// A regular file (after following symlinks) of `len` bytes.
    File { len: u64 },
    /// Nothing at the path, including dangling symlinks and paths whose
    /// parent component is a regular file.
    NotFound,
    /// Something other than a regular file occupies the path.
    NotAFile,
    /// The filesystem refused to answer (permissions, IO error, ...).
    Unreadable(String),
}

/// Read-only filesystem seam.
///
/// Implementations must not mutate anything; each call is an independent
/// read so callers may issue them in any order.
pub trait FsProbe: Send + Sync {
    fn stat(&self, path: &Path) -> FileState;
}

/// Probe backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FsProbe for LocalFs {
    fn stat(&self, path: &Path) -> FileState {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => FileState::File { len: meta.len() },
            Ok(_) => FileState::NotAFile,
            Err(err) => classify_io_error(&err),
        }
    }
}

/// Split "not there" from "could not look".
pub fn classify_io_error(err: &io::Error) -> FileState {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => FileState::NotFound,
        _ => FileState::Unreadable(err.to_string()),
    }
}
