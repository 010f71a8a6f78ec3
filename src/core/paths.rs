//! Working-directory and config-path resolution.

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::core::errors::{MdavError, Result};

/// Resolve a path to an absolute, normalized path.
///
/// Existing paths go through `fs::canonicalize` so symlinks are resolved.
/// Otherwise the path is made absolute relative to CWD and `..`/`.`
/// components are resolved syntactically.
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    if let Ok(canonical) = fs::canonicalize(&absolute) {
        return canonical;
    }

    normalize_syntactic(&absolute)
}

/// Resolve the directory artifacts are checked against.
///
/// A directory that does not exist yet is accepted: every artifact under it
/// then reports MISSING. A path that exists but is not a directory, or that
/// cannot be queried, is an error.
pub fn resolve_working_dir(path: &Path) -> Result<PathBuf> {
    let resolved = resolve_absolute_path(path);
    match fs::metadata(&resolved) {
        Ok(meta) if meta.is_dir() => Ok(resolved),
        Ok(_) => Err(MdavError::WorkingDir {
            path: resolved,
            details: "not a directory".to_string(),
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(resolved),
        Err(err) => Err(MdavError::WorkingDir {
            path: resolved,
            details: err.to_string(),
        }),
    }
}

/// Home directory, falling back to `/tmp` when `HOME` is unset.
pub fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[MDAV-CONFIG] WARNING: HOME not set, falling back to /tmp");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}
