//! MDAV-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, MdavError>;

/// Top-level error type for the artifact verifier.
///
/// Per-artifact conditions (missing, empty, access denied) are not errors; they
/// are reported as [`crate::verifier::check::CheckStatus`] values. These variants
/// cover failures that prevent a report from being produced at all.
#[derive(Debug, Error)]
pub enum MdavError {
    #[error("[MDAV-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[MDAV-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[MDAV-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[MDAV-1101] invalid manifest: {details}")]
    InvalidManifest { details: String },

    #[error("[MDAV-1102] missing manifest file: {path}")]
    MissingManifest { path: PathBuf },

    #[error("[MDAV-1103] unknown category {name:?} (available: {available})")]
    UnknownCategory { name: String, available: String },

    #[error("[MDAV-1104] unknown preset {name:?} (available: {available})")]
    UnknownPreset { name: String, available: String },

    #[error("[MDAV-2001] working directory {path} is unusable: {details}")]
    WorkingDir { path: PathBuf, details: String },

    #[error("[MDAV-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[MDAV-3001] permission denied for {path}")]
    PermissionDenied { path: PathBuf },

    #[error("[MDAV-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MdavError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "MDAV-1001",
            Self::MissingConfig { .. } => "MDAV-1002",
            Self::ConfigParse { .. } => "MDAV-1003",
            Self::InvalidManifest { .. } => "MDAV-1101",
            Self::MissingManifest { .. } => "MDAV-1102",
            Self::UnknownCategory { .. } => "MDAV-1103",
            Self::UnknownPreset { .. } => "MDAV-1104",
            Self::WorkingDir { .. } => "MDAV-2001",
            Self::Serialization { .. } => "MDAV-2101",
            Self::PermissionDenied { .. } => "MDAV-3001",
            Self::Io { .. } => "MDAV-3002",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::WorkingDir { .. })
    }

    /// Whether the failure stems from user-supplied input (config, manifest,
    /// flags) rather than the environment.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::ConfigParse { .. }
                | Self::InvalidManifest { .. }
                | Self::UnknownCategory { .. }
                | Self::UnknownPreset { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    ///
    /// Permission failures are split out so callers can tell them apart from
    /// a plain read error.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied { path };
        }
        Self::Io { path, source }
    }
}

impl From<serde_json::Error> for MdavError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for MdavError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for MdavError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}
