//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{MdavError, Result};
use crate::core::paths::home_dir;
use crate::manifest::{Manifest, Preset};

/// Full verifier configuration model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub verifier: VerifierConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Where and against what manifest artifacts are checked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VerifierConfig {
    /// Directory expected filenames are resolved against.
    pub working_dir: PathBuf,
    /// Built-in manifest used when no manifest file is configured.
    pub preset: Preset,
    /// External manifest; takes precedence over `preset`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_file: Option<PathBuf>,
}

/// JSONL activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub jsonl_path: PathBuf,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by mdav itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("."),
            preset: Preset::default(),
            manifest_file: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            jsonl_path: home_dir()
                .join(".local")
                .join("share")
                .join("mdav")
                .join("activity.jsonl"),
            max_size_bytes: 10 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir().join(".config").join("mdav").join("config.toml"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| MdavError::io(&path_buf, source))?;
            toml::from_str::<Self>(&raw)?
        } else if is_explicit_path {
            return Err(MdavError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Resolve the manifest: the configured file if any, else the preset.
    pub fn manifest(&self) -> Result<Manifest> {
        match &self.verifier.manifest_file {
            Some(path) => Manifest::load(path),
            None => Ok(Manifest::preset(self.verifier.preset)),
        }
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("MDAV_WORKING_DIR") {
            self.verifier.working_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("MDAV_PRESET") {
            self.verifier.preset = raw.parse::<Preset>().map_err(|e| MdavError::ConfigParse {
                context: "env",
                details: format!("MDAV_PRESET={raw:?}: {e}"),
            })?;
        }
        if let Some(raw) = lookup("MDAV_MANIFEST") {
            self.verifier.manifest_file = Some(PathBuf::from(raw));
        }
        if let Some(raw) = lookup("MDAV_LOG_ENABLED") {
            self.logging.enabled = parse_env_bool("MDAV_LOG_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("MDAV_LOG_PATH") {
            self.logging.jsonl_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("MDAV_LOG_MAX_SIZE_BYTES") {
            self.logging.max_size_bytes = parse_env_u64("MDAV_LOG_MAX_SIZE_BYTES", &raw)?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.verifier.working_dir.as_os_str().is_empty() {
            return Err(MdavError::InvalidConfig {
                details: "verifier.working_dir must not be empty".to_string(),
            });
        }
        if let Some(manifest) = &self.verifier.manifest_file {
            if manifest.as_os_str().is_empty() {
                return Err(MdavError::InvalidConfig {
                    details: "verifier.manifest_file must not be empty when set".to_string(),
                });
            }
        }
        // One entry is ~300 bytes; anything smaller rotates on every line.
        if self.logging.max_size_bytes < 4096 {
            return Err(MdavError::InvalidConfig {
                details: format!(
                    "logging.max_size_bytes ({}) must be >= 4096",
                    self.logging.max_size_bytes
                ),
            });
        }
        if !(1..=100).contains(&self.logging.max_rotated_files) {
            return Err(MdavError::InvalidConfig {
                details: format!(
                    "logging.max_rotated_files must be in [1, 100], got {}",
                    self.logging.max_rotated_files
                ),
            });
        }
        if self.logging.enabled && self.logging.jsonl_path.as_os_str().is_empty() {
            return Err(MdavError::InvalidConfig {
                details: "logging.jsonl_path must be set when logging is enabled".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| MdavError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MdavError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: expected a boolean"),
        }),
    }
}
