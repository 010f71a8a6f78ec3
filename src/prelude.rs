//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use md_artifact_verifier::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{MdavError, Result};

// Manifest
pub use crate::manifest::{ArtifactSpec, CategorySpec, Manifest, MismatchRule, Preset, RemediationAction};

// Verifier
pub use crate::verifier::ArtifactVerifier;
pub use crate::verifier::check::{CategoryResult, CheckResult, CheckStatus};
pub use crate::verifier::mismatch::RemediationHint;
pub use crate::verifier::probe::{FileState, FsProbe, LocalFs};
pub use crate::verifier::report::VerificationReport;
