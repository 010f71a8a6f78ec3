#![forbid(unsafe_code)]

//! MD Artifact Verifier (mdav): pre-flight integrity check for molecular-dynamics
//! analysis outputs.
//!
//! Before a plotting step runs, every expected trajectory-analysis file is
//! probed for existence and non-zero size. Results are grouped per analysis
//! category (PCA, FEL, DCCM, ...), and a small declarative list of known
//! filename mismatches yields `mv`/`cp` suggestions. Nothing is ever renamed,
//! copied or deleted.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use md_artifact_verifier::prelude::*;
//!
//! let verifier = ArtifactVerifier::new(".", Manifest::preset(Preset::Trajectory));
//! let report = verifier.verify(&["PCA", "DCCM"]).unwrap();
//! println!("{}", report.verdict_line());
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use md_artifact_verifier::core::config::Config;
//! use md_artifact_verifier::verifier::probe::{FsProbe, LocalFs};
//! ```

pub mod prelude;

pub mod core;
pub mod logger;
pub mod manifest;
pub mod verifier;
