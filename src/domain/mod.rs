//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the experiment kinds and their constants (`*Params`)
//! - jobs and batch manifests (`ExperimentJob`, `Manifest`)
//! - normalized input rows and printable result tables

pub mod types;

pub use types::*;
