//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - batch manifests (`manifest`)
//! - result table exports to CSV (`export`)
//! - analysis results as JSON (`results`)
//! - zipping the plot directory (`archive`)

pub mod archive;
pub mod export;
pub mod ingest;
pub mod manifest;
pub mod results;

pub use archive::*;
pub use export::*;
pub use ingest::*;
pub use manifest::*;
pub use results::*;
