//! `labfit` library crate.
//!
//! The binary (`labfit`) is a thin wrapper around this library so that:
//!
//! - the data reduction is testable without spawning processes
//! - the batch pipeline can be driven from integration tests
//! - code stays easy to navigate: ingest, analysis, plotting and reporting live apart

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
