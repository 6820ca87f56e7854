//! Data sources other than the user's own measurement sheets.

pub mod sample;

pub use sample::{SampleSet, write_sample_data};
