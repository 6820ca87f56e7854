//! Per-experiment data reduction.
//!
//! Each submodule exposes an `analyze` function that takes validated rows and
//! constants and returns a serializable result struct. No I/O happens here.

pub mod combustion;
pub mod emf;
pub mod surface_tension;
pub mod vapor_pressure;

pub use combustion::CombustionAnalysis;
pub use emf::EmfAnalysis;
pub use surface_tension::SurfaceTensionAnalysis;
pub use vapor_pressure::VaporPressureAnalysis;
