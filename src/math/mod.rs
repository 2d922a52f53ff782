//! Mathematical utilities: interpolation, summary statistics, cosmology.

pub mod cosmology;
pub mod interp;
pub mod stats;

pub use cosmology::*;
pub use interp::*;
pub use stats::*;
