//! Forward physical model: optically thin thermal dust emission.
//!
//! The likelihood relies on two primitive operations:
//! - predict the model flux spectrum in Jy for a parameter vector θ
//! - reduce a dense model spectrum to synthetic photometry through bandpasses
//!
//! These are implemented here as pure functions of their inputs.

pub mod dust;
pub mod filters;

pub use dust::*;
pub use filters::*;
