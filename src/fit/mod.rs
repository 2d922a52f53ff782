//! Bayesian inference of dust mass and temperature.
//!
//! Responsibilities:
//!
//! - evaluate the target density: box prior × censored likelihood
//! - advance the walker ensemble (affine-invariant stretch move)
//! - drive repeated run cycles with non-finite/outlier walker repair
//! - reduce the chain to credible intervals and derived quantities
//! - compare the 1- and 2-component fits post hoc (AIC/BIC)

pub mod compare;
pub mod controller;
pub mod posterior;
pub mod sampler;
pub mod summary;

pub use compare::*;
pub use controller::*;
pub use posterior::*;
pub use sampler::*;
pub use summary::*;
