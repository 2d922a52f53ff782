//! Built-in mass absorption coefficients κ(λ) for the supported grain
//! species, tabulated on a coarse wavelength grid and interpolated
//! log-log at evaluation time.
//!
//! Units: wavelength in μm, κ in cm²/g. Both species are available at
//! grain radii of 0.1 μm and 1.0 μm.

use crate::domain::{Composition, OpacityTable};
use crate::error::AppError;

/// Grain radii (μm) a table exists for.
pub const SUPPORTED_GRAIN_SIZES_UM: [f64; 2] = [0.1, 1.0];

const GRAIN_SIZE_TOL: f64 = 1e-9;

/// Amorphous carbon, a = 0.1 μm.
const CARBON_A01: &[(f64, f64)] = &[
    (0.1, 1.6e5),
    (0.2, 1.2e5),
    (0.5, 7.0e4),
    (1.0, 3.2e4),
    (2.0, 1.3e4),
    (5.0, 3.8e3),
    (10.0, 1.4e3),
    (20.0, 5.0e2),
    (50.0, 1.2e2),
    (100.0, 4.5e1),
    (200.0, 1.6e1),
    (500.0, 4.2e0),
    (1000.0, 1.6e0),
];

/// Amorphous carbon, a = 1.0 μm. Flatter in the optical where the grains
/// are in the geometric limit; converges to the small-grain values in
/// the far infrared.
const CARBON_A10: &[(f64, f64)] = &[
    (0.1, 2.2e4),
    (0.2, 2.0e4),
    (0.5, 1.6e4),
    (1.0, 1.1e4),
    (2.0, 6.5e3),
    (5.0, 2.8e3),
    (10.0, 1.2e3),
    (20.0, 4.6e2),
    (50.0, 1.1e2),
    (100.0, 4.2e1),
    (200.0, 1.5e1),
    (500.0, 4.0e0),
    (1000.0, 1.5e0),
];

/// Astronomical silicate, a = 0.1 μm. The 9.7 and 18 μm stretching and
/// bending resonances are resolved by the grid.
const SILICATE_A01: &[(f64, f64)] = &[
    (0.1, 6.0e4),
    (0.2, 4.5e4),
    (0.5, 2.4e4),
    (1.0, 7.0e3),
    (2.0, 1.5e3),
    (5.0, 4.0e2),
    (8.0, 1.1e3),
    (9.7, 2.9e3),
    (12.0, 1.2e3),
    (18.0, 1.6e3),
    (25.0, 7.5e2),
    (50.0, 2.0e2),
    (100.0, 5.5e1),
    (200.0, 1.4e1),
    (500.0, 2.3e0),
    (1000.0, 6.0e-1),
];

/// Astronomical silicate, a = 1.0 μm.
const SILICATE_A10: &[(f64, f64)] = &[
    (0.1, 1.3e4),
    (0.2, 1.2e4),
    (0.5, 1.0e4),
    (1.0, 6.5e3),
    (2.0, 2.2e3),
    (5.0, 5.5e2),
    (8.0, 1.0e3),
    (9.7, 2.4e3),
    (12.0, 1.1e3),
    (18.0, 1.4e3),
    (25.0, 7.0e2),
    (50.0, 1.9e2),
    (100.0, 5.2e1),
    (200.0, 1.3e1),
    (500.0, 2.2e0),
    (1000.0, 6.0e-1),
];

/// Look up the κ(λ) table for a composition and grain radius.
///
/// TODO: interpolate κ between the 0.1 and 1.0 μm tables so `--grain-size`
/// accepts intermediate radii instead of only the tabulated two.
pub fn load_opacity(composition: Composition, grain_size_um: f64) -> Result<OpacityTable, AppError> {
    let size = SUPPORTED_GRAIN_SIZES_UM
        .iter()
        .find(|&&s| (s - grain_size_um).abs() < GRAIN_SIZE_TOL);
    let Some(&size) = size else {
        return Err(AppError::new(
            2,
            format!(
                "No opacity table for grain size {grain_size_um} um. Supported sizes: {:?} um.",
                SUPPORTED_GRAIN_SIZES_UM
            ),
        ));
    };

    let table = match (composition, size == 0.1) {
        (Composition::Carbon, true) => CARBON_A01,
        (Composition::Carbon, false) => CARBON_A10,
        (Composition::Silicate, true) => SILICATE_A01,
        (Composition::Silicate, false) => SILICATE_A10,
    };

    let (wavelength, kappa): (Vec<f64>, Vec<f64>) = table.iter().copied().unzip();
    OpacityTable::new(wavelength, kappa)
}
