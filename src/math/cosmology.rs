//! Flat ΛCDM luminosity distance.
//!
//! The fit only needs one number from cosmology: the luminosity distance of
//! the object. We hard-wire a flat H0 = 70 km/s/Mpc, Ωm = 0.3 cosmology and
//! integrate the comoving distance with Simpson's rule. This is deterministic
//! and accurate to far better than the photometric uncertainties it feeds.

use crate::error::AppError;

/// Speed of light in km/s.
const C_KM_S: f64 = 299_792.458;
/// Hubble constant in km/s/Mpc.
const H0_KM_S_MPC: f64 = 70.0;
/// Matter density parameter (flat: ΩΛ = 1 − Ωm).
const OMEGA_M: f64 = 0.3;
/// One megaparsec in cm.
pub const MPC_CM: f64 = 3.085_677_581e24;

/// Simpson intervals for the comoving-distance integral (must be even).
const N_INTERVALS: usize = 512;

fn inv_e(z: f64) -> f64 {
    let zp1 = 1.0 + z;
    1.0 / (OMEGA_M * zp1 * zp1 * zp1 + (1.0 - OMEGA_M)).sqrt()
}

/// Luminosity distance in cm for a given redshift.
///
/// Redshift must be finite and > 0: at z = 0 the distance degenerates to zero
/// and the flux contract breaks down, so callers with a nearby object must
/// supply an explicit distance instead.
pub fn luminosity_distance_cm(redshift: f64) -> Result<f64, AppError> {
    if !(redshift.is_finite() && redshift > 0.0) {
        return Err(AppError::new(
            2,
            format!("Redshift must be finite and > 0 to derive a distance, got {redshift}."),
        ));
    }

    // Comoving distance D_C = (c/H0) ∫ dz' / E(z'), Simpson's rule.
    let h = redshift / N_INTERVALS as f64;
    let mut sum = inv_e(0.0) + inv_e(redshift);
    for i in 1..N_INTERVALS {
        let w = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += w * inv_e(h * i as f64);
    }
    let d_c_mpc = (C_KM_S / H0_KM_S_MPC) * sum * h / 3.0;

    Ok((1.0 + redshift) * d_c_mpc * MPC_CM)
}
