//! Optically thin dust emission: blackbody radiance → luminosity → flux.
//!
//! All internal arithmetic is in cgs; wavelengths cross the public boundary
//! in μm, masses in M_sun, fluxes in Jy. Units are selected by enums rather
//! than strings; an unrepresentable unit request cannot reach these functions.
//!
//! Numerical notes:
//! - The Planck exponential overflows for hν/kT ≳ 700. We return 0 radiance
//!   there instead of Inf/NaN so extreme walkers produce a finite (or −∞)
//!   likelihood rather than a propagated fault.
//! - `exp_m1` keeps the Rayleigh–Jeans tail accurate for small hν/kT.

use crate::domain::{ComponentCount, FluxUnit, LuminosityUnit};
use crate::error::AppError;

/// Planck constant, erg·s.
const H_PLANCK: f64 = 6.626_070_15e-27;
/// Boltzmann constant, erg/K.
const K_B: f64 = 1.380_649e-16;
/// Speed of light, cm/s.
const C_CM_S: f64 = 2.997_924_58e10;
/// Solar mass, g.
const MSUN_G: f64 = 1.988_92e33;
/// One Jansky in erg/s/cm²/Hz.
const JY_CGS: f64 = 1e-23;
/// μm → cm.
const UM_CM: f64 = 1e-4;
/// Planck exponent beyond which exp(x) − 1 overflows f64.
const WIEN_CUTOFF: f64 = 700.0;

/// Blackbody spectral radiance B_ν at `wave_um` (rest frame) and `temp_k`,
/// in erg/s/cm²/Hz/sr.
pub fn blackbody_nu(wave_um: f64, temp_k: f64) -> f64 {
    if !(wave_um > 0.0 && temp_k > 0.0) {
        return 0.0;
    }
    let nu = C_CM_S / (wave_um * UM_CM);
    let x = H_PLANCK * nu / (K_B * temp_k);
    if x > WIEN_CUTOFF {
        return 0.0;
    }
    2.0 * H_PLANCK * nu * nu * nu / (C_CM_S * C_CM_S) / x.exp_m1()
}

/// Intrinsic luminosity density of an optically thin dust cloud:
///
/// `L = M · κ(λ) · 4π · B_ν(λ, T)`
///
/// `rest_wave` in μm, `kappa` in cm²/g interpolated onto the same grid,
/// `dust_mass` in M_sun, output in erg/s/Hz (`PerHz`) or erg/s/Å
/// (`PerAngstrom`).
pub fn calc_luminosity(
    rest_wave: &[f64],
    kappa: &[f64],
    dust_mass: f64,
    temp_k: f64,
    unit: LuminosityUnit,
) -> Result<Vec<f64>, AppError> {
    if rest_wave.len() != kappa.len() {
        return Err(AppError::new(
            2,
            format!(
                "rest_wave and kappa must have the same length ({} vs {}).",
                rest_wave.len(),
                kappa.len()
            ),
        ));
    }

    let mass_g = dust_mass * MSUN_G;
    let four_pi = 4.0 * std::f64::consts::PI;

    let out = rest_wave
        .iter()
        .zip(kappa.iter())
        .map(|(&w, &k)| {
            let l_nu = mass_g * k * blackbody_nu(w, temp_k) * four_pi;
            match unit {
                LuminosityUnit::PerHz => l_nu,
                // L_λ = L_ν c / λ², converted from per-cm to per-Å.
                LuminosityUnit::PerAngstrom => {
                    let lam_cm = w * UM_CM;
                    l_nu * C_CM_S / (lam_cm * lam_cm) * 1e-8
                }
            }
        })
        .collect();

    Ok(out)
}

/// Observed flux density from a luminosity density at `distance_cm`.
///
/// The (1+z) factor goes in opposite directions for per-frequency and
/// per-wavelength luminosities (bandwidth compression vs. stretch); the
/// result is converted to `out_unit` at the *observed* wavelength.
pub fn calc_flux(
    rest_wave: &[f64],
    luminosity: &[f64],
    unit: LuminosityUnit,
    distance_cm: f64,
    redshift: f64,
    out_unit: FluxUnit,
) -> Result<Vec<f64>, AppError> {
    if rest_wave.len() != luminosity.len() {
        return Err(AppError::new(
            2,
            format!(
                "rest_wave and luminosity must have the same length ({} vs {}).",
                rest_wave.len(),
                luminosity.len()
            ),
        ));
    }
    if !(distance_cm.is_finite() && distance_cm > 0.0) {
        return Err(AppError::new(2, format!("Distance must be finite and > 0 cm, got {distance_cm}.")));
    }

    let sphere = 4.0 * std::f64::consts::PI * distance_cm * distance_cm;
    let zp1 = 1.0 + redshift;

    let out = rest_wave
        .iter()
        .zip(luminosity.iter())
        .map(|(&w, &l)| {
            // Flux in the native units of the luminosity density.
            let f_native = match unit {
                LuminosityUnit::PerHz => l / sphere * zp1,
                LuminosityUnit::PerAngstrom => l / sphere / zp1,
            };
            let obs_lam_cm = w * zp1 * UM_CM;
            // Route through f_ν (erg/s/cm²/Hz) at the observed wavelength.
            let f_nu = match unit {
                LuminosityUnit::PerHz => f_native,
                LuminosityUnit::PerAngstrom => f_native * 1e8 * obs_lam_cm * obs_lam_cm / C_CM_S,
            };
            match out_unit {
                FluxUnit::Jansky => f_nu / JY_CGS,
                FluxUnit::PerHz => f_nu,
                FluxUnit::PerAngstrom => f_nu * C_CM_S / (obs_lam_cm * obs_lam_cm) * 1e-8,
            }
        })
        .collect();

    Ok(out)
}

/// Flux spectrum in Jy for a single dust component with linear mass.
///
/// `kappa_interp` must be pre-interpolated onto the rest frame of `obs_wave`.
pub fn component_flux(
    obs_wave: &[f64],
    kappa_interp: &[f64],
    dust_mass: f64,
    temp_k: f64,
    redshift: f64,
    distance_cm: f64,
) -> Result<Vec<f64>, AppError> {
    let rest_wave: Vec<f64> = obs_wave.iter().map(|w| w / (1.0 + redshift)).collect();
    let lum = calc_luminosity(&rest_wave, kappa_interp, dust_mass, temp_k, LuminosityUnit::PerHz)?;
    calc_flux(
        &rest_wave,
        &lum,
        LuminosityUnit::PerHz,
        distance_cm,
        redshift,
        FluxUnit::Jansky,
    )
}

/// Model flux spectrum in Jy for a parameter vector θ.
///
/// θ is `[log10 M_cold, T_cold]` for one component and
/// `[log10 M_cold, T_cold, log10 M_hot, T_hot]` for two. The two-component
/// spectrum is the elementwise sum of independent one-component evaluations,
/// which is also how individual component curves are drawn for reporting.
pub fn model_flux(
    theta: &[f64],
    obs_wave: &[f64],
    kappa_interp: &[f64],
    redshift: f64,
    distance_cm: f64,
    components: ComponentCount,
) -> Result<Vec<f64>, AppError> {
    if theta.len() != components.n_dim() {
        return Err(AppError::new(
            2,
            format!(
                "Parameter vector has {} entries; {} model needs {}.",
                theta.len(),
                components.display_name(),
                components.n_dim()
            ),
        ));
    }

    match components {
        ComponentCount::One => component_flux(
            obs_wave,
            kappa_interp,
            10f64.powf(theta[0]),
            theta[1],
            redshift,
            distance_cm,
        ),
        ComponentCount::Two => {
            let mut cold = component_flux(
                obs_wave,
                kappa_interp,
                10f64.powf(theta[0]),
                theta[1],
                redshift,
                distance_cm,
            )?;
            let hot = component_flux(
                obs_wave,
                kappa_interp,
                10f64.powf(theta[2]),
                theta[3],
                redshift,
                distance_cm,
            )?;
            for (c, h) in cold.iter_mut().zip(hot.iter()) {
                *c += h;
            }
            Ok(cold)
        }
    }
}
