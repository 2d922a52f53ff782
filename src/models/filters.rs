//! Bandpass integration of a model spectrum.
//!
//! Real instrument bandpasses have non-trivial width; evaluating the model
//! at a filter's nominal wavelength biases the fit wherever the spectrum
//! changes quickly across the band. When an observation set carries filter
//! curves, the model is computed on a dense grid and reduced to one synthetic
//! photometric point per band by transmission-weighted integration:
//!
//! `f_band = ∫ T(λ) f(λ) dλ / ∫ T(λ) dλ`
//!
//! over the overlap of the model grid and the filter support (trapezoidal).

use crate::domain::Band;
use crate::error::AppError;
use crate::math::interp_linear;

/// Integrate one bandpass over the model spectrum.
pub fn integrate_bandpass(
    model_wave: &[f64],
    model_flux: &[f64],
    band: &Band,
) -> Result<f64, AppError> {
    if model_wave.len() != model_flux.len() {
        return Err(AppError::new(
            2,
            "Model wavelength and flux arrays must have the same length.",
        ));
    }

    let (lo, hi) = band.support();
    let idx: Vec<usize> = (0..model_wave.len())
        .filter(|&i| model_wave[i] >= lo && model_wave[i] <= hi)
        .collect();

    if idx.len() < 2 {
        return Err(AppError::new(
            3,
            format!("Bandpass [{lo:.3}, {hi:.3}] μm overlaps fewer than 2 model grid points."),
        ));
    }

    let mut num = 0.0;
    let mut den = 0.0;
    for pair in idx.windows(2) {
        let (i, j) = (pair[0], pair[1]);
        let ti = interp_linear(&band.wavelength, &band.transmission, model_wave[i]);
        let tj = interp_linear(&band.wavelength, &band.transmission, model_wave[j]);
        let dw = model_wave[j] - model_wave[i];
        num += 0.5 * (ti * model_flux[i] + tj * model_flux[j]) * dw;
        den += 0.5 * (ti + tj) * dw;
    }

    if !(den.is_finite() && den > 0.0) {
        return Err(AppError::new(
            4,
            format!("Bandpass [{lo:.3}, {hi:.3}] μm has zero effective transmission."),
        ));
    }

    Ok(num / den)
}

/// One synthetic photometric point per band.
pub fn synthesize_photometry(
    model_wave: &[f64],
    model_flux: &[f64],
    bands: &[Band],
) -> Result<Vec<f64>, AppError> {
    bands
        .iter()
        .map(|band| integrate_bandpass(model_wave, model_flux, band))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_band(lo: f64, hi: f64) -> Band {
        Band {
            wavelength: vec![lo, hi],
            transmission: vec![1.0, 1.0],
        }
    }

    #[test]
    fn flat_spectrum_through_box_filter_is_unchanged() {
        let wave: Vec<f64> = (0..100).map(|i| 5.0 + 0.2 * i as f64).collect();
        let flux = vec![3.5; wave.len()];
        let band = box_band(8.0, 12.0);
        let f = integrate_bandpass(&wave, &flux, &band).unwrap();
        assert!((f - 3.5).abs() < 1e-12);
    }

    #[test]
    fn linear_spectrum_through_box_filter_is_band_center() {
        let wave: Vec<f64> = (0..=1000).map(|i| 5.0 + 0.02 * i as f64).collect();
        let flux: Vec<f64> = wave.iter().map(|w| 2.0 * w).collect();
        let band = box_band(10.0, 14.0);
        let f = integrate_bandpass(&wave, &flux, &band).unwrap();
        // Mean of a linear function over [10, 14] is its value at 12.
        assert!((f - 24.0).abs() < 1e-6);
    }

    #[test]
    fn non_overlapping_band_is_an_error() {
        let wave = vec![5.0, 6.0, 7.0];
        let flux = vec![1.0, 1.0, 1.0];
        let band = box_band(20.0, 25.0);
        assert!(integrate_bandpass(&wave, &flux, &band).is_err());
    }

    #[test]
    fn weighting_prefers_high_transmission_region() {
        let wave: Vec<f64> = (0..=400).map(|i| 8.0 + 0.01 * i as f64).collect();
        // Step spectrum: 1 below 10 μm, 3 above.
        let flux: Vec<f64> = wave.iter().map(|w| if *w < 10.0 { 1.0 } else { 3.0 }).collect();
        // Transmission concentrated above 10 μm.
        let band = Band {
            wavelength: vec![8.0, 10.0, 10.01, 12.0],
            transmission: vec![0.0, 0.0, 1.0, 1.0],
        };
        let f = integrate_bandpass(&wave, &flux, &band).unwrap();
        assert!(f > 2.5, "expected weighting toward the red half, got {f}");
    }
}
