//! Synthetic photometry catalogs for smoke tests and demos.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::data::load_opacity;
use crate::domain::{ComponentCount, Composition};
use crate::error::AppError;
use crate::math::luminosity_distance_cm;
use crate::models::model_flux;

/// Recipe for one synthetic single-component catalog.
#[derive(Debug, Clone)]
pub struct SynthSpec {
    pub log_dust_mass: f64,
    pub temperature: f64,
    pub redshift: f64,
    /// Observer-frame wavelengths (μm) to sample.
    pub wavelengths: Vec<f64>,
    /// Fractional 1σ uncertainty applied to every point.
    pub frac_err: f64,
    pub seed: u64,
    pub composition: Composition,
    pub grain_size_um: f64,
}

/// One synthetic photometric point.
#[derive(Debug, Clone)]
pub struct SynthPoint {
    pub wavelength: f64,
    pub flux: f64,
    pub flux_err: f64,
}

/// Draw noisy fluxes from the forward model at the requested wavelengths.
pub fn generate_catalog(spec: &SynthSpec) -> Result<Vec<SynthPoint>, AppError> {
    if spec.wavelengths.is_empty() {
        return Err(AppError::new(2, "Synthetic catalog needs at least one wavelength."));
    }
    if !(spec.frac_err.is_finite() && spec.frac_err > 0.0) {
        return Err(AppError::new(2, format!("frac_err must be > 0, got {}.", spec.frac_err)));
    }

    let opacity = load_opacity(spec.composition, spec.grain_size_um)?;
    let rest: Vec<f64> = spec.wavelengths.iter().map(|w| w / (1.0 + spec.redshift)).collect();
    let kappa = opacity.interp_to(&rest);
    let distance_cm = luminosity_distance_cm(spec.redshift)?;

    let theta = [spec.log_dust_mass, spec.temperature];
    let model = model_flux(
        &theta,
        &spec.wavelengths,
        &kappa,
        spec.redshift,
        distance_cm,
        ComponentCount::One,
    )?;

    let mut rng = StdRng::seed_from_u64(spec.seed);
    let unit = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, e.to_string()))?;

    Ok(spec
        .wavelengths
        .iter()
        .zip(model.iter())
        .map(|(&w, &m)| {
            let sigma = spec.frac_err * m;
            SynthPoint {
                wavelength: w,
                flux: m + sigma * unit.sample(&mut rng),
                flux_err: sigma,
            }
        })
        .collect())
}

/// Write a catalog in the ingest schema (`wavelength,flux,flux_err,is_limit`).
pub fn write_catalog_csv(path: &Path, points: &[SynthPoint]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create {}: {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    let io_err = |e: std::io::Error| AppError::new(2, format!("Failed to write {}: {e}", path.display()));
    writeln!(out, "wavelength,flux,flux_err,is_limit").map_err(io_err)?;
    for p in points {
        writeln!(out, "{:.6},{:.6e},{:.6e},0", p.wavelength, p.flux, p.flux_err).map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;
    Ok(())
}
