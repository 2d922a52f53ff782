//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/text tables
//! - reloaded later for comparisons across objects

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::interp_loglog;

/// Dust grain composition of the opacity reference data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    Carbon,
    Silicate,
}

impl Composition {
    pub fn display_name(self) -> &'static str {
        match self {
            Composition::Carbon => "carbon",
            Composition::Silicate => "silicate",
        }
    }
}

/// Number of thermal dust components in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCount {
    One,
    Two,
}

impl ComponentCount {
    /// Dimension of the parameter vector θ.
    pub fn n_dim(self) -> usize {
        match self {
            ComponentCount::One => 2,
            ComponentCount::Two => 4,
        }
    }

    /// Parameter names, in θ order.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ComponentCount::One => &["log_dust_mass_cold", "temp_cold"],
            ComponentCount::Two => &[
                "log_dust_mass_cold",
                "temp_cold",
                "log_dust_mass_hot",
                "temp_hot",
            ],
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ComponentCount::One => "1-component",
            ComponentCount::Two => "2-component",
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            ComponentCount::One => 1,
            ComponentCount::Two => 2,
        }
    }
}

impl TryFrom<u8> for ComponentCount {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, AppError> {
        match value {
            1 => Ok(ComponentCount::One),
            2 => Ok(ComponentCount::Two),
            other => Err(AppError::new(2, format!("n_components must be 1 or 2, got {other}."))),
        }
    }
}

/// Output units for a model flux density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FluxUnit {
    /// Jansky (1e-23 erg/s/cm^2/Hz).
    Jansky,
    /// erg/s/cm^2/Hz.
    PerHz,
    /// erg/s/cm^2/AA.
    PerAngstrom,
}

/// Output units for a model luminosity density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LuminosityUnit {
    /// erg/s/Hz.
    PerHz,
    /// erg/s/AA.
    PerAngstrom,
}

/// An instrument bandpass: transmission as a function of observed wavelength (μm).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Band {
    pub wavelength: Vec<f64>,
    pub transmission: Vec<f64>,
}

impl Band {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.wavelength.len() != self.transmission.len() {
            return Err(AppError::new(
                2,
                "Bandpass wavelength and transmission arrays must have the same length.",
            ));
        }
        if self.wavelength.len() < 2 {
            return Err(AppError::new(2, "Bandpass needs at least 2 samples."));
        }
        if self.wavelength.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AppError::new(2, "Bandpass wavelengths must be strictly increasing."));
        }
        Ok(())
    }

    pub fn support(&self) -> (f64, f64) {
        (self.wavelength[0], self.wavelength[self.wavelength.len() - 1])
    }
}

/// One object's photometry: detections and upper limits, optionally with
/// per-point bandpass curves.
#[derive(Debug, Clone, Default)]
pub struct ObsSet {
    /// Observer-frame wavelength in μm.
    pub wavelength: Vec<f64>,
    /// Flux density in Jy (for limits: the quoted threshold).
    pub flux: Vec<f64>,
    /// 1σ flux uncertainty in Jy.
    pub flux_err: Vec<f64>,
    /// True where the point is an upper limit rather than a detection.
    pub is_limit: Vec<bool>,
    /// Optional bandpass per point; length must equal the point count.
    pub filters: Option<Vec<Band>>,
}

impl ObsSet {
    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    pub fn n_detections(&self) -> usize {
        self.is_limit.iter().filter(|l| !**l).count()
    }

    pub fn n_limits(&self) -> usize {
        self.is_limit.iter().filter(|l| **l).count()
    }

    pub fn has_filters(&self) -> bool {
        self.filters.is_some()
    }

    /// Validate the §3 invariants. Called once at the fit entry point so the
    /// likelihood hot path can assume a well-formed set.
    pub fn validate(&self) -> Result<(), AppError> {
        let n = self.wavelength.len();
        if n == 0 {
            return Err(AppError::new(3, "Observation set is empty."));
        }
        if self.flux.len() != n || self.flux_err.len() != n || self.is_limit.len() != n {
            return Err(AppError::new(
                2,
                "Observation arrays (wavelength/flux/flux_err/is_limit) must have equal lengths.",
            ));
        }
        for i in 0..n {
            if !(self.wavelength[i].is_finite() && self.wavelength[i] > 0.0) {
                return Err(AppError::new(2, format!("Non-positive wavelength at point {i}.")));
            }
            if !self.flux[i].is_finite() || !self.flux_err[i].is_finite() {
                return Err(AppError::new(2, format!("Non-finite flux or error at point {i}.")));
            }
            // Limits divide by sigma in the likelihood just like detections.
            if self.flux_err[i] <= 0.0 {
                return Err(AppError::new(
                    2,
                    format!("Point {i} has non-positive flux error."),
                ));
            }
        }
        if let Some(bands) = &self.filters {
            if bands.len() != n {
                return Err(AppError::new(
                    2,
                    format!("Filter bank length ({}) != observation count ({n}).", bands.len()),
                ));
            }
            for band in bands {
                band.validate()?;
            }
        }
        Ok(())
    }
}

/// Tabulated dust opacity κ(λ) for one (composition, grain size).
///
/// Immutable reference data: loaded once, interpolated onto the rest-frame
/// grid of interest, and shared read-only across fits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpacityTable {
    /// Rest-frame wavelength in μm, strictly increasing.
    pub wavelength: Vec<f64>,
    /// Opacity in cm²/g.
    pub kappa: Vec<f64>,
}

impl OpacityTable {
    pub fn new(wavelength: Vec<f64>, kappa: Vec<f64>) -> Result<Self, AppError> {
        if wavelength.len() != kappa.len() {
            return Err(AppError::new(2, "Opacity wavelength and kappa arrays must match in length."));
        }
        if wavelength.len() < 2 {
            return Err(AppError::new(2, "Opacity table needs at least 2 samples."));
        }
        if wavelength.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AppError::new(2, "Opacity wavelengths must be strictly increasing."));
        }
        if wavelength[0] <= 0.0 || kappa.iter().any(|k| !(k.is_finite() && *k > 0.0)) {
            return Err(AppError::new(2, "Opacity table values must be finite and positive."));
        }
        Ok(Self { wavelength, kappa })
    }

    /// Interpolate κ onto `rest_wave` (μm).
    ///
    /// Policy: log–log linear inside the tabulated domain (exact for power-law
    /// opacities), clamped to the end values outside it.
    pub fn interp_to(&self, rest_wave: &[f64]) -> Vec<f64> {
        rest_wave
            .iter()
            .map(|&w| interp_loglog(&self.wavelength, &self.kappa, w))
            .collect()
    }
}

/// Inclusive-exclusive parameter range `(lo, hi)` for the uniform box prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub lo: f64,
    pub hi: f64,
}

impl ParamRange {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Strict interior test, matching the hard-box prior semantics.
    pub fn contains(&self, x: f64) -> bool {
        self.lo < x && x < self.hi
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

/// Explicit prior configuration, constructed once per fit call and threaded
/// through prior/posterior evaluation (no process-wide prior table).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorConfig {
    pub log_mass_cold: ParamRange,
    pub temp_cold: ParamRange,
    pub log_mass_hot: ParamRange,
    pub temp_hot: ParamRange,
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            log_mass_cold: ParamRange::new(-6.0, 1.0),
            temp_cold: ParamRange::new(20.0, 2000.0),
            log_mass_hot: ParamRange::new(-8.0, 1.0),
            temp_hot: ParamRange::new(20.0, 3000.0),
        }
    }
}

impl PriorConfig {
    /// Per-dimension ranges in θ order for the given component count.
    pub fn ranges(&self, components: ComponentCount) -> Vec<ParamRange> {
        match components {
            ComponentCount::One => vec![self.log_mass_cold, self.temp_cold],
            ComponentCount::Two => vec![
                self.log_mass_cold,
                self.temp_cold,
                self.log_mass_hot,
                self.temp_hot,
            ],
        }
    }
}

/// Summary stats about the points actually used for fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_points: usize,
    pub n_detections: usize,
    pub n_limits: usize,
    pub wave_min: f64,
    pub wave_max: f64,
}

/// Marginal posterior estimate for one parameter:
/// median and the +1σ / −1σ credible half-widths (84.13 / 15.87 percentiles).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamEstimate {
    pub median: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Reduced result of one MCMC fit: per-parameter estimates plus the derived
/// total dust mass. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub components: ComponentCount,
    pub names: Vec<String>,
    pub estimates: Vec<ParamEstimate>,
    pub total_dust_mass: ParamEstimate,
}

impl FitSummary {
    /// Median parameter vector (θ order), used as "best fit" for comparison.
    pub fn median_theta(&self) -> Vec<f64> {
        self.estimates.iter().map(|e| e.median).collect()
    }
}

/// Deterministic post-hoc comparison of the 1- and 2-component fits.
///
/// Deltas are (1-component metric) − (2-component metric); positive favors
/// the 2-component model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelComparison {
    pub n_data: usize,
    pub log_like_1: f64,
    pub log_like_2: f64,
    pub aic_1: f64,
    pub aic_2: f64,
    pub delta_aic: f64,
    pub bic_1: f64,
    pub bic_2: f64,
    pub delta_bic: f64,
}

/// Resolved configuration for one `dustfit fit` run.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub catalog_path: PathBuf,
    pub object_name: String,
    pub redshift: f64,
    /// Luminosity distance in cm. `None` means: derive from redshift.
    pub distance_cm: Option<f64>,

    pub composition: Composition,
    pub grain_size_um: f64,

    /// `None` fits both component counts and compares them.
    pub components: Option<ComponentCount>,

    pub n_walkers: usize,
    pub n_steps: usize,
    pub burn_in: f64,
    pub n_cores: usize,
    pub sigma_clip: f64,
    pub repeats: usize,
    pub seed: u64,
    pub n_filter_samples: usize,

    pub priors: PriorConfig,
    /// Optional sub-box for drawing initial walker positions.
    pub initial: Option<PriorConfig>,

    pub output_dir: PathBuf,
    pub export_json: bool,
    pub progress: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_count_from_u8() {
        assert_eq!(ComponentCount::try_from(1).unwrap(), ComponentCount::One);
        assert_eq!(ComponentCount::try_from(2).unwrap(), ComponentCount::Two);
        assert!(ComponentCount::try_from(3).is_err());
    }

    #[test]
    fn obs_set_rejects_length_mismatch() {
        let obs = ObsSet {
            wavelength: vec![10.0, 20.0],
            flux: vec![1.0],
            flux_err: vec![0.1, 0.1],
            is_limit: vec![false, false],
            filters: None,
        };
        assert!(obs.validate().is_err());
    }

    #[test]
    fn obs_set_rejects_zero_error_points() {
        let obs = ObsSet {
            wavelength: vec![10.0],
            flux: vec![1.0],
            flux_err: vec![0.0],
            is_limit: vec![false],
            filters: None,
        };
        assert!(obs.validate().is_err());

        // Limits use sigma as a divisor in the likelihood as well.
        let limit = ObsSet {
            wavelength: vec![10.0],
            flux: vec![1.0],
            flux_err: vec![0.0],
            is_limit: vec![true],
            filters: None,
        };
        assert!(limit.validate().is_err());

        let ok = ObsSet {
            wavelength: vec![10.0],
            flux: vec![1.0],
            flux_err: vec![0.1],
            is_limit: vec![true],
            filters: None,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn obs_set_rejects_filter_bank_mismatch() {
        let band = Band {
            wavelength: vec![9.0, 10.0, 11.0],
            transmission: vec![0.5, 1.0, 0.5],
        };
        let obs = ObsSet {
            wavelength: vec![10.0, 20.0],
            flux: vec![1.0, 1.0],
            flux_err: vec![0.1, 0.1],
            is_limit: vec![false, false],
            filters: Some(vec![band]),
        };
        assert!(obs.validate().is_err());
    }

    #[test]
    fn opacity_table_requires_monotonic_wavelength() {
        assert!(OpacityTable::new(vec![1.0, 1.0], vec![10.0, 5.0]).is_err());
        assert!(OpacityTable::new(vec![1.0, 2.0], vec![10.0, 5.0]).is_ok());
    }

    #[test]
    fn prior_ranges_match_dimension() {
        let p = PriorConfig::default();
        assert_eq!(p.ranges(ComponentCount::One).len(), 2);
        assert_eq!(p.ranges(ComponentCount::Two).len(), 4);
    }
}
