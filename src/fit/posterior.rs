//! Target density: box prior × censored likelihood.
//!
//! The likelihood treats detections and upper limits differently:
//!
//! - detections: standard Gaussian term, including the `-½ log(2πσ²)`
//!   normalization (the comparison metrics need absolute likelihoods)
//! - upper limits: `ln Φ((limit − model)/σ)`, the probability that the true
//!   flux lies at or below the quoted limit given the model prediction.
//!   Models safely below a limit pay nothing; models overshooting a limit
//!   are driven to −∞. A numerically zero probability maps to −∞ rather
//!   than a domain error.
//!
//! Walkers in pathological corners of parameter space produce overflow or
//! non-finite intermediates; those evaluate to −∞ and the sampler simply
//! never accepts the move. No fault propagates out of this module.

use crate::domain::{ComponentCount, ObsSet, OpacityTable, PriorConfig};
use crate::error::AppError;
use crate::math::normal_cdf;
use crate::models::{model_flux, synthesize_photometry};

/// Hard-box log-prior: 0 inside, −∞ outside.
///
/// For the two-component model the hot temperature must exceed the cold one;
/// this ordering breaks the label-swap degeneracy between the components.
pub fn log_prior(theta: &[f64], priors: &PriorConfig, components: ComponentCount) -> f64 {
    let ranges = priors.ranges(components);
    if theta.len() != ranges.len() {
        return f64::NEG_INFINITY;
    }
    for (x, r) in theta.iter().zip(ranges.iter()) {
        if !r.contains(*x) {
            return f64::NEG_INFINITY;
        }
    }
    if components == ComponentCount::Two && theta[3] <= theta[1] {
        return f64::NEG_INFINITY;
    }
    0.0
}

/// Everything needed to evaluate the posterior for one fit, assembled once
/// before sampling starts. Immutable and `Sync`: safe to share across the
/// worker pool evaluating walkers in parallel.
#[derive(Debug, Clone)]
pub struct Posterior {
    pub obs: ObsSet,
    /// Observer-frame wavelengths the model is evaluated on: the observed
    /// wavelengths directly, or a dense grid spanning the filter supports.
    pub model_wave: Vec<f64>,
    /// κ interpolated onto the rest frame of `model_wave`.
    pub kappa_interp: Vec<f64>,
    pub redshift: f64,
    pub distance_cm: f64,
    pub components: ComponentCount,
    pub priors: PriorConfig,
}

impl Posterior {
    /// Assemble and validate the evaluator. All invalid-input conditions are
    /// checked here, before any sampling begins.
    pub fn build(
        obs: ObsSet,
        opacity: &OpacityTable,
        redshift: f64,
        distance_cm: f64,
        components: ComponentCount,
        priors: PriorConfig,
        n_filter_samples: usize,
    ) -> Result<Self, AppError> {
        obs.validate()?;
        if !(redshift.is_finite() && redshift >= 0.0) {
            return Err(AppError::new(2, format!("Redshift must be finite and >= 0, got {redshift}.")));
        }
        if !(distance_cm.is_finite() && distance_cm > 0.0) {
            return Err(AppError::new(2, format!("Distance must be finite and > 0 cm, got {distance_cm}.")));
        }

        let model_wave = match &obs.filters {
            Some(bands) => {
                if n_filter_samples < 2 {
                    return Err(AppError::new(2, "n_filter_samples must be >= 2."));
                }
                // One dense grid spanning the union of filter supports.
                let lo = bands.iter().map(|b| b.support().0).fold(f64::INFINITY, f64::min);
                let hi = bands.iter().map(|b| b.support().1).fold(f64::NEG_INFINITY, f64::max);
                let step = (hi - lo) / (n_filter_samples as f64 - 1.0);
                (0..n_filter_samples).map(|i| lo + step * i as f64).collect()
            }
            None => obs.wavelength.clone(),
        };

        let rest_wave: Vec<f64> = model_wave.iter().map(|w| w / (1.0 + redshift)).collect();
        let kappa_interp = opacity.interp_to(&rest_wave);

        let posterior = Self {
            obs,
            model_wave,
            kappa_interp,
            redshift,
            distance_cm,
            components,
            priors,
        };

        // Exercise the forward model once so structural errors (degenerate
        // bandpasses, zero transmission) surface now, not mid-sampling.
        let mid = posterior.priors.ranges(components).into_iter().map(|r| 0.5 * (r.lo + r.hi));
        let mut theta: Vec<f64> = mid.collect();
        if components == ComponentCount::Two && theta[3] <= theta[1] {
            theta[3] = theta[1] + 1.0;
        }
        posterior.model_at_observations(&theta)?;

        Ok(posterior)
    }

    /// Model flux (Jy) at each observed point, reduced through the filter
    /// bank when one is present.
    pub fn model_at_observations(&self, theta: &[f64]) -> Result<Vec<f64>, AppError> {
        let spectrum = model_flux(
            theta,
            &self.model_wave,
            &self.kappa_interp,
            self.redshift,
            self.distance_cm,
            self.components,
        )?;
        match &self.obs.filters {
            Some(bands) => synthesize_photometry(&self.model_wave, &spectrum, bands),
            None => Ok(spectrum),
        }
    }

    pub fn log_prior(&self, theta: &[f64]) -> f64 {
        log_prior(theta, &self.priors, self.components)
    }

    /// Censored log-likelihood. Degenerate subsets (no detections, or no
    /// limits) contribute exactly 0 from the empty sum.
    pub fn log_likelihood(&self, theta: &[f64]) -> f64 {
        let model = match self.model_at_observations(theta) {
            Ok(m) => m,
            Err(_) => return f64::NEG_INFINITY,
        };

        let mut ln_like = 0.0;
        for i in 0..self.obs.len() {
            let m = model[i];
            if !m.is_finite() {
                return f64::NEG_INFINITY;
            }
            let obs = self.obs.flux[i];
            let sigma = self.obs.flux_err[i];

            if self.obs.is_limit[i] {
                // Survival probability of the limit under the model.
                let prob = normal_cdf((obs - m) / sigma);
                if prob > 0.0 {
                    ln_like += prob.ln();
                } else {
                    return f64::NEG_INFINITY;
                }
            } else {
                let r = (obs - m) / sigma;
                ln_like -= 0.5 * r * r;
                ln_like -= 0.5 * (2.0 * std::f64::consts::PI * sigma * sigma).ln();
            }
        }
        ln_like
    }

    /// `log_prior + log_likelihood`, skipping the expensive likelihood
    /// entirely when the prior already rules θ out.
    pub fn log_prob(&self, theta: &[f64]) -> f64 {
        let lp = self.log_prior(theta);
        if !lp.is_finite() {
            return f64::NEG_INFINITY;
        }
        lp + self.log_likelihood(theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Band, ParamRange};

    const D_CM: f64 = 3.085_677_581e25;

    fn flat_opacity() -> OpacityTable {
        OpacityTable::new(vec![0.1, 1000.0], vec![100.0, 100.0]).unwrap()
    }

    fn obs_detections(wave: Vec<f64>, flux: Vec<f64>, err: Vec<f64>) -> ObsSet {
        let n = wave.len();
        ObsSet {
            wavelength: wave,
            flux,
            flux_err: err,
            is_limit: vec![false; n],
            filters: None,
        }
    }

    fn posterior_for(obs: ObsSet, components: ComponentCount) -> Posterior {
        Posterior::build(
            obs,
            &flat_opacity(),
            0.01,
            D_CM,
            components,
            PriorConfig::default(),
            1000,
        )
        .unwrap()
    }

    #[test]
    fn prior_is_zero_inside_box_and_neg_inf_outside() {
        let p = PriorConfig::default();

        // One component.
        assert_eq!(log_prior(&[-3.0, 150.0], &p, ComponentCount::One), 0.0);
        assert_eq!(
            log_prior(&[-7.0, 150.0], &p, ComponentCount::One),
            f64::NEG_INFINITY
        );
        assert_eq!(
            log_prior(&[-3.0, 2500.0], &p, ComponentCount::One),
            f64::NEG_INFINITY
        );

        // Two components, valid ordering.
        assert_eq!(
            log_prior(&[-3.0, 150.0, -5.0, 800.0], &p, ComponentCount::Two),
            0.0
        );
        // Ordering violated: hot not hotter than cold.
        assert_eq!(
            log_prior(&[-3.0, 150.0, -5.0, 100.0], &p, ComponentCount::Two),
            f64::NEG_INFINITY
        );
        // Any bound violated.
        assert_eq!(
            log_prior(&[-3.0, 150.0, -9.0, 800.0], &p, ComponentCount::Two),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn prior_respects_custom_bounds() {
        let mut p = PriorConfig::default();
        p.temp_cold = ParamRange::new(100.0, 200.0);
        assert_eq!(log_prior(&[-3.0, 150.0], &p, ComponentCount::One), 0.0);
        assert_eq!(log_prior(&[-3.0, 90.0], &p, ComponentCount::One), f64::NEG_INFINITY);
    }

    #[test]
    fn likelihood_without_limits_is_pure_gaussian() {
        let post = posterior_for(
            obs_detections(vec![10.0, 20.0], vec![0.5, 0.8], vec![0.05, 0.08]),
            ComponentCount::One,
        );
        let theta = [-3.0, 150.0];
        let model = post.model_at_observations(&theta).unwrap();

        let mut expect = 0.0;
        for i in 0..2 {
            let r = (post.obs.flux[i] - model[i]) / post.obs.flux_err[i];
            expect -= 0.5 * r * r;
            expect -= 0.5
                * (2.0 * std::f64::consts::PI * post.obs.flux_err[i] * post.obs.flux_err[i]).ln();
        }
        assert!((post.log_likelihood(&theta) - expect).abs() < 1e-10);
    }

    #[test]
    fn exact_match_contributes_only_normalization() {
        let theta = [-3.0, 150.0];
        // Build once to learn the model value, then feed it back as the data.
        let probe = posterior_for(
            obs_detections(vec![10.0], vec![1.0], vec![0.1]),
            ComponentCount::One,
        );
        let m = probe.model_at_observations(&theta).unwrap()[0];

        let sigma = 0.05;
        let post = posterior_for(
            obs_detections(vec![10.0], vec![m], vec![sigma]),
            ComponentCount::One,
        );
        let expect = -0.5 * (2.0 * std::f64::consts::PI * sigma * sigma).ln();
        assert!((post.log_likelihood(&theta) - expect).abs() < 1e-10);
    }

    #[test]
    fn limits_only_likelihood_is_pure_limit_term() {
        let obs = ObsSet {
            wavelength: vec![30.0],
            flux: vec![0.2],
            flux_err: vec![0.02],
            is_limit: vec![true],
            filters: None,
        };
        let post = posterior_for(obs, ComponentCount::One);
        let theta = [-3.0, 150.0];
        let m = post.model_at_observations(&theta).unwrap()[0];
        let expect = normal_cdf((0.2 - m) / 0.02).ln();
        assert!((post.log_likelihood(&theta) - expect).abs() < 1e-10);
    }

    #[test]
    fn loosening_an_upper_limit_never_decreases_likelihood() {
        // One detection plus one limit at longer wavelength; sweep the limit
        // threshold upward at fixed θ.
        let theta = [-3.0, 150.0];
        let mut prev = f64::NEG_INFINITY;
        for limit_flux in [0.001, 0.01, 0.1, 1.0, 10.0] {
            let obs = ObsSet {
                wavelength: vec![10.0, 50.0],
                flux: vec![0.5, limit_flux],
                flux_err: vec![0.05, 0.05],
                is_limit: vec![false, true],
                filters: None,
            };
            let ll = posterior_for(obs, ComponentCount::One).log_likelihood(&theta);
            assert!(ll >= prev, "limit {limit_flux}: {ll} < {prev}");
            prev = ll;
        }
    }

    #[test]
    fn overshooting_a_limit_is_penalized() {
        let theta = [-3.0, 150.0];
        let probe = posterior_for(
            obs_detections(vec![20.0], vec![1.0], vec![0.1]),
            ComponentCount::One,
        );
        let m = probe.model_at_observations(&theta).unwrap()[0];

        // Limit far above the model: no penalty.
        let easy = ObsSet {
            wavelength: vec![20.0],
            flux: vec![m * 100.0],
            flux_err: vec![m],
            is_limit: vec![true],
            filters: None,
        };
        // Limit far below the model: severe penalty.
        let hard = ObsSet {
            wavelength: vec![20.0],
            flux: vec![m * 0.01],
            flux_err: vec![m * 0.01],
            is_limit: vec![true],
            filters: None,
        };
        let easy_ll = posterior_for(easy, ComponentCount::One).log_likelihood(&theta);
        let hard_ll = posterior_for(hard, ComponentCount::One).log_likelihood(&theta);
        assert!(easy_ll > -1e-6);
        assert!(hard_ll < -10.0 || hard_ll == f64::NEG_INFINITY);
    }

    #[test]
    fn posterior_short_circuits_outside_prior() {
        let post = posterior_for(
            obs_detections(vec![10.0], vec![0.5], vec![0.05]),
            ComponentCount::One,
        );
        assert_eq!(post.log_prob(&[-20.0, 150.0]), f64::NEG_INFINITY);
        assert!(post.log_prob(&[-3.0, 150.0]).is_finite());
    }

    #[test]
    fn filtered_posterior_builds_dense_grid() {
        let band = Band {
            wavelength: vec![9.0, 10.0, 11.0],
            transmission: vec![0.2, 1.0, 0.2],
        };
        let obs = ObsSet {
            wavelength: vec![10.0],
            flux: vec![0.5],
            flux_err: vec![0.05],
            is_limit: vec![false],
            filters: Some(vec![band]),
        };
        let post = posterior_for(obs, ComponentCount::One);
        assert_eq!(post.model_wave.len(), 1000);
        assert!(post.log_prob(&[-3.0, 150.0]).is_finite());
    }
}
