//! Sampling orchestration: walker initialization, repeated runs, and the
//! sigma-clipping repair of stray walkers between runs.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{ComponentCount, PriorConfig};
use crate::error::AppError;
use crate::fit::posterior::{log_prior, Posterior};
use crate::fit::sampler::{Chain, EnsembleSampler};
use crate::math::{median, std_dev};

/// Scatter added when a walker is re-seeded on top of a valid one.
const RESEED_SIGMA: f64 = 1e-4;
/// Floor on the per-dimension ensemble spread used for outlier detection.
const STD_FLOOR: f64 = 1e-10;
/// Rejection-sampling attempts per requested walker before giving up.
const INIT_ATTEMPTS_PER_WALKER: usize = 100;

#[derive(Debug, Clone, Copy)]
pub struct McmcSettings {
    pub n_walkers: usize,
    pub n_steps: usize,
    pub repeats: usize,
    pub sigma_clip: f64,
    pub seed: u64,
    pub n_cores: usize,
    pub progress: bool,
}

/// What a between-run repair did to the ensemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct RepairReport {
    pub n_invalid: usize,
    pub n_outliers: usize,
    /// True when every walker was flagged and the repair was skipped.
    pub skipped: bool,
}

/// Draw starting positions uniformly inside `init` (a sub-box of the prior
/// used to start walkers near a plausible solution), keeping only draws the
/// prior accepts. With two components the temperature ordering constraint
/// makes plain box draws invalid roughly half the time, hence the rejection
/// loop.
pub fn initial_positions(
    priors: &PriorConfig,
    init: &PriorConfig,
    components: ComponentCount,
    n_walkers: usize,
    rng: &mut StdRng,
) -> Result<Vec<Vec<f64>>, AppError> {
    let ranges = init.ranges(components);
    let mut positions = Vec::with_capacity(n_walkers);
    let mut attempts = 0usize;
    let max_attempts = INIT_ATTEMPTS_PER_WALKER * n_walkers;

    while positions.len() < n_walkers {
        if attempts >= max_attempts {
            return Err(AppError::new(
                3,
                format!(
                    "Could not draw {n_walkers} valid starting positions in {max_attempts} attempts. \
                     Check that the initial ranges lie inside the prior."
                ),
            ));
        }
        attempts += 1;

        let theta: Vec<f64> = ranges.iter().map(|r| rng.gen_range(r.lo..r.hi)).collect();
        if log_prior(&theta, priors, components).is_finite() {
            positions.push(theta);
        }
    }
    Ok(positions)
}

/// Replace broken walkers in place.
///
/// Two passes: walkers with any non-finite coordinate are re-seeded on a
/// randomly chosen valid walker with small Gaussian scatter, then walkers
/// further than `sigma_clip` ensemble standard deviations from the
/// per-dimension median in any dimension are re-seeded on a random survivor
/// with scatter `std / sigma_clip`. If every walker is an outlier the second
/// pass is skipped rather than collapsing the ensemble.
pub fn repair_ensemble(
    positions: &mut [Vec<f64>],
    rng: &mut StdRng,
    sigma_clip: f64,
) -> Result<RepairReport, AppError> {
    let n_dim = positions[0].len();
    let unit = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, e.to_string()))?;
    let mut report = RepairReport::default();

    let valid: Vec<usize> = (0..positions.len())
        .filter(|&w| positions[w].iter().all(|v| v.is_finite()))
        .collect();
    if valid.is_empty() {
        return Err(AppError::new(4, "All walkers have non-finite positions; cannot continue."));
    }

    let invalid: Vec<usize> = (0..positions.len())
        .filter(|w| !valid.contains(w))
        .collect();
    report.n_invalid = invalid.len();
    for w in invalid {
        let src = valid[rng.gen_range(0..valid.len())];
        positions[w] = (0..n_dim)
            .map(|d| positions[src][d] + RESEED_SIGMA * unit.sample(rng))
            .collect();
    }

    let mut medians = Vec::with_capacity(n_dim);
    let mut stds = Vec::with_capacity(n_dim);
    for d in 0..n_dim {
        let col: Vec<f64> = positions.iter().map(|p| p[d]).collect();
        medians.push(median(&col));
        stds.push(std_dev(&col).max(STD_FLOOR));
    }

    let is_outlier = |p: &Vec<f64>| {
        p.iter()
            .enumerate()
            .any(|(d, &v)| (v - medians[d]).abs() > sigma_clip * stds[d])
    };
    let survivors: Vec<usize> = (0..positions.len())
        .filter(|&w| !is_outlier(&positions[w]))
        .collect();
    let outliers: Vec<usize> = (0..positions.len())
        .filter(|&w| is_outlier(&positions[w]))
        .collect();
    report.n_outliers = outliers.len();

    if survivors.is_empty() {
        eprintln!("Warning: every walker lies outside the sigma-clip range; skipping repair.");
        report.skipped = true;
        return Ok(report);
    }

    for w in outliers {
        let src = survivors[rng.gen_range(0..survivors.len())];
        positions[w] = (0..n_dim)
            .map(|d| positions[src][d] + (stds[d] / sigma_clip) * unit.sample(rng))
            .collect();
    }
    Ok(report)
}

/// Runs the sampler `repeats` times, repairing the ensemble between runs,
/// and accumulates the full chain across all runs.
pub struct ConvergenceController<'a> {
    posterior: &'a Posterior,
    settings: McmcSettings,
    initial: PriorConfig,
}

impl<'a> ConvergenceController<'a> {
    pub fn new(posterior: &'a Posterior, settings: McmcSettings, initial: PriorConfig) -> Self {
        Self {
            posterior,
            settings,
            initial,
        }
    }

    pub fn run(&self) -> Result<Chain, AppError> {
        if self.settings.n_cores > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.settings.n_cores)
                .build()
                .map_err(|e| AppError::new(4, format!("Failed to build worker pool: {e}")))?;
            pool.install(|| self.run_inner())
        } else {
            self.run_inner()
        }
    }

    fn run_inner(&self) -> Result<Chain, AppError> {
        let s = &self.settings;
        let n_dim = self.posterior.components.n_dim();
        let mut rng = StdRng::seed_from_u64(s.seed);

        let mut positions = initial_positions(
            &self.posterior.priors,
            &self.initial,
            self.posterior.components,
            s.n_walkers,
            &mut rng,
        )?;

        let log_prob = |theta: &[f64]| self.posterior.log_prob(theta);
        let sampler = EnsembleSampler::new(&log_prob, s.n_walkers, n_dim, s.n_cores > 1)?;
        let mut chain = Chain::new(s.n_walkers, n_dim);

        for run in 1..=s.repeats {
            if s.progress {
                println!("Starting MCMC run {run} of {}...", s.repeats);
            }
            sampler.run(&mut positions, s.n_steps, &mut chain, &mut rng);

            if run < s.repeats {
                let report = repair_ensemble(&mut positions, &mut rng, s.sigma_clip)?;
                if s.progress {
                    if report.n_invalid > 0 {
                        println!(
                            "Found {} walkers with invalid positions. Replacing them...",
                            report.n_invalid
                        );
                    }
                    if report.n_outliers > 0 {
                        println!(
                            "Found {} walkers outside {}-sigma range.",
                            report.n_outliers, s.sigma_clip
                        );
                    } else {
                        println!("All walkers are within the specified sigma range.");
                    }
                }
            }
        }
        Ok(chain)
    }
}
