//! Chain post-processing: burn-in removal and percentile summaries.

use crate::domain::{ComponentCount, FitSummary, ParamEstimate};
use crate::error::AppError;
use crate::fit::sampler::Chain;
use crate::math::percentile;

/// Percentiles bracketing the central 68.27% credible interval.
const P_LO: f64 = 15.87;
const P_MED: f64 = 50.0;
const P_HI: f64 = 84.13;

/// Number of leading steps dropped as burn-in.
///
/// With a single run, the first `burn_in` fraction of steps is discarded.
/// With repeated runs the earlier runs already served as burn-in, so only
/// the final run's steps are kept.
pub fn burn_in_steps(total_steps: usize, n_steps: usize, repeats: usize, burn_in: f64) -> usize {
    if repeats > 1 {
        total_steps - n_steps
    } else {
        (total_steps as f64 * burn_in) as usize
    }
}

fn estimate(samples: &[f64]) -> ParamEstimate {
    let med = percentile(samples, P_MED);
    ParamEstimate {
        median: med,
        upper: percentile(samples, P_HI) - med,
        lower: med - percentile(samples, P_LO),
    }
}

/// Reduce a chain to per-parameter estimates and the derived total dust
/// mass (linear solar masses, summed over components before taking
/// percentiles).
pub fn summarize(
    chain: &Chain,
    n_steps: usize,
    repeats: usize,
    burn_in: f64,
    components: ComponentCount,
) -> Result<FitSummary, AppError> {
    let first = burn_in_steps(chain.n_steps(), n_steps, repeats, burn_in);
    if first >= chain.n_steps() {
        return Err(AppError::new(
            3,
            format!(
                "Burn-in of {first} steps leaves no samples from a {}-step chain.",
                chain.n_steps()
            ),
        ));
    }
    let samples = chain.flat_from(first);
    if samples.iter().any(|s| s.iter().any(|v| !v.is_finite())) {
        return Err(AppError::new(4, "Chain contains non-finite samples after burn-in."));
    }

    let n_dim = components.n_dim();
    let estimates: Vec<ParamEstimate> = (0..n_dim)
        .map(|d| {
            let col: Vec<f64> = samples.iter().map(|s| s[d]).collect();
            estimate(&col)
        })
        .collect();

    let total: Vec<f64> = samples
        .iter()
        .map(|s| match components {
            ComponentCount::One => 10f64.powf(s[0]),
            ComponentCount::Two => 10f64.powf(s[0]) + 10f64.powf(s[2]),
        })
        .collect();

    Ok(FitSummary {
        components,
        names: components.param_names().iter().map(|s| s.to_string()).collect(),
        estimates,
        total_dust_mass: estimate(&total),
    })
}
