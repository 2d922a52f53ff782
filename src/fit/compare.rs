//! Information-criterion comparison of the 1- and 2-component fits.

use crate::domain::{ComponentCount, FitSummary, ModelComparison};
use crate::error::AppError;
use crate::fit::posterior::Posterior;

fn aic(k: usize, log_like: f64) -> f64 {
    2.0 * k as f64 - 2.0 * log_like
}

fn bic(k: usize, n: usize, log_like: f64) -> f64 {
    k as f64 * (n as f64).ln() - 2.0 * log_like
}

/// Evaluate both fits at their posterior-median parameters and score them
/// with AIC and BIC. Deltas are 1-component minus 2-component, so positive
/// values favor the 2-component model.
pub fn compare_models(
    one: &Posterior,
    two: &Posterior,
    summary_one: &FitSummary,
    summary_two: &FitSummary,
) -> Result<ModelComparison, AppError> {
    if one.components != ComponentCount::One || two.components != ComponentCount::Two {
        return Err(AppError::new(2, "compare_models expects a 1-component and a 2-component fit."));
    }
    if one.obs.len() != two.obs.len() {
        return Err(AppError::new(2, "Model comparison requires both fits to use the same data."));
    }

    let n = one.obs.len();
    let ll_1 = one.log_likelihood(&summary_one.median_theta());
    let ll_2 = two.log_likelihood(&summary_two.median_theta());
    if !(ll_1.is_finite() && ll_2.is_finite()) {
        return Err(AppError::new(
            4,
            "Median-parameter likelihood is not finite; cannot compare models.",
        ));
    }

    let k1 = ComponentCount::One.n_dim();
    let k2 = ComponentCount::Two.n_dim();
    let aic_1 = aic(k1, ll_1);
    let aic_2 = aic(k2, ll_2);
    let bic_1 = bic(k1, n, ll_1);
    let bic_2 = bic(k2, n, ll_2);

    Ok(ModelComparison {
        n_data: n,
        log_like_1: ll_1,
        log_like_2: ll_2,
        aic_1,
        aic_2,
        delta_aic: aic_1 - aic_2,
        bic_1,
        bic_2,
        delta_bic: bic_1 - bic_2,
    })
}
