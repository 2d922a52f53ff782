//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the inference code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{DatasetStats, FitConfig, FitSummary, ModelComparison};

/// Format the header + per-parameter credible intervals for one fit.
pub fn format_fit_summary(
    object_name: &str,
    summary: &FitSummary,
    stats: &DatasetStats,
    config: &FitConfig,
) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== dustfit - {} fit: {object_name} ===\n",
        summary.components.display_name()
    ));
    out.push_str(&format!(
        "Dust: {} (a = {} um) | z = {}\n",
        config.composition.display_name(),
        config.grain_size_um,
        config.redshift
    ));
    out.push_str(&format!(
        "Data: n={} ({} detections, {} limits) | wavelength=[{:.2}, {:.2}] um\n",
        stats.n_points, stats.n_detections, stats.n_limits, stats.wave_min, stats.wave_max
    ));
    out.push_str(&format!(
        "MCMC: {} walkers x {} steps x {} runs | seed = {}\n",
        config.n_walkers, config.n_steps, config.repeats, config.seed
    ));

    out.push_str("\nPosterior medians (+1σ / −1σ):\n");
    for (name, est) in summary.names.iter().zip(summary.estimates.iter()) {
        out.push_str(&format!(
            "  {name:<22} {:>12.4} +{:.4} −{:.4}\n",
            est.median, est.upper, est.lower
        ));
    }
    out.push_str(&format!(
        "  {:<22} {:>12.4e} +{:.4e} −{:.4e} Msun\n",
        "total_dust_mass",
        summary.total_dust_mass.median,
        summary.total_dust_mass.upper,
        summary.total_dust_mass.lower
    ));
    out.push('\n');

    out
}

/// Format the 1- vs 2-component comparison verdict.
pub fn format_comparison(cmp: &ModelComparison) -> String {
    let mut out = String::new();

    out.push_str("Model comparison (1-component vs 2-component):\n");
    out.push_str(&format!("  n_data = {}\n", cmp.n_data));
    out.push_str(&format!(
        "  log-likelihood: 1-comp = {:.3} | 2-comp = {:.3}\n",
        cmp.log_like_1, cmp.log_like_2
    ));
    out.push_str(&format!(
        "  AIC: 1-comp = {:.3} | 2-comp = {:.3} | delta = {:.3}\n",
        cmp.aic_1, cmp.aic_2, cmp.delta_aic
    ));
    out.push_str(&format!(
        "  BIC: 1-comp = {:.3} | 2-comp = {:.3} | delta = {:.3}\n",
        cmp.bic_1, cmp.bic_2, cmp.delta_bic
    ));

    let verdict = if cmp.delta_bic > 10.0 {
        "Strong evidence for the 2-component model."
    } else if cmp.delta_bic > 2.0 {
        "Positive evidence for the 2-component model."
    } else if cmp.delta_bic < -2.0 {
        "The 1-component model is preferred."
    } else {
        "The comparison is inconclusive; prefer the simpler 1-component model."
    };
    out.push_str(&format!("  {verdict}\n"));

    out
}
